//! CronJobs

use json2k8s_core::{CronJobConfig, defaults};
use k8s_openapi::api::batch::v1::{CronJob, CronJobSpec, JobSpec, JobTemplateSpec};

use crate::builders::container::{ContainerInput, build_container};
use crate::builders::pod::{PodPlacement, build_pod_template, volumes_from_mounts};
use crate::context::BuildContext;

/// CronJob named after the app, running a single container of the same name
///
/// Pod volumes are derived from the container's file-secret mounts.
pub fn build_cronjob(ctx: &BuildContext<'_>, config: &CronJobConfig, image: &str) -> CronJob {
    let container = build_container(ContainerInput {
        env: &config.env,
        secrets: &config.secrets,
        command: config.command.as_deref(),
        args: config.args.as_deref(),
        ..ContainerInput::new(ctx.app_name, image, &config.resources)
    });
    let volumes = container
        .volume_mounts
        .as_deref()
        .map(|mounts| volumes_from_mounts(&container.name, mounts))
        .unwrap_or_default();

    let labels = ctx.app_labels([(defaults::LABEL_TEAM, ctx.team)]);
    let template = build_pod_template(
        ctx,
        labels.clone(),
        PodPlacement {
            workflow: config.workflow,
            restart_policy: defaults::CRONJOB_RESTART_POLICY,
        },
        vec![container],
        volumes,
    );

    CronJob {
        metadata: ctx.labeled_meta(ctx.app_name, labels),
        spec: Some(CronJobSpec {
            schedule: config.schedule.clone(),
            concurrency_policy: Some(config.concurrency_policy.as_str().to_string()),
            successful_jobs_history_limit: Some(
                config
                    .successful_jobs_history_limit
                    .unwrap_or(defaults::SUCCESSFUL_JOBS_HISTORY_LIMIT),
            ),
            failed_jobs_history_limit: Some(
                config
                    .failed_jobs_history_limit
                    .unwrap_or(defaults::FAILED_JOBS_HISTORY_LIMIT),
            ),
            starting_deadline_seconds: config.starting_deadline_seconds,
            suspend: Some(config.suspend.unwrap_or(defaults::SUSPEND)),
            job_template: JobTemplateSpec {
                metadata: None,
                spec: Some(JobSpec {
                    backoff_limit: Some(config.backoff_limit.unwrap_or(defaults::BACKOFF_LIMIT)),
                    ttl_seconds_after_finished: Some(
                        config
                            .ttl_seconds_after_finished
                            .unwrap_or(defaults::TTL_SECONDS_AFTER_FINISHED),
                    ),
                    template,
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::secret::secret_data_key;
    use crate::context::test_support;
    use json2k8s_core::{Environment, SecretMap, naming};

    fn config(extra: serde_json::Value) -> CronJobConfig {
        let mut value = serde_json::json!({
            "workflow": "points",
            "schedule": "0 3 * * *",
            "concurrencyPolicy": "Forbid",
            "imageTag": "v2",
            "resources": {
                "requests": { "cpu": "100m", "memory": "128Mi" },
                "limits": { "cpu": "200m", "memory": "256Mi" }
            }
        });
        if let (Some(base), Some(extra)) = (value.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_cronjob_defaults() {
        let secrets = SecretMap::new();
        let ctx = test_support::context(&secrets, Environment::Stage);

        let cronjob = build_cronjob(&ctx, &config(serde_json::json!({})), "img:v2");
        assert_eq!(cronjob.metadata.name.as_deref(), Some("web"));
        let labels = cronjob.metadata.labels.unwrap();
        assert_eq!(labels["team"], "platform");

        let spec = cronjob.spec.unwrap();
        assert_eq!(spec.schedule, "0 3 * * *");
        assert_eq!(spec.concurrency_policy.as_deref(), Some("Forbid"));
        assert_eq!(spec.successful_jobs_history_limit, Some(3));
        assert_eq!(spec.failed_jobs_history_limit, Some(1));
        assert_eq!(spec.starting_deadline_seconds, None);
        assert_eq!(spec.suspend, Some(false));

        let job = spec.job_template.spec.unwrap();
        assert_eq!(job.backoff_limit, Some(1));
        assert_eq!(job.ttl_seconds_after_finished, Some(172_800));

        let pod = job.template.spec.unwrap();
        assert_eq!(pod.restart_policy.as_deref(), Some("OnFailure"));
        assert_eq!(pod.node_selector.unwrap()["node-pool"], "points");
        assert_eq!(pod.containers[0].name, "web");
        assert_eq!(pod.containers[0].image.as_deref(), Some("img:v2"));
        assert!(pod.volumes.is_none());
    }

    #[test]
    fn test_cronjob_overrides() {
        let secrets = SecretMap::new();
        let ctx = test_support::context(&secrets, Environment::Prod);

        let cronjob = build_cronjob(
            &ctx,
            &config(serde_json::json!({
                "successfulJobsHistoryLimit": 5,
                "startingDeadlineSeconds": 120,
                "backoffLimit": 4,
                "suspend": true
            })),
            "img:v2",
        );

        let spec = cronjob.spec.unwrap();
        assert_eq!(spec.successful_jobs_history_limit, Some(5));
        assert_eq!(spec.starting_deadline_seconds, Some(120));
        assert_eq!(spec.suspend, Some(true));
        assert_eq!(spec.job_template.spec.unwrap().backoff_limit, Some(4));
    }

    #[test]
    fn test_cronjob_file_secret_volumes() {
        let secrets = SecretMap::new();
        let ctx = test_support::context(&secrets, Environment::Stage);

        let cronjob = build_cronjob(
            &ctx,
            &config(serde_json::json!({
                "secrets": [
                    { "source": "db", "envVar": "DB_URL" },
                    { "source": "sa", "filePath": "/var/run/sa", "name": "key.json" }
                ]
            })),
            "img:v2",
        );

        let pod = cronjob.spec.unwrap().job_template.spec.unwrap().template.spec.unwrap();
        let volumes = pod.volumes.unwrap();
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].name, naming::file_secret_volume("key.json"));

        let source = volumes[0].secret.as_ref().unwrap();
        assert_eq!(source.secret_name.as_deref(), Some("web-secrets"));
        assert_eq!(
            source.items.as_ref().unwrap()[0].key,
            naming::file_secret_key("key.json")
        );

        let mounts = pod.containers[0].volume_mounts.as_ref().unwrap();
        assert_eq!(mounts[0].mount_path, "/var/run/sa/key.json");
    }

    #[test]
    fn test_cronjob_sidecar_suffixed_file_secret_key() {
        let secrets = SecretMap::new();
        let ctx = test_support::context(&secrets, Environment::Stage);
        let config = config(serde_json::json!({
            "secrets": [{ "source": "sa", "filePath": "/etc", "name": "envoy-sidecar.yaml" }]
        }));

        let cronjob = build_cronjob(&ctx, &config, "img:v2");

        let pod = cronjob.spec.unwrap().job_template.spec.unwrap().template.spec.unwrap();
        let volumes = pod.volumes.unwrap();
        let item = &volumes[0].secret.as_ref().unwrap().items.as_ref().unwrap()[0];
        assert_eq!(item.key, "envoy-sidecar-file-secrets");
        assert_eq!(item.key, secret_data_key(&config.secrets[0]));
        assert_eq!(item.path, "envoy-sidecar.yaml");
    }
}
