//! Per-environment generation pipelines
//!
//! A pipeline turns one environment of one descriptor into its manifests.
//! Checks that can reject the environment run before any document is built.

use std::collections::BTreeMap;
use std::path::PathBuf;

use json2k8s_core::{CronJobEnv, DeploymentEnv, ImageSource, defaults, naming};
use tracing::{debug, info};

use crate::builders::{
    ContainerInput, IngressVariant, PodPlacement, build_container, build_cronjob,
    build_deployment, build_hpa, build_ingress, build_pod_template, build_pvc, build_secret,
    build_service, build_sidecar, deployment_volumes,
};
use crate::context::BuildContext;
use crate::error::{EngineError, Result};
use crate::manifest::{BuildOutput, ContainerOverlay, DeploymentManifest, Manifest};

/// Collects manifests under `<app>/<env>/`
struct EnvOutput<'o> {
    dir: PathBuf,
    output: &'o mut BuildOutput,
}

impl<'o> EnvOutput<'o> {
    fn new(ctx: &BuildContext<'_>, output: &'o mut BuildOutput) -> Self {
        Self {
            dir: PathBuf::from(ctx.app_name).join(ctx.env.as_str()),
            output,
        }
    }

    fn emit(&mut self, file_name: String, manifest: Manifest) {
        let path = self.dir.join(file_name);
        debug!(path = %path.display(), manifest = %manifest, "generated");
        self.output.push(path, manifest);
    }
}

fn resolve_image(ctx: &BuildContext<'_>, image: &ImageSource) -> Result<String> {
    image
        .resolve(ctx.registry, ctx.app_name)
        .ok_or_else(|| EngineError::MissingImage {
            app: ctx.app_name.to_string(),
            env: ctx.env,
        })
}

/// Secret, claims, deployment and autoscaler per replica group, then the
/// service and ingresses of the environment
pub fn deployment_pipeline(
    ctx: &BuildContext<'_>,
    config: &DeploymentEnv,
    output: &mut BuildOutput,
) -> Result<()> {
    let shared = &config.shared;
    let image = resolve_image(ctx, &shared.image)?;
    if let Some(group) = config.duplicate_group_name() {
        return Err(EngineError::DuplicateReplicaGroup {
            app: ctx.app_name.to_string(),
            env: ctx.env,
            group: group.to_string(),
        });
    }

    info!(
        app = ctx.app_name,
        env = %ctx.env,
        groups = config.replica_groups.len(),
        "building deployment"
    );

    let sidecar = shared.sidecar.enabled.then_some(&shared.sidecar);
    let mut out = EnvOutput::new(ctx, output);

    for group in &config.replica_groups {
        let secret_refs = group
            .secrets
            .iter()
            .chain(sidecar.into_iter().flat_map(|s| s.secrets.iter()));
        let secret = build_secret(ctx, &group.name, Some(&group.name), secret_refs)?;
        out.emit(format!("{}.secret.yaml", group.name), Manifest::Secret(secret));

        for volume in &group.persistent_volumes {
            out.emit(
                format!("{}.pvc.yaml", naming::pvc_name(&group.name, &volume.name)),
                Manifest::PersistentVolumeClaim(build_pvc(ctx, &group.name, volume)),
            );
        }

        let mut containers = vec![build_container(ContainerInput {
            env: &group.env,
            secrets: &group.secrets,
            command: shared.command.as_deref(),
            args: shared.args.as_deref(),
            ports: &shared.ports,
            persistent_volumes: &group.persistent_volumes,
            ..ContainerInput::new(&group.name, &image, &group.resources)
        })];
        let mut overlays =
            BTreeMap::from([(group.name.clone(), ContainerOverlay::primary(shared))]);
        if let Some(sidecar) = sidecar {
            let container = build_sidecar(&group.name, sidecar);
            overlays.insert(container.name.clone(), ContainerOverlay::sidecar(sidecar));
            containers.push(container);
        }

        let labels = ctx.app_labels([
            (defaults::LABEL_REPLICA_GROUP, group.name.as_str()),
            (defaults::LABEL_TEAM, ctx.team),
        ]);
        let template = build_pod_template(
            ctx,
            labels,
            PodPlacement {
                workflow: shared.workflow,
                restart_policy: defaults::DEPLOYMENT_RESTART_POLICY,
            },
            containers,
            deployment_volumes(
                &group.name,
                &group.secrets,
                sidecar,
                &group.persistent_volumes,
            ),
        );
        let deployment = overlays.into_iter().fold(
            DeploymentManifest::new(build_deployment(ctx, group, template)),
            |manifest, (container, overlay)| manifest.with_overlay(container, overlay),
        );
        out.emit(
            format!("{}.deployment.yaml", group.name),
            Manifest::Deployment(deployment),
        );

        if let Some(autoscaling) = group.autoscaling.as_ref().filter(|a| a.enabled) {
            out.emit(
                format!("{}.hpa.yaml", group.name),
                Manifest::HorizontalPodAutoscaler(build_hpa(ctx, &group.name, autoscaling)),
            );
        }
    }

    if let Some(first) = config.replica_groups.first() {
        out.emit(
            "service.yaml".to_string(),
            Manifest::Service(build_service(ctx, &first.name, &shared.ports)),
        );
    }

    let ingress = shared.ingress.filter(|i| i.enabled);
    if let (Some(ingress), Some(&port)) = (ingress, shared.ports.first()) {
        out.emit(
            "path.ingress.yaml".to_string(),
            Manifest::Ingress(build_ingress(
                ctx,
                IngressVariant::Path,
                ingress.sub_domain_created,
                port,
            )),
        );
        if ingress.sub_domain_created {
            out.emit(
                "cname.ingress.yaml".to_string(),
                Manifest::Ingress(build_ingress(ctx, IngressVariant::Subdomain, true, port)),
            );
        }
    }

    Ok(())
}

/// Secret and CronJob of a cronjob-type app
pub fn cronjob_pipeline(
    ctx: &BuildContext<'_>,
    config: &CronJobEnv,
    output: &mut BuildOutput,
) -> Result<()> {
    let cronjob = &config.cronjob;
    let image = resolve_image(ctx, &cronjob.image)?;

    info!(app = ctx.app_name, env = %ctx.env, schedule = %cronjob.schedule, "building cronjob");

    let mut out = EnvOutput::new(ctx, output);
    let secret = build_secret(ctx, ctx.app_name, None, &cronjob.secrets)?;
    out.emit(format!("{}.secret.yaml", ctx.app_name), Manifest::Secret(secret));
    out.emit(
        format!("{}.cronjob.yaml", ctx.app_name),
        Manifest::CronJob(build_cronjob(ctx, cronjob, &image)),
    );

    Ok(())
}
