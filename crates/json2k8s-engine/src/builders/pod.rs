//! Pod templates and the volumes behind their mounts

use std::collections::BTreeMap;

use json2k8s_core::{PersistentVolume, SecretRef, Sidecar, Workflow, defaults, naming};
use k8s_openapi::api::core::v1::{
    Container, KeyToPath, PersistentVolumeClaimVolumeSource, PodSpec, PodTemplateSpec,
    SecretVolumeSource, Toleration, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::context::BuildContext;

/// Scheduling and restart settings of a pod
#[derive(Debug, Clone, Copy)]
pub struct PodPlacement {
    pub workflow: Workflow,
    pub restart_policy: &'static str,
}

fn pod_annotations(rollout_trigger: &str) -> BTreeMap<String, String> {
    let mut annotations = BTreeMap::from([(
        defaults::ROLLOUT_TRIGGER_ANNOTATION.to_string(),
        rollout_trigger.to_string(),
    )]);
    for (key, value) in defaults::METRICS_ANNOTATIONS {
        annotations.insert(key.to_string(), value.to_string());
    }
    annotations
}

/// Wrap containers into a pod template labelled with `labels`
pub fn build_pod_template(
    ctx: &BuildContext<'_>,
    labels: BTreeMap<String, String>,
    placement: PodPlacement,
    containers: Vec<Container>,
    volumes: Vec<Volume>,
) -> PodTemplateSpec {
    let workflow = placement.workflow.as_str();

    PodTemplateSpec {
        metadata: Some(ObjectMeta {
            labels: Some(labels),
            annotations: Some(pod_annotations(ctx.rollout_trigger)),
            ..Default::default()
        }),
        spec: Some(PodSpec {
            containers,
            tolerations: Some(vec![Toleration {
                key: Some(defaults::TOLERATION_KEY.to_string()),
                operator: Some(defaults::TOLERATION_OPERATOR.to_string()),
                value: Some(workflow.to_string()),
                effect: Some(defaults::TOLERATION_EFFECT.to_string()),
                ..Default::default()
            }]),
            node_selector: Some(BTreeMap::from([(
                defaults::NODE_POOL_SELECTOR.to_string(),
                workflow.to_string(),
            )])),
            restart_policy: Some(placement.restart_policy.to_string()),
            volumes: if volumes.is_empty() { None } else { Some(volumes) },
            ..Default::default()
        }),
    }
}

/// A volume projecting `key` of `<container>-secrets` as `file_name`
pub fn secret_file_volume(
    container: &str,
    volume_name: String,
    key: String,
    file_name: &str,
) -> Volume {
    Volume {
        name: volume_name,
        secret: Some(SecretVolumeSource {
            secret_name: Some(naming::secret_manifest_name(container)),
            items: Some(vec![KeyToPath {
                key,
                path: file_name.to_string(),
                mode: None,
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Volumes of a replica group pod: primary file secrets, sidecar file
/// secrets (when the sidecar is enabled), then persistent volume claims
pub fn deployment_volumes(
    container: &str,
    secrets: &[SecretRef],
    sidecar: Option<&Sidecar>,
    persistent_volumes: &[PersistentVolume],
) -> Vec<Volume> {
    let primary = secrets
        .iter()
        .filter_map(SecretRef::file_target)
        .map(|(_, file_name)| {
            secret_file_volume(
                container,
                naming::file_secret_volume(file_name),
                naming::file_secret_key(file_name),
                file_name,
            )
        });

    let sidecar_secrets = sidecar
        .filter(|s| s.enabled)
        .map(|s| s.secrets.as_slice())
        .unwrap_or_default();
    let from_sidecar = sidecar_secrets
        .iter()
        .filter_map(SecretRef::file_target)
        .map(|(_, file_name)| {
            secret_file_volume(
                container,
                naming::sidecar_file_secret_volume(file_name),
                naming::file_secret_key(file_name),
                file_name,
            )
        });

    let claims = persistent_volumes.iter().map(|volume| Volume {
        name: volume.name.clone(),
        persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
            claim_name: naming::pvc_name(container, &volume.name),
            read_only: None,
        }),
        ..Default::default()
    });

    primary.chain(from_sidecar).chain(claims).collect()
}

/// Re-derive secret volumes from a container's own mounts
///
/// Mounts that do not carry a file secret are skipped. Both the projected key
/// and the file name derive from the mount's `subPath`, the same file name
/// the Secret data key was built from.
pub fn volumes_from_mounts(container: &str, mounts: &[VolumeMount]) -> Vec<Volume> {
    mounts
        .iter()
        .filter(|mount| naming::is_file_secret_volume(&mount.name))
        .filter_map(|mount| {
            let file_name = mount.sub_path.as_deref()?;
            Some(secret_file_volume(
                container,
                mount.name.clone(),
                naming::file_secret_key(file_name),
                file_name,
            ))
        })
        .collect()
}
