//! Primary and sidecar containers

use std::collections::BTreeMap;

use json2k8s_core::{EnvEntry, PersistentVolume, Resources, SecretRef, Sidecar, defaults, naming};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, EnvVarSource, ResourceRequirements,
    SecretKeySelector, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

/// Inputs of the primary container of a replica group or cronjob
#[derive(Debug, Clone, Copy)]
pub struct ContainerInput<'a> {
    /// Container name; also the owner of the `<name>-secrets` object
    pub name: &'a str,
    pub image: &'a str,
    pub resources: &'a Resources,
    pub env: &'a [EnvEntry],
    pub secrets: &'a [SecretRef],
    pub command: Option<&'a [String]>,
    pub args: Option<&'a [String]>,
    pub ports: &'a [i32],
    pub persistent_volumes: &'a [PersistentVolume],
}

impl<'a> ContainerInput<'a> {
    /// Input with only the required fields set
    pub fn new(name: &'a str, image: &'a str, resources: &'a Resources) -> Self {
        Self {
            name,
            image,
            resources,
            env: &[],
            secrets: &[],
            command: None,
            args: None,
            ports: &[],
            persistent_volumes: &[],
        }
    }
}

fn quantities(cpu: &str, memory: &str) -> BTreeMap<String, Quantity> {
    BTreeMap::from([
        ("cpu".to_string(), Quantity(cpu.to_string())),
        ("memory".to_string(), Quantity(memory.to_string())),
    ])
}

pub fn resource_requirements(resources: &Resources) -> ResourceRequirements {
    ResourceRequirements {
        requests: Some(quantities(
            &resources.requests.cpu,
            &resources.requests.memory,
        )),
        limits: Some(quantities(&resources.limits.cpu, &resources.limits.memory)),
        ..Default::default()
    }
}

fn default_sidecar_resources() -> ResourceRequirements {
    let (request_cpu, request_memory) = defaults::SIDECAR_REQUESTS;
    let (limit_cpu, limit_memory) = defaults::SIDECAR_LIMITS;
    ResourceRequirements {
        requests: Some(quantities(request_cpu, request_memory)),
        limits: Some(quantities(limit_cpu, limit_memory)),
        ..Default::default()
    }
}

/// Env list: secret-backed variables first, then literals
fn env_vars(secret_owner: &str, secrets: &[SecretRef], literals: &[EnvEntry]) -> Vec<EnvVar> {
    let secret_name = naming::secret_manifest_name(secret_owner);

    let from_secrets = secrets.iter().filter_map(|secret| secret.env_key()).map(|key| EnvVar {
        name: key.to_string(),
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: secret_name.clone(),
                key: key.to_string(),
                optional: None,
            }),
            ..Default::default()
        }),
        ..Default::default()
    });

    let from_literals = literals.iter().map(|entry| EnvVar {
        name: entry.name.clone(),
        value: Some(entry.value.clone()),
        ..Default::default()
    });

    from_secrets.chain(from_literals).collect()
}

/// Read-only single-file mounts for file-delivered secrets
fn file_secret_mounts(
    secrets: &[SecretRef],
    volume_name: fn(&str) -> String,
) -> impl Iterator<Item = VolumeMount> + '_ {
    secrets
        .iter()
        .filter_map(|secret| secret.file_target())
        .map(move |(dir, file_name)| VolumeMount {
            name: volume_name(file_name),
            mount_path: naming::secret_mount_path(dir, file_name),
            sub_path: Some(file_name.to_string()),
            read_only: Some(true),
            ..Default::default()
        })
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() { None } else { Some(items) }
}

/// Build the primary container
///
/// Probes are not typed here; they travel verbatim in a
/// [`ContainerOverlay`](crate::manifest::ContainerOverlay).
pub fn build_container(input: ContainerInput<'_>) -> Container {
    let mut mounts: Vec<VolumeMount> =
        file_secret_mounts(input.secrets, naming::file_secret_volume).collect();
    mounts.extend(input.persistent_volumes.iter().map(|volume| VolumeMount {
        name: volume.name.clone(),
        mount_path: volume.mount_path.clone(),
        sub_path: volume.sub_path.clone(),
        ..Default::default()
    }));

    let ports = input
        .ports
        .iter()
        .map(|port| ContainerPort {
            container_port: *port,
            ..Default::default()
        })
        .collect();

    Container {
        name: input.name.to_string(),
        image: Some(input.image.to_string()),
        image_pull_policy: Some(defaults::IMAGE_PULL_POLICY.to_string()),
        resources: Some(resource_requirements(input.resources)),
        env: Some(env_vars(input.name, input.secrets, input.env)),
        ports: non_empty(ports),
        command: input.command.map(<[String]>::to_vec),
        args: input.args.map(<[String]>::to_vec),
        volume_mounts: non_empty(mounts),
        ..Default::default()
    }
}

/// Build the sidecar container of the pod whose primary container is
/// `container_name`
///
/// Sidecar secrets live in the primary container's secret object. The
/// security context and extra mounts are added at serialization time from
/// the sidecar's [`ContainerOverlay`](crate::manifest::ContainerOverlay).
pub fn build_sidecar(container_name: &str, sidecar: &Sidecar) -> Container {
    let name = sidecar
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| naming::sidecar_name(container_name));

    let mounts: Vec<VolumeMount> =
        file_secret_mounts(&sidecar.secrets, naming::sidecar_file_secret_volume).collect();

    Container {
        name,
        image: Some(sidecar.image.clone()),
        image_pull_policy: Some(defaults::IMAGE_PULL_POLICY.to_string()),
        env: Some(env_vars(container_name, &sidecar.secrets, &sidecar.env)),
        resources: Some(
            sidecar
                .resources
                .as_ref()
                .map(resource_requirements)
                .unwrap_or_else(default_sidecar_resources),
        ),
        volume_mounts: non_empty(mounts),
        ..Default::default()
    }
}
