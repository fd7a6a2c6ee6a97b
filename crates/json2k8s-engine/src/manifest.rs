//! Generated documents and their output paths

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use json2k8s_core::{Shared, Sidecar};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Secret, Service};
use k8s_openapi::api::networking::v1::Ingress;
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use serde_yaml::{Mapping, Value as YamlValue};

use crate::error::Result;

/// One generated Kubernetes object
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Manifest {
    Secret(Secret),
    PersistentVolumeClaim(PersistentVolumeClaim),
    Deployment(DeploymentManifest),
    HorizontalPodAutoscaler(HorizontalPodAutoscaler),
    Service(Service),
    Ingress(Ingress),
    CronJob(CronJob),
}

/// Container fields taken verbatim from the descriptor
///
/// They are merged into the serialized container: `fields` replace keys of
/// the same name, `volume_mounts` are appended after the generated mounts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerOverlay {
    pub fields: serde_json::Map<String, JsonValue>,
    pub volume_mounts: Vec<JsonValue>,
}

impl ContainerOverlay {
    /// Probes of the primary container
    pub fn primary(shared: &Shared) -> Self {
        let probes = [
            ("livenessProbe", &shared.liveness_probe),
            ("readinessProbe", &shared.readiness_probe),
            ("startupProbe", &shared.startup_probe),
        ];
        Self {
            fields: probes
                .into_iter()
                .filter_map(|(key, probe)| Some((key.to_string(), probe.clone()?)))
                .collect(),
            volume_mounts: Vec::new(),
        }
    }

    /// Security context and extra mounts of a sidecar
    pub fn sidecar(sidecar: &Sidecar) -> Self {
        let mut fields = serde_json::Map::new();
        if let Some(context) = &sidecar.security_context {
            fields.insert("securityContext".to_string(), context.clone());
        }
        Self {
            fields,
            volume_mounts: sidecar.volume_mounts.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.volume_mounts.is_empty()
    }

    fn apply(&self, container: &mut Mapping) -> serde_yaml::Result<()> {
        for (key, value) in &self.fields {
            container.insert(YamlValue::from(key.as_str()), serde_yaml::to_value(value)?);
        }
        if self.volume_mounts.is_empty() {
            return Ok(());
        }

        let mounts = self
            .volume_mounts
            .iter()
            .map(serde_yaml::to_value)
            .collect::<serde_yaml::Result<Vec<_>>>()?;
        match container
            .get_mut("volumeMounts")
            .and_then(YamlValue::as_sequence_mut)
        {
            Some(existing) => existing.extend(mounts),
            None => {
                container.insert(YamlValue::from("volumeMounts"), YamlValue::Sequence(mounts));
            }
        }
        Ok(())
    }
}

/// A deployment plus the verbatim fields of its containers, keyed by
/// container name
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentManifest {
    pub deployment: Deployment,
    pub overlays: BTreeMap<String, ContainerOverlay>,
}

impl DeploymentManifest {
    pub fn new(deployment: Deployment) -> Self {
        Self {
            deployment,
            overlays: BTreeMap::new(),
        }
    }

    pub fn with_overlay(mut self, container: impl Into<String>, overlay: ContainerOverlay) -> Self {
        if !overlay.is_empty() {
            self.overlays.insert(container.into(), overlay);
        }
        self
    }
}

impl Deref for DeploymentManifest {
    type Target = Deployment;

    fn deref(&self) -> &Deployment {
        &self.deployment
    }
}

impl Serialize for DeploymentManifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.overlays.is_empty() {
            return self.deployment.serialize(serializer);
        }

        let mut value = serde_yaml::to_value(&self.deployment).map_err(S::Error::custom)?;
        let containers = value
            .get_mut("spec")
            .and_then(|v| v.get_mut("template"))
            .and_then(|v| v.get_mut("spec"))
            .and_then(|v| v.get_mut("containers"))
            .and_then(YamlValue::as_sequence_mut);
        for container in containers.into_iter().flatten() {
            let Some(container) = container.as_mapping_mut() else {
                continue;
            };
            let overlay = container
                .get("name")
                .and_then(YamlValue::as_str)
                .and_then(|name| self.overlays.get(name));
            if let Some(overlay) = overlay {
                overlay.apply(container).map_err(S::Error::custom)?;
            }
        }
        value.serialize(serializer)
    }
}

impl Manifest {
    /// Kubernetes kind of the object
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Secret(_) => "Secret",
            Self::PersistentVolumeClaim(_) => "PersistentVolumeClaim",
            Self::Deployment(_) => "Deployment",
            Self::HorizontalPodAutoscaler(_) => "HorizontalPodAutoscaler",
            Self::Service(_) => "Service",
            Self::Ingress(_) => "Ingress",
            Self::CronJob(_) => "CronJob",
        }
    }

    /// `metadata.name` of the object
    pub fn name(&self) -> &str {
        let name = match self {
            Self::Secret(o) => &o.metadata.name,
            Self::PersistentVolumeClaim(o) => &o.metadata.name,
            Self::Deployment(o) => &o.metadata.name,
            Self::HorizontalPodAutoscaler(o) => &o.metadata.name,
            Self::Service(o) => &o.metadata.name,
            Self::Ingress(o) => &o.metadata.name,
            Self::CronJob(o) => &o.metadata.name,
        };
        name.as_deref().unwrap_or_default()
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind(), self.name())
    }
}

/// A manifest and the path it is written to, relative to the build root
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedManifest {
    /// `<app>/<env>/<file>`
    pub path: PathBuf,
    pub manifest: Manifest,
}

/// Every document produced by one build, in generation order
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    pub manifests: Vec<RenderedManifest>,
}

impl BuildOutput {
    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderedManifest> {
        self.manifests.iter()
    }

    /// Manifest written to `path` (relative to the build root)
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&Manifest> {
        let path = path.as_ref();
        self.manifests
            .iter()
            .find(|m| m.path == path)
            .map(|m| &m.manifest)
    }

    /// Relative output paths in generation order
    pub fn paths(&self) -> Vec<&Path> {
        self.manifests.iter().map(|m| m.path.as_path()).collect()
    }

    pub(crate) fn push(&mut self, path: PathBuf, manifest: Manifest) {
        self.manifests.push(RenderedManifest { path, manifest });
    }
}
