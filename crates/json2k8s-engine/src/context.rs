//! Build settings and the per-pipeline naming context

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use json2k8s_core::{Environment, SecretMap, defaults};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Settings for one build
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Registry prefix for images synthesized from `imageTag`
    pub registry: String,
    /// Base domain for ingress hosts
    pub ingress_domain: String,
    /// Directory handed to the secret source; no secrets are resolved when unset
    pub secrets_dir: Option<PathBuf>,
    /// Fixed rollout-trigger value; the build start time when unset
    pub rollout_trigger: Option<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            registry: defaults::IMAGE_REGISTRY.to_string(),
            ingress_domain: defaults::INGRESS_DOMAIN.to_string(),
            secrets_dir: None,
            rollout_trigger: None,
        }
    }
}

impl BuildOptions {
    pub fn builder() -> BuildOptionsBuilder {
        BuildOptionsBuilder::default()
    }

    /// Value of the rollout-trigger annotation for this build
    pub(crate) fn rollout_trigger_value(&self) -> String {
        self.rollout_trigger
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

/// Builder for [`BuildOptions`]
#[derive(Debug, Default)]
pub struct BuildOptionsBuilder {
    options: BuildOptions,
}

impl BuildOptionsBuilder {
    pub fn registry(mut self, registry: impl Into<String>) -> Self {
        self.options.registry = registry.into();
        self
    }

    pub fn ingress_domain(mut self, domain: impl Into<String>) -> Self {
        self.options.ingress_domain = domain.into();
        self
    }

    pub fn secrets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.secrets_dir = Some(dir.into());
        self
    }

    /// Pin the rollout-trigger annotation (reproducible output)
    pub fn rollout_trigger(mut self, value: impl Into<String>) -> Self {
        self.options.rollout_trigger = Some(value.into());
        self
    }

    pub fn build(self) -> BuildOptions {
        self.options
    }
}

/// Everything a builder needs to name and cross-reference objects for one
/// app in one environment
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub app_name: &'a str,
    pub team: &'a str,
    pub env: Environment,
    pub registry: &'a str,
    pub ingress_domain: &'a str,
    pub rollout_trigger: &'a str,
    pub secrets: &'a SecretMap,
}

impl BuildContext<'_> {
    /// Metadata in the generation namespace
    pub fn object_meta(&self, name: impl Into<String>) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.into()),
            namespace: Some(defaults::NAMESPACE.to_string()),
            ..Default::default()
        }
    }

    /// Metadata in the generation namespace with labels
    pub fn labeled_meta(
        &self,
        name: impl Into<String>,
        labels: BTreeMap<String, String>,
    ) -> ObjectMeta {
        ObjectMeta {
            labels: Some(labels),
            ..self.object_meta(name)
        }
    }

    /// `app=<app>` plus `extra`
    pub fn app_labels<'l>(
        &self,
        extra: impl IntoIterator<Item = (&'l str, &'l str)>,
    ) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        labels.insert(defaults::LABEL_APP.to_string(), self.app_name.to_string());
        for (key, value) in extra {
            labels.insert(key.to_string(), value.to_string());
        }
        labels
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub const ROLLOUT: &str = "2024-01-01T00:00:00.000Z";

    pub fn context<'a>(secrets: &'a SecretMap, env: Environment) -> BuildContext<'a> {
        BuildContext {
            app_name: "web",
            team: "platform",
            env,
            registry: defaults::IMAGE_REGISTRY,
            ingress_domain: defaults::INGRESS_DOMAIN,
            rollout_trigger: ROLLOUT,
            secrets,
        }
    }
}
