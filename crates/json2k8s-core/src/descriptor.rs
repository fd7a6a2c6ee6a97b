//! Typed application descriptor model
//!
//! These types are produced by [`crate::schema`] after a descriptor has passed
//! schema validation. They are never mutated once decoded; the engine borrows
//! them for the duration of a build.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Target environment overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Stage,
    Prod,
}

impl Environment {
    /// Every environment, in build order
    pub const ALL: [Environment; 2] = [Environment::Stage, Environment::Prod];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stage => "stage",
            Self::Prod => "prod",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ROOT DESCRIPTOR
// =============================================================================

/// One application descriptor, discriminated on its `type` field
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AppDescriptor {
    Deployment(App<DeploymentEnv>),
    CronJob(App<CronJobEnv>),
}

/// Kind of workload an application produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppKind {
    Deployment,
    CronJob,
}

impl AppKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Deployment => "deployment",
            Self::CronJob => "cronjob",
        }
    }
}

impl fmt::Display for AppKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AppDescriptor {
    pub fn name(&self) -> &str {
        match self {
            Self::Deployment(app) => &app.name,
            Self::CronJob(app) => &app.name,
        }
    }

    pub fn team(&self) -> &str {
        match self {
            Self::Deployment(app) => &app.team,
            Self::CronJob(app) => &app.team,
        }
    }

    pub fn kind(&self) -> AppKind {
        match self {
            Self::Deployment(_) => AppKind::Deployment,
            Self::CronJob(_) => AppKind::CronJob,
        }
    }

    /// Whether the descriptor configures the given environment
    pub fn defines(&self, env: Environment) -> bool {
        match self {
            Self::Deployment(app) => app.environment(env).is_some(),
            Self::CronJob(app) => app.environment(env).is_some(),
        }
    }

    /// Environments this descriptor configures, in build order
    pub fn environments(&self) -> Vec<Environment> {
        Environment::ALL
            .into_iter()
            .filter(|env| self.defines(*env))
            .collect()
    }
}

/// Fields shared by both descriptor variants, generic over the environment shape
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App<E> {
    pub name: String,
    pub team: String,
    pub stage: Option<E>,
    pub prod: Option<E>,
}

impl<E> App<E> {
    pub fn environment(&self, env: Environment) -> Option<&E> {
        match env {
            Environment::Stage => self.stage.as_ref(),
            Environment::Prod => self.prod.as_ref(),
        }
    }
}

// =============================================================================
// SHARED FRAGMENTS
// =============================================================================

/// Node pool / toleration selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Workflow {
    Critical,
    Noncritical,
    Points,
}

impl Workflow {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Noncritical => "noncritical",
            Self::Points => "points",
        }
    }
}

/// A literal environment variable
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnvEntry {
    pub name: String,
    pub value: String,
}

/// CPU and memory quantities
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceSpec {
    pub cpu: String,
    pub memory: String,
}

/// Container resource requests and limits
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Resources {
    pub requests: ResourceSpec,
    pub limits: ResourceSpec,
}

/// Where the container image comes from
///
/// `imagePath` is used verbatim; otherwise the image is synthesized from the
/// registry prefix, the app name and `imageTag`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSource {
    #[serde(default)]
    pub image_tag: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
}

impl ImageSource {
    /// Resolve the image reference, or `None` when neither field is set
    pub fn resolve(&self, registry: &str, app_name: &str) -> Option<String> {
        if let Some(path) = self.image_path.as_deref().filter(|p| !p.is_empty()) {
            return Some(path.to_string());
        }
        self.image_tag
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|tag| format!("{}/{}:{}", registry, app_name, tag))
    }
}

// =============================================================================
// SECRETS
// =============================================================================

/// How a secret value reaches the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretDelivery {
    /// Exposed as the environment variable `key`
    EnvVar { key: String },
    /// Mounted as `file_name` inside the directory `dir`
    File { dir: String, file_name: String },
}

/// A reference into the resolved secret mapping
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "SecretRefFields")]
pub struct SecretRef {
    /// Lookup key in the secret mapping
    pub source: String,
    pub delivery: SecretDelivery,
}

impl SecretRef {
    pub fn env_var(source: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            delivery: SecretDelivery::EnvVar { key: key.into() },
        }
    }

    pub fn file(
        source: impl Into<String>,
        dir: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            delivery: SecretDelivery::File {
                dir: dir.into(),
                file_name: file_name.into(),
            },
        }
    }

    /// Environment variable name, for env-delivered secrets
    pub fn env_key(&self) -> Option<&str> {
        match &self.delivery {
            SecretDelivery::EnvVar { key } => Some(key),
            SecretDelivery::File { .. } => None,
        }
    }

    /// `(dir, file_name)`, for file-delivered secrets
    pub fn file_target(&self) -> Option<(&str, &str)> {
        match &self.delivery {
            SecretDelivery::File { dir, file_name } => Some((dir, file_name)),
            SecretDelivery::EnvVar { .. } => None,
        }
    }
}

/// Wire shape of a secret reference before the delivery mode is decided
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretRefFields {
    source: String,
    #[serde(default)]
    env_var: Option<String>,
    #[serde(default)]
    file_path: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl TryFrom<SecretRefFields> for SecretRef {
    type Error = String;

    fn try_from(fields: SecretRefFields) -> Result<Self, Self::Error> {
        if let Some(key) = non_empty(fields.env_var) {
            return Ok(Self {
                source: fields.source,
                delivery: SecretDelivery::EnvVar { key },
            });
        }
        match (non_empty(fields.file_path), non_empty(fields.name)) {
            (Some(dir), Some(file_name)) => Ok(Self {
                source: fields.source,
                delivery: SecretDelivery::File { dir, file_name },
            }),
            _ => Err(format!(
                "secret '{}': either envVar must be set, or both filePath and name must be set",
                fields.source
            )),
        }
    }
}

// =============================================================================
// DEPLOYMENT VARIANT
// =============================================================================

/// One environment of a deployment-type app
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentEnv {
    pub replica_groups: Vec<ReplicaGroup>,
    pub shared: Shared,
}

impl DeploymentEnv {
    /// First replica group name that appears more than once
    pub fn duplicate_group_name(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        self.replica_groups
            .iter()
            .map(|group| group.name.as_str())
            .find(|name| !seen.insert(*name))
    }
}

/// Rollout strategy for a replica group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum DeploymentStrategyKind {
    #[default]
    RollingUpdate,
    Recreate,
}

/// One independently scalable set of pods
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaGroup {
    pub name: String,
    pub replicas: i32,
    #[serde(default)]
    pub env: Vec<EnvEntry>,
    pub secrets: Vec<SecretRef>,
    #[serde(default)]
    pub persistent_volumes: Vec<PersistentVolume>,
    pub resources: Resources,
    #[serde(default)]
    pub autoscaling: Option<Autoscaling>,
    #[serde(default)]
    pub deployment_strategy: DeploymentStrategyKind,
}

/// Horizontal autoscaling bounds and targets
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Autoscaling {
    pub enabled: bool,
    pub min_replicas: i32,
    pub max_replicas: i32,
    #[serde(default, rename = "targetCPUUtilizationPercentage")]
    pub target_cpu_utilization_percentage: Option<i32>,
    #[serde(default)]
    pub target_memory_utilization_percentage: Option<i32>,
}

/// Volume access mode for a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum AccessMode {
    ReadWriteOnce,
    ReadWriteMany,
    ReadOnlyMany,
}

impl AccessMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ReadWriteOnce => "ReadWriteOnce",
            Self::ReadWriteMany => "ReadWriteMany",
            Self::ReadOnlyMany => "ReadOnlyMany",
        }
    }
}

/// A persistent volume declared by a replica group
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolume {
    pub name: String,
    pub mount_path: String,
    #[serde(default)]
    pub sub_path: Option<String>,
    #[serde(default)]
    pub storage_class: Option<String>,
    pub size: String,
    pub access_mode: AccessMode,
}

/// Ingress toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressConfig {
    pub enabled: bool,
    pub sub_domain_created: bool,
}

/// Settings applied to every replica group of an environment
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shared {
    pub workflow: Workflow,
    pub ports: Vec<i32>,
    #[serde(flatten)]
    pub image: ImageSource,
    #[serde(default)]
    pub command: Option<Vec<String>>,
    #[serde(default)]
    pub args: Option<Vec<String>>,
    /// Accepted for compatibility, not used by deployments
    #[serde(default)]
    pub schedule: Option<String>,
    /// Probes are copied verbatim into the primary container
    #[serde(default)]
    pub liveness_probe: Option<JsonValue>,
    #[serde(default)]
    pub readiness_probe: Option<JsonValue>,
    #[serde(default)]
    pub startup_probe: Option<JsonValue>,
    #[serde(default)]
    pub ingress: Option<IngressConfig>,
    pub sidecar: Sidecar,
}

/// Secondary container co-scheduled with every replica group
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sidecar {
    pub enabled: bool,
    pub image: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub env: Vec<EnvEntry>,
    #[serde(default)]
    pub secrets: Vec<SecretRef>,
    #[serde(default)]
    pub resources: Option<Resources>,
    /// Copied verbatim into the sidecar container
    #[serde(default)]
    pub security_context: Option<JsonValue>,
    /// Appended verbatim after the sidecar's file-secret mounts
    #[serde(default)]
    pub volume_mounts: Vec<JsonValue>,
}

// =============================================================================
// CRONJOB VARIANT
// =============================================================================

/// One environment of a cronjob-type app
#[derive(Debug, Clone, Deserialize)]
pub struct CronJobEnv {
    pub cronjob: CronJobConfig,
}

/// Overlapping-run policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ConcurrencyPolicy {
    Allow,
    Forbid,
    Replace,
}

impl ConcurrencyPolicy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "Allow",
            Self::Forbid => "Forbid",
            Self::Replace => "Replace",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronJobConfig {
    pub workflow: Workflow,
    pub schedule: String,
    pub concurrency_policy: ConcurrencyPolicy,
    #[serde(default)]
    pub successful_jobs_history_limit: Option<i32>,
    #[serde(default)]
    pub failed_jobs_history_limit: Option<i32>,
    #[serde(default)]
    pub starting_deadline_seconds: Option<i64>,
    #[serde(default)]
    pub backoff_limit: Option<i32>,
    #[serde(default)]
    pub ttl_seconds_after_finished: Option<i32>,
    #[serde(default)]
    pub suspend: Option<bool>,
    #[serde(default)]
    pub env: Vec<EnvEntry>,
    #[serde(default)]
    pub secrets: Vec<SecretRef>,
    #[serde(flatten)]
    pub image: ImageSource,
    #[serde(default)]
    pub command: Option<Vec<String>>,
    #[serde(default)]
    pub args: Option<Vec<String>>,
    pub resources: Resources,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_secret_ref_env_var_wins() {
        let secret: SecretRef = serde_json::from_value(json!({
            "source": "db_url",
            "envVar": "DATABASE_URL",
            "filePath": "/etc/app",
            "name": "db.json"
        }))
        .unwrap();

        assert_eq!(secret.env_key(), Some("DATABASE_URL"));
        assert_eq!(secret.file_target(), None);
    }

    #[test]
    fn test_secret_ref_file_delivery() {
        let secret: SecretRef = serde_json::from_value(json!({
            "source": "creds",
            "filePath": "/etc/app",
            "name": "creds.json"
        }))
        .unwrap();

        assert_eq!(secret.file_target(), Some(("/etc/app", "creds.json")));
    }

    #[test]
    fn test_secret_ref_incomplete_rejected() {
        let result: Result<SecretRef, _> = serde_json::from_value(json!({
            "source": "creds",
            "filePath": "/etc/app"
        }));

        let err = result.unwrap_err().to_string();
        assert!(err.contains("either envVar must be set"));
    }

    #[test]
    fn test_empty_env_var_falls_back_to_file() {
        let secret: SecretRef = serde_json::from_value(json!({
            "source": "creds",
            "envVar": "",
            "filePath": "/etc/app",
            "name": "creds.json"
        }))
        .unwrap();

        assert!(secret.env_key().is_none());
    }

    #[test]
    fn test_image_source_prefers_path() {
        let image = ImageSource {
            image_tag: Some("v1".into()),
            image_path: Some("nginx:1.27".into()),
        };
        assert_eq!(
            image.resolve("registry.example", "web"),
            Some("nginx:1.27".to_string())
        );
    }

    #[test]
    fn test_image_source_from_tag() {
        let image = ImageSource {
            image_tag: Some("v1".into()),
            image_path: None,
        };
        assert_eq!(
            image.resolve("registry.example", "web"),
            Some("registry.example/web:v1".to_string())
        );
        assert_eq!(ImageSource::default().resolve("registry.example", "web"), None);
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(Environment::Stage.to_string(), "stage");
        assert_eq!(Environment::Prod.as_str(), "prod");
    }
}
