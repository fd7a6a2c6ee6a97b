//! Engine error types

use json2k8s_core::{CoreError, Environment};
use miette::Diagnostic;
use thiserror::Error;

/// Errors that abort a build
///
/// Every variant is fatal for the whole invocation: the engine never returns
/// a partial manifest set.
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum EngineError {
    /// Neither `imagePath` nor `imageTag` is set
    #[error("image path and tag are not set for '{app}' in the {env} environment")]
    #[diagnostic(
        code(json2k8s::build::missing_image),
        help("set either `imagePath` or `imageTag` for {app} in {env}")
    )]
    MissingImage { app: String, env: Environment },

    /// Two replica groups of one environment share a name
    #[error("duplicate replica group name '{group}' in the {env} environment of '{app}'")]
    #[diagnostic(
        code(json2k8s::build::duplicate_replica_group),
        help("replica group names must be unique within an environment")
    )]
    DuplicateReplicaGroup {
        app: String,
        env: Environment,
        group: String,
    },

    /// A secret reference points at a key the secret source does not have
    #[error("secret '{source_key}' referenced by '{app}' not found in {env}.secret.json")]
    #[diagnostic(
        code(json2k8s::build::missing_secret),
        help("add '{source_key}' to the {env} secrets or fix the `source` of the reference")
    )]
    MissingSecret {
        app: String,
        env: Environment,
        source_key: String,
    },

    /// Descriptor loading or secret resolution failed
    #[error(transparent)]
    #[diagnostic(code(json2k8s::core))]
    Core(#[from] CoreError),

    #[error("YAML error: {0}")]
    #[diagnostic(code(json2k8s::output::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to write {path}: {source}")]
    #[diagnostic(code(json2k8s::output::io))]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
