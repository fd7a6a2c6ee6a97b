//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps library errors to appropriate exit codes.

use json2k8s_core::CoreError;
use json2k8s_engine::EngineError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// One or more descriptors failed schema validation
    #[error("Validation failed: {message}")]
    #[diagnostic(code(json2k8s::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Manifest generation failed
    #[error("Build failed: {message}")]
    #[diagnostic(code(json2k8s::cli::build))]
    Build {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Invalid arguments or missing input paths
    #[error("{message}")]
    #[diagnostic(code(json2k8s::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(json2k8s::cli::io))]
    Io { message: String },

    /// Wrapped error for passthrough (stores the formatted message)
    #[error("{message}")]
    #[diagnostic(code(json2k8s::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Build { .. } => exit_codes::BUILD_ERROR,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create a validation error with help text
    pub fn validation_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a usage error with help text
    pub fn usage_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidDescriptor { .. } | CoreError::InvalidDescriptors { .. } => {
                CliError::Validation {
                    message: err.to_string(),
                    help: Some("Run `json2k8s validate` to list every violation".to_string()),
                }
            }
            CoreError::DescriptorNotFound { .. } => CliError::Usage {
                message: err.to_string(),
                help: None,
            },
            CoreError::SecretSource { .. } => CliError::Build {
                message: err.to_string(),
                help: Some(
                    "Check that sops is installed and can decrypt the secret file".to_string(),
                ),
            },
            CoreError::Io(e) => CliError::from(e),
            CoreError::JsonParse(_) | CoreError::InvalidSchema { .. } => CliError::Other {
                message: err.to_string(),
            },
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        let help = err.help().map(|h| h.to_string());
        match err {
            EngineError::Core(core) => CliError::from(core),
            EngineError::Write { .. } => CliError::Io {
                message: err.to_string(),
            },
            EngineError::Yaml(_) => CliError::Other {
                message: err.to_string(),
            },
            _ => CliError::Build {
                message: err.to_string(),
                help,
            },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use json2k8s_core::{Environment, ValidationErrorInfo};

    #[test]
    fn test_exit_codes() {
        let err = CliError::from(CoreError::InvalidDescriptor {
            name: "web".into(),
            errors: vec![ValidationErrorInfo::new("/team", "required")],
        });
        assert_eq!(err.exit_code(), exit_codes::VALIDATION_ERROR);

        let err = CliError::from(EngineError::MissingSecret {
            app: "web".into(),
            env: Environment::Stage,
            source_key: "db".into(),
        });
        assert_eq!(err.exit_code(), exit_codes::BUILD_ERROR);
        assert!(err.to_string().contains("db"));

        let err = CliError::from(EngineError::Write {
            path: "build/web".into(),
            source: std::io::Error::other("read-only"),
        });
        assert_eq!(err.exit_code(), exit_codes::IO_ERROR);
    }

    #[test]
    fn test_engine_wraps_core_errors() {
        let err = CliError::from(EngineError::Core(CoreError::SecretSource {
            env: Environment::Prod,
            path: "secrets/prod.secret.json".into(),
            message: "sops exited with 1".into(),
        }));
        assert_eq!(err.exit_code(), exit_codes::BUILD_ERROR);
    }
}
