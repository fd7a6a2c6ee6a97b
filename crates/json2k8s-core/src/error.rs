//! Core error types

use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::descriptor::Environment;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Descriptor not found: {path}")]
    DescriptorNotFound { path: String },

    #[error("Invalid descriptor {name}: {} violation(s)", errors.len())]
    InvalidDescriptor {
        name: String,
        errors: Vec<ValidationErrorInfo>,
    },

    #[error("{} invalid descriptor(s): {}", failures.len(), failures.keys().cloned().collect::<Vec<_>>().join(", "))]
    InvalidDescriptors {
        failures: IndexMap<String, Vec<ValidationErrorInfo>>,
    },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("Failed to resolve {env} secrets from {}: {message}", path.display())]
    SecretSource {
        env: Environment,
        path: PathBuf,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// A single schema violation, addressed by JSON pointer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrorInfo {
    /// JSON pointer to the offending value (`(root)` for the document itself)
    pub path: String,

    /// Human-readable description of the violation
    pub message: String,
}

impl ValidationErrorInfo {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
