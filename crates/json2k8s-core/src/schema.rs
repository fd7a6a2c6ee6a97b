//! Descriptor schema validation
//!
//! Validation happens in two layers:
//! - A JSON Schema (draft 7) compiled once with `jsonschema`, which reports
//!   every violated instance path in a single pass
//! - `serde` decoding into the typed [`AppDescriptor`], which only runs once
//!   the document is structurally valid and reports the path of the field
//!   it rejects
//!
//! The `type` discriminator and the secret delivery rule are expressed as
//! schema conditionals so their violations are reported with precise paths.

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use serde_path_to_error::Segment;
use std::path::Path;

use crate::descriptor::AppDescriptor;
use crate::error::{CoreError, Result, ValidationErrorInfo};

/// Descriptor JSON Schema source
const DESCRIPTOR_SCHEMA: &str = include_str!("descriptor.schema.json");

/// Parse the JSON Schema for an application descriptor
pub fn descriptor_schema() -> Result<JsonValue> {
    serde_json::from_str(DESCRIPTOR_SCHEMA).map_err(|e| CoreError::InvalidSchema {
        message: format!("Failed to parse descriptor schema: {}", e),
    })
}

/// Result of schema validation
#[derive(Debug)]
pub struct ValidationResult {
    /// Whether the descriptor is valid
    pub is_valid: bool,
    /// Every violation found
    pub errors: Vec<ValidationErrorInfo>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self {
            is_valid: true,
            errors: vec![],
        }
    }

    pub fn failure(errors: Vec<ValidationErrorInfo>) -> Self {
        Self {
            is_valid: false,
            errors,
        }
    }
}

/// Descriptor validator with the schema compiled once
pub struct DescriptorValidator {
    compiled: jsonschema::Validator,
}

impl DescriptorValidator {
    /// Compile the descriptor schema
    pub fn new() -> Result<Self> {
        let compiled = jsonschema::validator_for(&descriptor_schema()?).map_err(|e| {
            CoreError::InvalidSchema {
                message: format!("Invalid descriptor schema: {}", e),
            }
        })?;
        Ok(Self { compiled })
    }

    /// Check a raw document against the schema, collecting every violation
    pub fn validate(&self, value: &JsonValue) -> ValidationResult {
        if self.compiled.is_valid(value) {
            return ValidationResult::success();
        }

        let errors = self
            .compiled
            .iter_errors(value)
            .map(|e| {
                let path = e.instance_path.to_string();
                ValidationErrorInfo {
                    path: if path.is_empty() {
                        "(root)".to_string()
                    } else {
                        path
                    },
                    message: format_validation_error(&e),
                }
            })
            .collect();

        ValidationResult::failure(errors)
    }

    /// Validate and decode a raw document into a typed descriptor
    ///
    /// `name` identifies the document in the error (usually the file stem).
    pub fn parse(&self, name: &str, value: JsonValue) -> Result<AppDescriptor> {
        let result = self.validate(&value);
        if !result.is_valid {
            return Err(CoreError::InvalidDescriptor {
                name: name.to_string(),
                errors: result.errors,
            });
        }

        decode(value).map_err(|error| CoreError::InvalidDescriptor {
            name: name.to_string(),
            errors: vec![error],
        })
    }

    /// Validate and decode a descriptor from JSON text
    pub fn parse_str(&self, name: &str, json: &str) -> Result<AppDescriptor> {
        let value: JsonValue = serde_json::from_str(json)?;
        self.parse(name, value)
    }

    /// Validate and decode a descriptor file
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<AppDescriptor> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CoreError::DescriptorNotFound {
                path: path.display().to_string(),
            });
        }
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let content = std::fs::read_to_string(path)?;
        self.parse_str(&name, &content)
    }
}

/// Decode a schema-valid document, keeping the path of a failing field
///
/// The variant is picked from `type` up front so that field errors are not
/// lost behind the tagged-enum buffering.
fn decode(value: JsonValue) -> std::result::Result<AppDescriptor, ValidationErrorInfo> {
    match value.get("type").and_then(JsonValue::as_str) {
        Some("deployment") => decode_as(value).map(AppDescriptor::Deployment),
        Some("cronjob") => decode_as(value).map(AppDescriptor::CronJob),
        _ => decode_as(value),
    }
}

fn decode_as<T: DeserializeOwned>(value: JsonValue) -> std::result::Result<T, ValidationErrorInfo> {
    serde_path_to_error::deserialize(value).map_err(|e| {
        ValidationErrorInfo::new(json_pointer(e.path()), e.inner().to_string())
    })
}

/// Render a deserialization path the way schema violations are addressed
fn json_pointer(path: &serde_path_to_error::Path) -> String {
    let pointer: String = path
        .iter()
        .filter_map(|segment| match segment {
            Segment::Seq { index } => Some(format!("/{}", index)),
            Segment::Map { key } => Some(format!("/{}", key)),
            Segment::Enum { .. } | Segment::Unknown => None,
        })
        .collect();
    if pointer.is_empty() {
        "(root)".to_string()
    } else {
        pointer
    }
}

/// Format a validation error into a user-friendly message
fn format_validation_error(error: &jsonschema::ValidationError) -> String {
    error.to_string().replace('"', "'")
}
