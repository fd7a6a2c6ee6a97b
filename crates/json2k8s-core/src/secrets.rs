//! Secret sources
//!
//! A [`SecretSource`] resolves an environment to a flat mapping from secret
//! key to plaintext value. The engine resolves each environment once per
//! build and treats the mapping as a read-only snapshot.
//!
//! Secret files live at `<secrets-dir>/<env>.secret.json` and hold a single
//! JSON object of string values.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::descriptor::Environment;
use crate::error::{CoreError, Result};

/// Resolved secret values for one environment
pub type SecretMap = BTreeMap<String, String>;

/// Resolves the secret mapping for an environment
pub trait SecretSource {
    /// Return every secret value available to `env`
    fn resolve(&self, env: Environment, secrets_dir: &Path) -> Result<SecretMap>;
}

/// Path of the secret file for an environment
pub fn secret_file(secrets_dir: &Path, env: Environment) -> PathBuf {
    secrets_dir.join(format!("{}.secret.json", env))
}

/// Parse a flat JSON object of strings into a [`SecretMap`]
fn parse_secret_document(env: Environment, path: &Path, content: &str) -> Result<SecretMap> {
    let source_error = |message: String| CoreError::SecretSource {
        env,
        path: path.to_path_buf(),
        message,
    };

    let value: JsonValue = serde_json::from_str(content)
        .map_err(|e| source_error(format!("invalid JSON: {}", e)))?;

    let JsonValue::Object(entries) = value else {
        return Err(source_error("expected a JSON object of secret values".into()));
    };

    entries
        .into_iter()
        .map(|(key, value)| match value {
            JsonValue::String(s) => Ok((key, s)),
            other => Err(source_error(format!(
                "secret '{}' must be a string, found {}",
                key,
                json_type_name(&other)
            ))),
        })
        .collect()
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

// =============================================================================
// SOPS
// =============================================================================

/// Decrypts `<env>.secret.json` with the `sops` binary
#[derive(Debug, Clone)]
pub struct SopsSecretSource {
    program: String,
}

impl Default for SopsSecretSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SopsSecretSource {
    pub fn new() -> Self {
        Self {
            program: "sops".to_string(),
        }
    }

    /// Use a different `sops` executable
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl SecretSource for SopsSecretSource {
    fn resolve(&self, env: Environment, secrets_dir: &Path) -> Result<SecretMap> {
        let path = secret_file(secrets_dir, env);
        debug!(env = %env, path = %path.display(), "decrypting secrets with sops");

        let output = Command::new(&self.program)
            .arg("-d")
            .arg(&path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| CoreError::SecretSource {
                env,
                path: path.clone(),
                message: format!("failed to run {}: {}", self.program, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::SecretSource {
                env,
                path,
                message: format!("{} exited with {}: {}", self.program, output.status, stderr.trim()),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_secret_document(env, &path, &stdout)
    }
}

// =============================================================================
// PLAINTEXT
// =============================================================================

/// Reads `<env>.secret.json` without decryption
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainSecretSource;

impl SecretSource for PlainSecretSource {
    fn resolve(&self, env: Environment, secrets_dir: &Path) -> Result<SecretMap> {
        let path = secret_file(secrets_dir, env);
        debug!(env = %env, path = %path.display(), "reading plaintext secrets");

        let content = std::fs::read_to_string(&path).map_err(|e| CoreError::SecretSource {
            env,
            path: path.clone(),
            message: e.to_string(),
        })?;
        parse_secret_document(env, &path, &content)
    }
}

// =============================================================================
// IN-MEMORY
// =============================================================================

/// Fixed per-environment mappings, independent of any directory
///
/// An environment without an entry resolves to an empty mapping.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretSource {
    maps: HashMap<Environment, SecretMap>,
}

impl StaticSecretSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the mapping for an environment
    pub fn with_env<I, K, V>(mut self, env: Environment, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.maps.insert(
            env,
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }
}

impl SecretSource for StaticSecretSource {
    fn resolve(&self, env: Environment, _secrets_dir: &Path) -> Result<SecretMap> {
        Ok(self.maps.get(&env).cloned().unwrap_or_default())
    }
}
