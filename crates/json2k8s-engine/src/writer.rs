//! Writing a build to disk

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{EngineError, Result};
use crate::manifest::BuildOutput;

fn write_error(path: &Path, source: std::io::Error) -> EngineError {
    EngineError::Write {
        path: path.display().to_string(),
        source,
    }
}

/// Writes manifests as YAML files below an output root
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    root: PathBuf,
}

impl ManifestWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Remove everything below the output root and recreate it empty
    pub fn reset(&self) -> Result<()> {
        if self.root.exists() {
            debug!(root = %self.root.display(), "clearing output root");
            fs::remove_dir_all(&self.root).map_err(|e| write_error(&self.root, e))?;
        }
        fs::create_dir_all(&self.root).map_err(|e| write_error(&self.root, e))
    }

    /// Write every manifest, returning the written paths in order
    ///
    /// All documents are serialized before the first file is written.
    pub fn write(&self, output: &BuildOutput) -> Result<Vec<PathBuf>> {
        let rendered = output
            .iter()
            .map(|m| -> Result<(PathBuf, String)> {
                Ok((self.root.join(&m.path), m.manifest.to_yaml()?))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut written = Vec::with_capacity(rendered.len());
        for (path, yaml) in rendered {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;
            }
            fs::write(&path, yaml).map_err(|e| write_error(&path, e))?;
            debug!(path = %path.display(), "wrote manifest");
            written.push(path);
        }
        Ok(written)
    }
}
