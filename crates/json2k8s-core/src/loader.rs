//! Descriptor discovery and loading

use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::descriptor::AppDescriptor;
use crate::error::{CoreError, Result, ValidationErrorInfo};
use crate::schema::DescriptorValidator;

/// A validated descriptor together with the file it came from
#[derive(Debug, Clone)]
pub struct LoadedDescriptor {
    /// File name without the `.json` extension
    pub key: String,
    pub path: PathBuf,
    pub descriptor: AppDescriptor,
}

/// List descriptor files in `config_dir`
///
/// With `app` set, only `<app>.json` is returned. Otherwise every `*.json`
/// file directly inside the directory, sorted by name.
pub fn descriptor_files(config_dir: &Path, app: Option<&str>) -> Result<Vec<PathBuf>> {
    if let Some(app) = app {
        let path = config_dir.join(format!("{}.json", app));
        if !path.is_file() {
            return Err(CoreError::DescriptorNotFound {
                path: path.display().to_string(),
            });
        }
        return Ok(vec![path]);
    }

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(config_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Validate every descriptor file, failing if any of them is invalid
///
/// Validation runs over all files before failing so that one run reports the
/// violations of every descriptor, keyed by file name.
pub fn load_descriptors(config_dir: &Path, app: Option<&str>) -> Result<Vec<LoadedDescriptor>> {
    let validator = DescriptorValidator::new()?;
    let mut loaded = Vec::new();
    let mut failures: IndexMap<String, Vec<ValidationErrorInfo>> = IndexMap::new();

    for path in descriptor_files(config_dir, app)? {
        let key = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        match validator.load_file(&path) {
            Ok(descriptor) => {
                if descriptor.name() != key {
                    warn!(
                        file = %path.display(),
                        name = descriptor.name(),
                        "descriptor name does not match its file name"
                    );
                }
                debug!(file = %path.display(), kind = %descriptor.kind(), "descriptor is valid");
                loaded.push(LoadedDescriptor {
                    key,
                    path,
                    descriptor,
                });
            }
            Err(CoreError::InvalidDescriptor { errors, .. }) => {
                failures.insert(key, errors);
            }
            Err(CoreError::JsonParse(e)) => {
                failures.insert(key, vec![ValidationErrorInfo::new("(root)", e.to_string())]);
            }
            Err(other) => return Err(other),
        }
    }

    if failures.is_empty() {
        Ok(loaded)
    } else {
        Err(CoreError::InvalidDescriptors { failures })
    }
}
