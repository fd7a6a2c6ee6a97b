//! Validate command - check descriptors against the schema

use console::style;
use json2k8s_core::{CoreError, DescriptorValidator, ValidationErrorInfo, descriptor_files};
use std::path::Path;

use crate::commands::build::check_config_dir;
use crate::display::ValidationReport;
use crate::error::{CliError, Result};

/// Validation outcome of one descriptor file
struct FileOutcome {
    file: String,
    kind: Option<String>,
    errors: Vec<ValidationErrorInfo>,
    name_mismatch: Option<String>,
}

fn validate_files(config_dir: &Path, app: Option<&str>) -> Result<Vec<FileOutcome>> {
    let validator = DescriptorValidator::new()?;
    let mut outcomes = Vec::new();

    for path in descriptor_files(config_dir, app)? {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let outcome = match validator.load_file(&path) {
            Ok(descriptor) => FileOutcome {
                file,
                kind: Some(descriptor.kind().to_string()),
                errors: Vec::new(),
                name_mismatch: (descriptor.name() != stem).then(|| descriptor.name().to_string()),
            },
            Err(CoreError::InvalidDescriptor { errors, .. }) => FileOutcome {
                file,
                kind: None,
                errors,
                name_mismatch: None,
            },
            Err(CoreError::JsonParse(e)) => FileOutcome {
                file,
                kind: None,
                errors: vec![ValidationErrorInfo::new("(root)", e.to_string())],
                name_mismatch: None,
            },
            Err(other) => return Err(other.into()),
        };
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

pub fn run(config_dir: &Path, app: Option<&str>, json_output: bool) -> Result<()> {
    check_config_dir(config_dir)?;

    if !json_output {
        println!(
            "{} Validating descriptors in {}",
            style("→").blue(),
            config_dir.display()
        );
    }

    let outcomes = validate_files(config_dir, app)?;
    let invalid = outcomes.iter().filter(|o| !o.errors.is_empty()).count();

    if json_output {
        let output = serde_json::json!({
            "valid": invalid == 0,
            "descriptors": outcomes.iter().map(|o| {
                serde_json::json!({
                    "file": o.file,
                    "valid": o.errors.is_empty(),
                    "kind": o.kind,
                    "errors": o.errors,
                })
            }).collect::<Vec<_>>(),
        });
        let rendered = serde_json::to_string_pretty(&output).map_err(|e| CliError::Other {
            message: e.to_string(),
        })?;
        println!("{}", rendered);
    } else {
        let mut report = ValidationReport::new();
        for outcome in &outcomes {
            if outcome.errors.is_empty() {
                report.validated_count += 1;
                println!(
                    "  {} {} ({})",
                    style("✓").green(),
                    outcome.file,
                    outcome.kind.as_deref().unwrap_or_default()
                );
            } else {
                report.add_violations(&outcome.file, &outcome.errors);
            }
            if let Some(name) = &outcome.name_mismatch {
                report.add_warning(
                    &outcome.file,
                    "/name",
                    &format!("descriptor name '{}' differs from its file name", name),
                    Some("manifests are written below the descriptor name".to_string()),
                );
            }
        }

        report.display();
        println!();
        report.print_summary();
    }

    if invalid > 0 {
        return Err(CliError::validation_with_help(
            format!("{} of {} descriptor(s) invalid", invalid, outcomes.len()),
            "fix the reported violations and run validate again",
        ));
    }
    Ok(())
}
