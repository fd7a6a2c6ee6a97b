//! Build command - generate manifests for every descriptor environment

use clap::ValueEnum;
use console::style;
use json2k8s_core::{
    CoreError, PlainSecretSource, SecretSource, SopsSecretSource, descriptor_files,
    load_descriptors,
};
use json2k8s_engine::{BuildOptions, Engine, ManifestWriter};
use std::path::Path;
use tracing::debug;

use crate::display::ValidationReport;
use crate::error::{CliError, Result};

/// How `<env>.secret.json` files are read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SecretSourceKind {
    /// Decrypt with `sops -d`
    #[default]
    Sops,
    /// Read the files as plaintext JSON
    Plain,
}

impl SecretSourceKind {
    fn source(self) -> Box<dyn SecretSource> {
        match self {
            Self::Sops => Box::new(SopsSecretSource::new()),
            Self::Plain => Box::new(PlainSecretSource),
        }
    }
}

/// Arguments of one build invocation
#[derive(Debug, Clone)]
pub struct BuildArgs<'a> {
    pub config_dir: &'a Path,
    pub app: Option<&'a str>,
    pub out: &'a Path,
    pub secrets_dir: Option<&'a Path>,
    pub secret_source: SecretSourceKind,
    pub ingress_domain: &'a str,
}

/// Fail early when the config directory is unusable
pub(crate) fn check_config_dir(config_dir: &Path) -> Result<()> {
    if !config_dir.is_dir() {
        return Err(CliError::usage_with_help(
            format!("Config directory not found: {}", config_dir.display()),
            "pass the directory holding the <app>.json descriptors",
        ));
    }
    Ok(())
}

/// Check every input path before anything is written
fn preflight(args: &BuildArgs<'_>) -> Result<()> {
    check_config_dir(args.config_dir)?;

    let files = descriptor_files(args.config_dir, args.app)?;
    if files.is_empty() {
        return Err(CliError::usage_with_help(
            format!("No descriptors found in {}", args.config_dir.display()),
            "descriptor files are named <app>.json",
        ));
    }

    if let Some(dir) = args.secrets_dir
        && !dir.is_dir()
    {
        return Err(CliError::usage_with_help(
            format!("Secrets directory not found: {}", dir.display()),
            "pass the directory holding <env>.secret.json or omit --secrets-dir",
        ));
    }
    Ok(())
}

pub fn run(args: &BuildArgs<'_>) -> Result<()> {
    preflight(args)?;

    // The output root is emptied up front so a failed build leaves no files
    let writer = ManifestWriter::new(args.out);
    writer.reset()?;

    println!(
        "{} Loading descriptors from {}",
        style("→").blue(),
        args.config_dir.display()
    );

    let loaded = match load_descriptors(args.config_dir, args.app) {
        Ok(loaded) => loaded,
        Err(CoreError::InvalidDescriptors { failures }) => {
            let mut report = ValidationReport::new();
            for (key, errors) in &failures {
                report.add_violations(&format!("{}.json", key), errors);
            }
            report.display();
            println!();
            report.print_summary();
            return Err(CliError::from(CoreError::InvalidDescriptors { failures }));
        }
        Err(e) => return Err(e.into()),
    };

    let mut options = BuildOptions::builder().ingress_domain(args.ingress_domain);
    if let Some(dir) = args.secrets_dir {
        options = options.secrets_dir(dir);
    }
    let engine = Engine::new(options.build());
    debug!(options = ?engine.options(), "engine configured");

    let descriptors: Vec<_> = loaded.into_iter().map(|l| l.descriptor).collect();
    let source = args.secret_source.source();
    let output = engine.build(&descriptors, source.as_ref())?;

    for path in writer.write(&output)? {
        println!("{} {}", style("wrote").green(), path.display());
    }

    println!();
    println!(
        "{} Generated {} manifest(s) for {} descriptor(s) in {}",
        style("✓").green().bold(),
        output.len(),
        descriptors.len(),
        writer.root().display()
    );
    Ok(())
}
