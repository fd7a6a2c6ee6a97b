//! json2k8s CLI - Kubernetes manifests from JSON application descriptors

use clap::{Parser, Subcommand};
use json2k8s_core::defaults;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod error;
mod exit_codes;

use commands::build::{BuildArgs, SecretSourceKind};

#[derive(Parser)]
#[command(name = "json2k8s")]
#[command(version)]
#[command(about = "Generate Kubernetes manifests from JSON application descriptors", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output (overrides RUST_LOG)
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate manifests for every descriptor environment
    Build {
        /// Directory holding the <app>.json descriptors
        config_dir: PathBuf,

        /// Build only this application
        #[arg(short, long)]
        app: Option<String>,

        /// Output root, emptied before every build
        #[arg(short, long, env = "JSON2K8S_OUT", default_value = "build")]
        out: PathBuf,

        /// Directory holding <env>.secret.json
        #[arg(short, long, env = "JSON2K8S_SECRETS_DIR")]
        secrets_dir: Option<PathBuf>,

        /// How secret files are read
        #[arg(long, value_enum, env = "JSON2K8S_SECRET_SOURCE", default_value_t = SecretSourceKind::Sops)]
        secret_source: SecretSourceKind,

        /// Base domain for ingress hosts
        #[arg(long, env = "JSON2K8S_INGRESS_DOMAIN", default_value = defaults::INGRESS_DOMAIN)]
        ingress_domain: String,
    },

    /// Validate descriptors against the schema
    Validate {
        /// Directory holding the <app>.json descriptors
        config_dir: PathBuf,

        /// Validate only this application
        #[arg(short, long)]
        app: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = match cli.command {
        Commands::Build {
            config_dir,
            app,
            out,
            secrets_dir,
            secret_source,
            ingress_domain,
        } => commands::build::run(&BuildArgs {
            config_dir: &config_dir,
            app: app.as_deref(),
            out: &out,
            secrets_dir: secrets_dir.as_deref(),
            secret_source,
            ingress_domain: &ingress_domain,
        }),

        Commands::Validate {
            config_dir,
            app,
            json,
        } => commands::validate::run(&config_dir, app.as_deref(), json),
    };

    match result {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(u8::try_from(code).unwrap_or(exit_codes::ERROR as u8))
        }
    }
}
