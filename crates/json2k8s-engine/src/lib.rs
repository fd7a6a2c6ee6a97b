//! json2k8s Engine - Kubernetes manifest generation
//!
//! This crate turns validated application descriptors into typed
//! Kubernetes objects:
//! - `builders`: pure functions producing Secrets, Deployments, Services,
//!   Ingresses, HPAs, PVCs and CronJobs
//! - `Engine`: resolves secrets once per environment and runs the
//!   deployment or cronjob pipeline for every descriptor environment
//! - `ManifestWriter`: writes a build below an output root as YAML

pub mod builders;
pub mod context;
pub mod engine;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod writer;

pub use context::{BuildContext, BuildOptions, BuildOptionsBuilder};
pub use engine::Engine;
pub use error::{EngineError, Result};
pub use manifest::{BuildOutput, Manifest, RenderedManifest};
pub use writer::ManifestWriter;
