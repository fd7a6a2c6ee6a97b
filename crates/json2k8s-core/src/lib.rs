//! json2k8s Core - descriptor model, schema and secret sources
//!
//! This crate provides the input side of manifest generation:
//! - `AppDescriptor`: the typed application descriptor (deployment or cronjob)
//! - `DescriptorValidator`: JSON Schema validation reporting every violated path
//! - `SecretSource`: resolution of per-environment secret mappings
//! - `defaults` and `naming`: constants and name derivation shared by builders

pub mod defaults;
pub mod descriptor;
pub mod error;
pub mod loader;
pub mod naming;
pub mod schema;
pub mod secrets;

pub use descriptor::{
    AccessMode, App, AppDescriptor, AppKind, Autoscaling, ConcurrencyPolicy, CronJobConfig,
    CronJobEnv, DeploymentEnv, DeploymentStrategyKind, EnvEntry, Environment, ImageSource,
    IngressConfig, PersistentVolume, ReplicaGroup, ResourceSpec, Resources, SecretDelivery,
    SecretRef, Shared, Sidecar, Workflow,
};
pub use error::{CoreError, Result, ValidationErrorInfo};
pub use loader::{LoadedDescriptor, descriptor_files, load_descriptors};
pub use schema::{DescriptorValidator, ValidationResult, descriptor_schema};
pub use secrets::{
    PlainSecretSource, SecretMap, SecretSource, SopsSecretSource, StaticSecretSource, secret_file,
};
