//! Manifest builders
//!
//! Every builder is a pure function from validated configuration and a
//! [`BuildContext`](crate::context::BuildContext) to a typed Kubernetes
//! object. Names that cross object boundaries come from
//! [`json2k8s_core::naming`].

pub mod container;
pub mod cronjob;
pub mod deployment;
pub mod hpa;
pub mod ingress;
pub mod pod;
pub mod pvc;
pub mod secret;
pub mod service;

pub use container::{ContainerInput, build_container, build_sidecar};
pub use cronjob::build_cronjob;
pub use deployment::build_deployment;
pub use hpa::build_hpa;
pub use ingress::{IngressVariant, build_ingress, tls_hosts};
pub use pod::{PodPlacement, build_pod_template, deployment_volumes, volumes_from_mounts};
pub use pvc::build_pvc;
pub use secret::build_secret;
pub use service::build_service;
