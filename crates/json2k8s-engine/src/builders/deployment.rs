//! Deployments

use std::collections::BTreeMap;

use json2k8s_core::{DeploymentStrategyKind, ReplicaGroup, defaults};
use k8s_openapi::api::apps::v1::{
    Deployment, DeploymentSpec, DeploymentStrategy, RollingUpdateDeployment,
};
use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use crate::context::BuildContext;

pub fn deployment_strategy(kind: DeploymentStrategyKind) -> DeploymentStrategy {
    match kind {
        DeploymentStrategyKind::RollingUpdate => DeploymentStrategy {
            type_: Some("RollingUpdate".to_string()),
            rolling_update: Some(RollingUpdateDeployment {
                max_surge: Some(IntOrString::String(
                    defaults::ROLLING_UPDATE_MAX_SURGE.to_string(),
                )),
                max_unavailable: Some(IntOrString::Int(defaults::ROLLING_UPDATE_MAX_UNAVAILABLE)),
            }),
        },
        DeploymentStrategyKind::Recreate => DeploymentStrategy {
            type_: Some("Recreate".to_string()),
            rolling_update: None,
        },
    }
}

/// Selector labels of a replica group: `{app, replicaGroup}`
///
/// The pod template of the group must carry both labels.
pub fn group_selector(ctx: &BuildContext<'_>, group: &str) -> BTreeMap<String, String> {
    ctx.app_labels([(defaults::LABEL_REPLICA_GROUP, group)])
}

/// Deployment named after the replica group
pub fn build_deployment(
    ctx: &BuildContext<'_>,
    group: &ReplicaGroup,
    template: PodTemplateSpec,
) -> Deployment {
    Deployment {
        metadata: ctx.object_meta(&group.name),
        spec: Some(DeploymentSpec {
            replicas: Some(group.replicas),
            strategy: Some(deployment_strategy(group.deployment_strategy)),
            selector: LabelSelector {
                match_labels: Some(group_selector(ctx, &group.name)),
                match_expressions: None,
            },
            template,
            ..Default::default()
        }),
        ..Default::default()
    }
}
