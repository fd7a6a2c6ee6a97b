//! Horizontal pod autoscalers

use json2k8s_core::{Autoscaling, naming};
use k8s_openapi::api::autoscaling::v2::{
    CrossVersionObjectReference, HorizontalPodAutoscaler, HorizontalPodAutoscalerSpec,
    MetricSpec, MetricTarget, ResourceMetricSource,
};

use crate::context::BuildContext;

fn utilization_metric(resource: &str, percentage: i32) -> MetricSpec {
    MetricSpec {
        type_: "Resource".to_string(),
        resource: Some(ResourceMetricSource {
            name: resource.to_string(),
            target: MetricTarget {
                type_: "Utilization".to_string(),
                average_utilization: Some(percentage),
                ..Default::default()
            },
        }),
        ..Default::default()
    }
}

/// Autoscaler for the deployment of `group`
///
/// Emits a cpu metric, then a memory metric, for whichever targets are set.
/// The metrics list is always present, possibly empty.
pub fn build_hpa(ctx: &BuildContext<'_>, group: &str, autoscaling: &Autoscaling) -> HorizontalPodAutoscaler {
    let metrics = [
        ("cpu", autoscaling.target_cpu_utilization_percentage),
        ("memory", autoscaling.target_memory_utilization_percentage),
    ]
    .into_iter()
    .filter_map(|(resource, target)| target.map(|pct| utilization_metric(resource, pct)))
    .collect();

    HorizontalPodAutoscaler {
        metadata: ctx.object_meta(naming::hpa_name(group)),
        spec: Some(HorizontalPodAutoscalerSpec {
            scale_target_ref: CrossVersionObjectReference {
                api_version: Some("apps/v1".to_string()),
                kind: "Deployment".to_string(),
                name: group.to_string(),
            },
            min_replicas: Some(autoscaling.min_replicas),
            max_replicas: autoscaling.max_replicas,
            metrics: Some(metrics),
            behavior: None,
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support;
    use json2k8s_core::{Environment, SecretMap};

    fn autoscaling(cpu: Option<i32>, memory: Option<i32>) -> Autoscaling {
        Autoscaling {
            enabled: true,
            min_replicas: 2,
            max_replicas: 6,
            target_cpu_utilization_percentage: cpu,
            target_memory_utilization_percentage: memory,
        }
    }

    fn metric_names(hpa: &HorizontalPodAutoscaler) -> Vec<String> {
        hpa.spec
            .as_ref()
            .and_then(|s| s.metrics.as_ref())
            .unwrap()
            .iter()
            .filter_map(|m| m.resource.as_ref().map(|r| r.name.clone()))
            .collect()
    }

    #[test]
    fn test_hpa_target_and_bounds() {
        let secrets = SecretMap::new();
        let ctx = test_support::context(&secrets, Environment::Stage);

        let hpa = build_hpa(&ctx, "api", &autoscaling(Some(70), None));
        assert_eq!(hpa.metadata.name.as_deref(), Some("api-hpa"));

        let spec = hpa.spec.as_ref().unwrap();
        assert_eq!(spec.scale_target_ref.kind, "Deployment");
        assert_eq!(spec.scale_target_ref.name, "api");
        assert_eq!(spec.scale_target_ref.api_version.as_deref(), Some("apps/v1"));
        assert_eq!(spec.min_replicas, Some(2));
        assert_eq!(spec.max_replicas, 6);

        let metric = &spec.metrics.as_ref().unwrap()[0];
        assert_eq!(metric.type_, "Resource");
        let target = &metric.resource.as_ref().unwrap().target;
        assert_eq!(target.type_, "Utilization");
        assert_eq!(target.average_utilization, Some(70));
    }

    #[test]
    fn test_hpa_metric_selection() {
        let secrets = SecretMap::new();
        let ctx = test_support::context(&secrets, Environment::Stage);

        let none = build_hpa(&ctx, "api", &autoscaling(None, None));
        let memory = build_hpa(&ctx, "api", &autoscaling(None, Some(80)));
        let both = build_hpa(&ctx, "api", &autoscaling(Some(70), Some(80)));

        assert!(metric_names(&none).is_empty());
        assert_eq!(metric_names(&memory), vec!["memory"]);
        assert_eq!(metric_names(&both), vec!["cpu", "memory"]);
    }
}
