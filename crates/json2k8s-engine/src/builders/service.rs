//! Services

use json2k8s_core::defaults;
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use crate::builders::deployment::group_selector;
use crate::context::BuildContext;

/// ClusterIP service named after the app, selecting the pods of
/// `selected_group` and exposing every port
pub fn build_service(ctx: &BuildContext<'_>, selected_group: &str, ports: &[i32]) -> Service {
    let ports = ports
        .iter()
        .map(|port| ServicePort {
            name: Some(port.to_string()),
            port: *port,
            target_port: Some(IntOrString::Int(*port)),
            ..Default::default()
        })
        .collect();

    Service {
        metadata: ctx.object_meta(ctx.app_name),
        spec: Some(ServiceSpec {
            type_: Some(defaults::SERVICE_TYPE.to_string()),
            selector: Some(group_selector(ctx, selected_group)),
            ports: Some(ports),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support;
    use json2k8s_core::{Environment, SecretMap};

    #[test]
    fn test_service_ports_and_selector() {
        let secrets = SecretMap::new();
        let ctx = test_support::context(&secrets, Environment::Prod);

        let service = build_service(&ctx, "api", &[8080, 9090]);
        assert_eq!(service.metadata.name.as_deref(), Some("web"));

        let spec = service.spec.unwrap();
        assert_eq!(spec.type_.as_deref(), Some("ClusterIP"));

        let selector = spec.selector.unwrap();
        assert_eq!(selector["app"], "web");
        assert_eq!(selector["replicaGroup"], "api");

        let ports = spec.ports.unwrap();
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0].name.as_deref(), Some("8080"));
        assert_eq!(ports[0].port, 8080);
        assert_eq!(ports[1].target_port, Some(IntOrString::Int(9090)));
    }
}
