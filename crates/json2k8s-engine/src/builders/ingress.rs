//! Path and sub-domain ingresses
//!
//! The path ingress routes `<env>.<domain>/<app>/...` to the service and
//! rewrites the prefix away. The sub-domain ingress routes
//! `<app>.<env>.<domain>` (plus `<app>.<domain>` in prod). Both share one TLS
//! secret and one TLS host list.

use std::collections::BTreeMap;

use json2k8s_core::{Environment, defaults, naming};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, IngressTLS, ServiceBackendPort,
};

use crate::context::BuildContext;

/// Which of the two ingresses to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngressVariant {
    Path,
    Subdomain,
}

fn base_host(ctx: &BuildContext<'_>) -> String {
    format!("{}.{}", ctx.env, ctx.ingress_domain)
}

fn subdomain_hosts(ctx: &BuildContext<'_>) -> Vec<String> {
    let mut hosts = vec![format!("{}.{}.{}", ctx.app_name, ctx.env, ctx.ingress_domain)];
    if ctx.env == Environment::Prod {
        hosts.push(format!("{}.{}", ctx.app_name, ctx.ingress_domain));
    }
    hosts
}

/// TLS hosts: sub-domain hosts before the base host when sub-domains exist
pub fn tls_hosts(ctx: &BuildContext<'_>, sub_domain_created: bool) -> Vec<String> {
    let mut hosts = if sub_domain_created {
        subdomain_hosts(ctx)
    } else {
        Vec::new()
    };
    hosts.push(base_host(ctx));
    hosts
}

fn rule(host: String, path: String, path_type: &str, backend: &IngressBackend) -> IngressRule {
    IngressRule {
        host: Some(host),
        http: Some(HTTPIngressRuleValue {
            paths: vec![HTTPIngressPath {
                path: Some(path),
                path_type: path_type.to_string(),
                backend: backend.clone(),
            }],
        }),
    }
}

pub fn build_ingress(
    ctx: &BuildContext<'_>,
    variant: IngressVariant,
    sub_domain_created: bool,
    service_port: i32,
) -> Ingress {
    let backend = IngressBackend {
        service: Some(IngressServiceBackend {
            name: ctx.app_name.to_string(),
            port: Some(ServiceBackendPort {
                number: Some(service_port),
                name: None,
            }),
        }),
        resource: None,
    };

    let mut annotations = BTreeMap::new();
    for (key, value) in [
        defaults::INGRESS_CLASS_ANNOTATION,
        defaults::CLUSTER_ISSUER_ANNOTATION,
    ] {
        annotations.insert(key.to_string(), value.to_string());
    }

    let (name, rules) = match variant {
        IngressVariant::Path => {
            let (key, value) = defaults::REWRITE_TARGET_ANNOTATION;
            annotations.insert(key.to_string(), value.to_string());
            let path = format!("/{}(/|$)(.*)", ctx.app_name);
            (
                naming::path_ingress_name(ctx.app_name),
                vec![rule(base_host(ctx), path, "ImplementationSpecific", &backend)],
            )
        }
        IngressVariant::Subdomain => (
            naming::subdomain_ingress_name(ctx.app_name),
            subdomain_hosts(ctx)
                .into_iter()
                .map(|host| rule(host, "/".to_string(), "Prefix", &backend))
                .collect(),
        ),
    };

    let mut metadata = ctx.object_meta(name);
    metadata.annotations = Some(annotations);

    Ingress {
        metadata,
        spec: Some(IngressSpec {
            tls: Some(vec![IngressTLS {
                hosts: Some(tls_hosts(ctx, sub_domain_created)),
                secret_name: Some(naming::tls_secret_name(ctx.app_name)),
            }]),
            rules: Some(rules),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support;
    use json2k8s_core::SecretMap;

    #[test]
    fn test_prod_tls_hosts_with_subdomain() {
        let secrets = SecretMap::new();
        let ctx = BuildContext {
            app_name: "foo",
            ..test_support::context(&secrets, Environment::Prod)
        };

        assert_eq!(
            tls_hosts(&ctx, true),
            vec!["foo.prod.mrgn.app", "foo.mrgn.app", "prod.mrgn.app"]
        );
        assert_eq!(tls_hosts(&ctx, false), vec!["prod.mrgn.app"]);
    }

    #[test]
    fn test_stage_tls_hosts() {
        let secrets = SecretMap::new();
        let ctx = test_support::context(&secrets, Environment::Stage);
        assert_eq!(tls_hosts(&ctx, true), vec!["web.stage.mrgn.app", "stage.mrgn.app"]);
    }

    #[test]
    fn test_path_ingress() {
        let secrets = SecretMap::new();
        let ctx = test_support::context(&secrets, Environment::Stage);

        let ingress = build_ingress(&ctx, IngressVariant::Path, false, 8080);
        assert_eq!(ingress.metadata.name.as_deref(), Some("web-path-ingress"));

        let annotations = ingress.metadata.annotations.unwrap();
        assert_eq!(annotations["kubernetes.io/ingress.class"], "nginx");
        assert_eq!(annotations["cert-manager.io/cluster-issuer"], "letsencrypt-prod");
        assert_eq!(annotations["nginx.ingress.kubernetes.io/rewrite-target"], "/$2");

        let spec = ingress.spec.unwrap();
        let rules = spec.rules.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].host.as_deref(), Some("stage.mrgn.app"));
        let path = &rules[0].http.as_ref().unwrap().paths[0];
        assert_eq!(path.path.as_deref(), Some("/web(/|$)(.*)"));
        assert_eq!(path.path_type, "ImplementationSpecific");
        let service = path.backend.service.as_ref().unwrap();
        assert_eq!(service.name, "web");
        assert_eq!(service.port.as_ref().unwrap().number, Some(8080));

        let tls = spec.tls.unwrap();
        assert_eq!(tls[0].secret_name.as_deref(), Some("web-tls"));
    }

    #[test]
    fn test_subdomain_ingress_prod_rules() {
        let secrets = SecretMap::new();
        let ctx = test_support::context(&secrets, Environment::Prod);

        let ingress = build_ingress(&ctx, IngressVariant::Subdomain, true, 80);
        assert_eq!(ingress.metadata.name.as_deref(), Some("web-subdomain-ingress"));
        assert!(
            !ingress
                .metadata
                .annotations
                .unwrap()
                .contains_key("nginx.ingress.kubernetes.io/rewrite-target")
        );

        let rules = ingress.spec.unwrap().rules.unwrap();
        let hosts: Vec<_> = rules.iter().filter_map(|r| r.host.as_deref()).collect();
        assert_eq!(hosts, vec!["web.prod.mrgn.app", "web.mrgn.app"]);
        let path = &rules[0].http.as_ref().unwrap().paths[0];
        assert_eq!(path.path.as_deref(), Some("/"));
        assert_eq!(path.path_type, "Prefix");
    }
}
