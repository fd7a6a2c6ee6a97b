//! Resource name derivation
//!
//! Generated objects reference each other by name (containers point at secret
//! keys, volumes point at claims, the HPA points at its deployment). Every
//! builder derives those names through these functions and nowhere else.

/// Strip the last extension from a file name (`config.json` -> `config`)
pub fn trim_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) if idx + 1 < file_name.len() && !file_name[idx..].contains('/') => {
            &file_name[..idx]
        }
        _ => file_name,
    }
}

/// Name of the Secret object owned by a deployment group or cronjob
pub fn secret_manifest_name(resource: &str) -> String {
    format!("{}-secrets", resource)
}

/// Secret data key holding a file-delivered secret
pub fn file_secret_key(file_name: &str) -> String {
    format!("{}-file-secrets", trim_extension(file_name))
}

/// Volume (and mount) name for a primary-container file secret
pub fn file_secret_volume(file_name: &str) -> String {
    file_secret_key(file_name)
}

/// Volume (and mount) name for a sidecar file secret
pub fn sidecar_file_secret_volume(file_name: &str) -> String {
    format!("{}-sidecar-file-secrets", trim_extension(file_name))
}

/// Whether a volume or mount name carries a file secret (primary or sidecar)
pub fn is_file_secret_volume(name: &str) -> bool {
    name.ends_with("-file-secrets")
}

/// Mount path for a file secret: `dir` joined with `file_name`
///
/// The result is normalized like a POSIX path join: empty and `.` segments
/// are dropped and `..` removes the preceding segment.
pub fn secret_mount_path(dir: &str, file_name: &str) -> String {
    if dir.is_empty() {
        normalize_path(file_name)
    } else {
        normalize_path(&format!("{}/{}", dir, file_name))
    }
}

fn normalize_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|s| *s != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Claim name for a persistent volume of a replica group
pub fn pvc_name(group: &str, volume: &str) -> String {
    format!("{}-{}", group, volume)
}

pub fn hpa_name(group: &str) -> String {
    format!("{}-hpa", group)
}

/// Default sidecar container name
pub fn sidecar_name(container: &str) -> String {
    format!("{}-sidecar", container)
}

pub fn tls_secret_name(app: &str) -> String {
    format!("{}-tls", app)
}

pub fn path_ingress_name(app: &str) -> String {
    format!("{}-path-ingress", app)
}

pub fn subdomain_ingress_name(app: &str) -> String {
    format!("{}-subdomain-ingress", app)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_extension() {
        assert_eq!(trim_extension("config.json"), "config");
        assert_eq!(trim_extension("archive.tar.gz"), "archive.tar");
        assert_eq!(trim_extension("noext"), "noext");
        assert_eq!(trim_extension("trailing."), "trailing.");
        assert_eq!(trim_extension(".env"), "");
    }

    #[test]
    fn test_file_secret_names_agree() {
        assert_eq!(file_secret_key("creds.json"), "creds-file-secrets");
        assert_eq!(file_secret_volume("creds.json"), file_secret_key("creds.json"));
        assert_eq!(
            sidecar_file_secret_volume("creds.json"),
            "creds-sidecar-file-secrets"
        );
    }

    #[test]
    fn test_file_secret_volume_detection() {
        assert!(is_file_secret_volume(&file_secret_volume("gcp.json")));
        assert!(is_file_secret_volume(&sidecar_file_secret_volume("gcp.json")));
        assert!(is_file_secret_volume(&file_secret_volume("envoy-sidecar.yaml")));
        assert!(!is_file_secret_volume("data"));
    }

    #[test]
    fn test_secret_mount_path() {
        assert_eq!(secret_mount_path("/etc/app", "creds.json"), "/etc/app/creds.json");
        assert_eq!(secret_mount_path("/etc/app/", "creds.json"), "/etc/app/creds.json");
        assert_eq!(secret_mount_path("/", "creds.json"), "/creds.json");
        assert_eq!(secret_mount_path("", "creds.json"), "creds.json");
    }

    #[test]
    fn test_secret_mount_path_normalized() {
        assert_eq!(secret_mount_path("/etc//app", "x"), "/etc/app/x");
        assert_eq!(secret_mount_path("/etc/./app/../gcp", "key.json"), "/etc/gcp/key.json");
        assert_eq!(secret_mount_path("/..", "x"), "/x");
        assert_eq!(secret_mount_path("conf/../..", "x"), "../x");
    }

    #[test]
    fn test_derived_names() {
        assert_eq!(secret_manifest_name("web"), "web-secrets");
        assert_eq!(pvc_name("web", "data"), "web-data");
        assert_eq!(hpa_name("web"), "web-hpa");
        assert_eq!(sidecar_name("web"), "web-sidecar");
        assert_eq!(tls_secret_name("web"), "web-tls");
        assert_eq!(path_ingress_name("web"), "web-path-ingress");
        assert_eq!(subdomain_ingress_name("web"), "web-subdomain-ingress");
    }
}
