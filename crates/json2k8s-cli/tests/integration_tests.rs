//! Integration tests for CLI commands

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Helper to run json2k8s command
fn json2k8s(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_json2k8s"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("JSON2K8S_OUT")
        .env_remove("JSON2K8S_SECRETS_DIR")
        .env_remove("JSON2K8S_SECRET_SOURCE")
        .env_remove("JSON2K8S_INGRESS_DOMAIN")
        .output()
        .expect("Failed to execute json2k8s")
}

/// Get the fixtures path
fn fixtures_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures")
}

fn config_dir() -> String {
    fixtures_path().join("config").display().to_string()
}

fn secrets_dir() -> String {
    fixtures_path().join("secrets").display().to_string()
}

/// Copy the fixture descriptors into a scratch directory
fn scratch_config() -> TempDir {
    let dir = TempDir::new().unwrap();
    for entry in fs::read_dir(fixtures_path().join("config")).unwrap() {
        let entry = entry.unwrap();
        fs::copy(entry.path(), dir.path().join(entry.file_name())).unwrap();
    }
    dir
}

fn relative_files(root: &Path) -> Vec<String> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                files.push(path.strip_prefix(root).unwrap().display().to_string());
            }
        }
    }
    files.sort();
    files
}

mod build_command {
    use super::*;

    fn build(config: &str, out: &Path, extra: &[&str]) -> std::process::Output {
        let out = out.display().to_string();
        let mut args = vec!["build", config, "--out", &out, "--secret-source", "plain"];
        args.extend_from_slice(extra);
        json2k8s(&args)
    }

    #[test]
    fn test_build_writes_layout() {
        let out = TempDir::new().unwrap();
        let secrets = secrets_dir();
        let output = build(&config_dir(), out.path(), &["--secrets-dir", &secrets]);

        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        assert_eq!(
            relative_files(out.path()),
            vec![
                "report/prod/report.cronjob.yaml",
                "report/prod/report.secret.yaml",
                "web/prod/api-cache.pvc.yaml",
                "web/prod/api.deployment.yaml",
                "web/prod/api.secret.yaml",
                "web/prod/cname.ingress.yaml",
                "web/prod/path.ingress.yaml",
                "web/prod/service.yaml",
                "web/stage/api.deployment.yaml",
                "web/stage/api.hpa.yaml",
                "web/stage/api.secret.yaml",
                "web/stage/path.ingress.yaml",
                "web/stage/service.yaml",
            ]
        );

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("wrote"));
        assert!(stdout.contains("Generated 13 manifest(s)"));
    }

    #[test]
    fn test_build_secret_values_are_base64() {
        let out = TempDir::new().unwrap();
        let secrets = secrets_dir();
        let output = build(&config_dir(), out.path(), &["--secrets-dir", &secrets]);
        assert!(output.status.success());

        let content = fs::read_to_string(out.path().join("web/stage/api.secret.yaml")).unwrap();
        let secret: serde_yaml::Value = serde_yaml::from_str(&content).unwrap();
        assert_eq!(secret["kind"], serde_yaml::Value::from("Secret"));
        assert_eq!(secret["type"], serde_yaml::Value::from("Opaque"));
        // base64("postgres://stage-db/web")
        assert_eq!(
            secret["data"]["DATABASE_URL"],
            serde_yaml::Value::from("cG9zdGdyZXM6Ly9zdGFnZS1kYi93ZWI=")
        );
        assert!(secret["data"]["cert-file-secrets"].is_string());
    }

    #[test]
    fn test_build_ingress_domain_flag() {
        let out = TempDir::new().unwrap();
        let secrets = secrets_dir();
        let output = build(
            &config_dir(),
            out.path(),
            &["--secrets-dir", &secrets, "--ingress-domain", "example.test"],
        );
        assert!(output.status.success());

        let content = fs::read_to_string(out.path().join("web/stage/path.ingress.yaml")).unwrap();
        assert!(content.contains("stage.example.test"));
        assert!(!content.contains("mrgn.app"));

        let content = fs::read_to_string(out.path().join("web/prod/cname.ingress.yaml")).unwrap();
        assert!(content.contains("web.prod.example.test"));
        assert!(content.contains("web.example.test"));
    }

    #[test]
    fn test_build_single_app() {
        let out = TempDir::new().unwrap();
        let secrets = secrets_dir();
        let output = build(
            &config_dir(),
            out.path(),
            &["--secrets-dir", &secrets, "--app", "report"],
        );

        assert!(output.status.success());
        assert_eq!(
            relative_files(out.path()),
            vec!["report/prod/report.cronjob.yaml", "report/prod/report.secret.yaml"]
        );
    }

    #[test]
    fn test_missing_secret_writes_nothing() {
        let out = TempDir::new().unwrap();
        fs::create_dir_all(out.path().join("stale")).unwrap();
        fs::write(out.path().join("stale/old.yaml"), "kind: Old").unwrap();

        // No secrets directory: every referenced secret is missing
        let output = build(&config_dir(), out.path(), &[]);

        assert_eq!(output.status.code(), Some(3));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("db"));
        assert!(out.path().is_dir());
        assert!(relative_files(out.path()).is_empty());
    }

    #[test]
    fn test_invalid_descriptor_exit_code() {
        let config = scratch_config();
        fs::write(
            config.path().join("broken.json"),
            r#"{ "name": "broken", "type": "deployment" }"#,
        )
        .unwrap();
        let out = TempDir::new().unwrap();

        let output = build(&config.path().display().to_string(), out.path(), &[]);

        assert_eq!(output.status.code(), Some(2));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("broken.json"));
        assert!(stdout.contains("team"));
        assert!(relative_files(out.path()).is_empty());
    }

    #[test]
    fn test_duplicate_replica_group() {
        let config = TempDir::new().unwrap();
        let mut web: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(fixtures_path().join("config/web.json")).unwrap(),
        )
        .unwrap();
        let group = web["prod"]["replicaGroups"][0].clone();
        web["prod"]["replicaGroups"]
            .as_array_mut()
            .unwrap()
            .push(group);
        fs::write(config.path().join("web.json"), web.to_string()).unwrap();
        let out = TempDir::new().unwrap();
        let secrets = secrets_dir();

        let output = build(
            &config.path().display().to_string(),
            out.path(),
            &["--secrets-dir", &secrets],
        );

        assert_eq!(output.status.code(), Some(3));
        assert!(String::from_utf8_lossy(&output.stderr).contains("duplicate replica group"));
        assert!(relative_files(out.path()).is_empty());
    }

    #[test]
    fn test_missing_config_dir() {
        let out = TempDir::new().unwrap();
        let output = build("/nonexistent/json2k8s-config", out.path(), &[]);

        assert_eq!(output.status.code(), Some(64));
        assert!(String::from_utf8_lossy(&output.stderr).contains("Config directory not found"));
    }

    #[test]
    fn test_missing_secrets_dir() {
        let out = TempDir::new().unwrap();
        let output = build(
            &config_dir(),
            out.path(),
            &["--secrets-dir", "/nonexistent/json2k8s-secrets"],
        );

        assert_eq!(output.status.code(), Some(64));
        assert!(String::from_utf8_lossy(&output.stderr).contains("Secrets directory not found"));
    }

    #[test]
    fn test_unknown_app() {
        let out = TempDir::new().unwrap();
        let output = build(&config_dir(), out.path(), &["--app", "nope"]);

        assert_eq!(output.status.code(), Some(64));
        assert!(String::from_utf8_lossy(&output.stderr).contains("nope.json"));
    }
}

mod validate_command {
    use super::*;

    #[test]
    fn test_validate_fixtures() {
        let output = json2k8s(&["validate", &config_dir()]);

        assert!(output.status.success(), "Expected success for valid descriptors");
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("web.json"));
        assert!(stdout.contains("2 descriptor(s) valid"));
    }

    #[test]
    fn test_validate_json_output() {
        let output = json2k8s(&["validate", &config_dir(), "--json"]);

        let stdout = String::from_utf8_lossy(&output.stdout);
        let json: serde_json::Value =
            serde_json::from_str(&stdout).expect("Output should be valid JSON");

        assert_eq!(json["valid"], true);
        assert_eq!(json["descriptors"].as_array().unwrap().len(), 2);
        assert_eq!(json["descriptors"][0]["file"], "report.json");
        assert_eq!(json["descriptors"][0]["kind"], "cronjob");
    }

    #[test]
    fn test_validate_json_output_with_errors() {
        let config = scratch_config();
        fs::write(
            config.path().join("broken.json"),
            r#"{ "name": "broken", "type": "deployment", "team": "x", "stage": { "replicaGroups": [] } }"#,
        )
        .unwrap();

        let output = json2k8s(&["validate", &config.path().display().to_string(), "--json"]);

        assert_eq!(output.status.code(), Some(2));
        let stdout = String::from_utf8_lossy(&output.stdout);
        let json: serde_json::Value =
            serde_json::from_str(&stdout).expect("Output should be valid JSON");

        assert_eq!(json["valid"], false);
        let broken = &json["descriptors"][0];
        assert_eq!(broken["file"], "broken.json");
        assert_eq!(broken["valid"], false);
        assert!(!broken["errors"].as_array().unwrap().is_empty());
        assert_eq!(json["descriptors"][1]["valid"], true);
    }

    #[test]
    fn test_validate_malformed_json() {
        let config = TempDir::new().unwrap();
        fs::write(config.path().join("bad.json"), "{ not json").unwrap();

        let output = json2k8s(&["validate", &config.path().display().to_string()]);

        assert_eq!(output.status.code(), Some(2));
        assert!(String::from_utf8_lossy(&output.stdout).contains("bad.json"));
    }

    #[test]
    fn test_validate_name_mismatch_warns() {
        let config = TempDir::new().unwrap();
        fs::copy(
            fixtures_path().join("config/report.json"),
            config.path().join("nightly.json"),
        )
        .unwrap();

        let output = json2k8s(&["validate", &config.path().display().to_string()]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("differs from its file name"));
    }
}
