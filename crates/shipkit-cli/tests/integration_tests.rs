//! Integration tests for CLI commands

use std::process::Command;

use tempfile::TempDir;

/// Helper to run shipkit command
fn shipkit(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_shipkit"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute shipkit")
}

/// Get the fixtures path
fn fixtures_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures")
}

fn license_path() -> String {
    format!("{}/license.yaml", fixtures_path())
}

fn release_path() -> String {
    format!("{}/sample-release", fixtures_path())
}

mod pull_command {
    use super::*;

    #[test]
    fn test_pull_local_release() {
        let temp = TempDir::new().unwrap();
        let output_dir = temp.path().join("sentry");

        let output = shipkit(&[
            "pull",
            "replicated://sentry/stable",
            "--license",
            &license_path(),
            "--local-path",
            &release_path(),
            "--output",
            output_dir.to_str().unwrap(),
        ]);

        assert!(
            output.status.success(),
            "pull failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("sentry"));

        // Common prefix stripped
        assert!(output_dir.join("app.yaml").is_file());
        assert!(output_dir.join("deployment.yaml").is_file());
        assert!(!output_dir.join("sentry-1.0.0").exists());

        let values = std::fs::read_to_string(output_dir.join("userdata/config.yaml")).unwrap();
        assert!(values.contains("kind: ConfigValues"));
        assert!(values.contains("db_host: postgres.internal"));
        assert!(values.contains("volume_size: 10GB"));

        let license = std::fs::read_to_string(output_dir.join("userdata/license.yaml")).unwrap();
        assert!(license.contains("1vusOokxAVp1tkRGuyxnF23PJcq"));
    }

    #[test]
    fn test_pull_without_license() {
        let output = shipkit(&["pull", "replicated://sentry"]);

        assert_eq!(output.status.code(), Some(2));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("license"));
    }

    #[test]
    fn test_pull_invalid_uri() {
        let output = shipkit(&[
            "pull",
            "helm://charts.example.com/nginx",
            "--license",
            &license_path(),
        ]);

        assert_eq!(output.status.code(), Some(2));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("unsupported scheme"));
    }

    #[test]
    fn test_pull_missing_license_file() {
        let output = shipkit(&[
            "pull",
            "replicated://sentry",
            "--license",
            "/nonexistent/license.yaml",
        ]);

        assert_eq!(output.status.code(), Some(2));
    }
}

mod can_pull_command {
    use super::*;

    #[test]
    fn test_other_scheme_needs_no_license() {
        let output = shipkit(&["can-pull", "helm://charts.example.com/nginx"]);
        assert!(output.status.success());
    }

    #[test]
    fn test_distribution_scheme_without_license() {
        let output = shipkit(&["can-pull", "replicated://sentry"]);

        assert_eq!(output.status.code(), Some(10));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("needs a license"));
    }

    #[test]
    fn test_distribution_scheme_with_license() {
        let output = shipkit(&["can-pull", "replicated://sentry", "--license", &license_path()]);
        assert!(output.status.success());
    }

    #[test]
    fn test_unreadable_license_is_input_error() {
        let output = shipkit(&["can-pull", "replicated://sentry", "--license", "/nonexistent/license.yaml"]);

        assert_eq!(output.status.code(), Some(2));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("cannot load license"));
    }
}

mod images_command {
    use super::*;

    #[test]
    fn test_images_requires_input() {
        let output = shipkit(&["images"]);

        assert_eq!(output.status.code(), Some(2));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("no images given"));
    }
}

mod metadata_command {
    use super::*;

    #[test]
    fn test_metadata_for_other_scheme() {
        let output = shipkit(&["metadata", "helm://charts.example.com/nginx"]);
        assert_eq!(output.status.code(), Some(2));
    }
}

#[test]
fn test_help_lists_commands() {
    let output = shipkit(&["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["pull", "images", "metadata", "can-pull"] {
        assert!(stdout.contains(command), "missing {}", command);
    }
}
