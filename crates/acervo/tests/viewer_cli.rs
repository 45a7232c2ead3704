use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn acervo(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_acervo"))
        .env("ACERVO_CONFIG_DIR", config_dir)
        .env_remove("ACERVO_CONFIG")
        .env_remove("ACERVO_BASE_URL")
        .env_remove("ACERVO_COLLECTION")
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run acervo")
}

#[test]
fn viewer_preference_persists_between_runs() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join("config");

    let output = acervo(&config_dir, &["viewer", "status"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "viewer: shown");

    let output = acervo(&config_dir, &["viewer", "hide"]);
    assert!(output.status.success());
    let state = fs::read_to_string(config_dir.join("state.toml")).unwrap();
    assert!(state.contains("viewer_visible = false"));

    let output = acervo(&config_dir, &["viewer", "toggle", "--json"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        r#"{"viewerVisible":true}"#
    );
}

#[test]
fn unwritable_state_location_still_succeeds() {
    let root = TempDir::new().unwrap();
    let blocker = root.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();

    let output = acervo(&blocker, &["viewer", "hide"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "viewer: hidden");
}

#[test]
fn viewer_config_reflects_config_file() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        r#"
version = 1

[viewer]
build_path = "/static/unity"
product_name = "Acervo 3D"
"#,
    )
    .unwrap();

    let output = acervo(&config_dir, &["viewer", "config"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["loaderUrl"], "/static/unity/buildteste.loader.js");
    assert_eq!(value["config"]["codeUrl"], "/static/unity/buildteste.wasm");
    assert_eq!(value["config"]["productName"], "Acervo 3D");
    assert_eq!(value["target"]["canvasId"], "unity-canvas");
}

#[test]
fn viewer_check_reports_missing_artifacts() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join("config");
    let build = root.path().join("Build");
    fs::create_dir_all(&build).unwrap();
    for suffix in ["loader.js", "data", "framework.js"] {
        fs::write(build.join(format!("buildteste.{suffix}")), b"stub").unwrap();
    }

    let build_arg = build.to_string_lossy().to_string();
    let output = acervo(&config_dir, &["viewer", "check", &build_arg]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error loading viewer"));

    fs::write(build.join("buildteste.wasm"), b"\0asm").unwrap();
    let output = acervo(&config_dir, &["viewer", "check", &build_arg]);
    assert!(output.status.success());
}

#[test]
fn unreachable_catalog_renders_an_error_page() {
    let root = TempDir::new().unwrap();
    let output = acervo(
        root.path(),
        &[
            "page",
            "2",
            "--base-url",
            "http://127.0.0.1:9/wp-json/tainacan/v2",
            "--timeout",
            "2s",
        ],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Error:"), "{stdout}");
    assert!(stdout.contains("Page 2 of"), "{stdout}");
}
