use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::{TempDir, tempdir};

fn blueprint() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_blueprint"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn workspace() -> TempDir {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("user.toml"),
        r#"
keep = ["id"]
include = ["profile.toml"]

[[fields]]
name = "display"
source = "name"
transform = "uppercase"

[[fields]]
name = "locale"
transform = "option"
"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("profile.toml"),
        r#"
keep = ["email"]

[[joins]]
name = "team"
key = "team_id"
dir = "teams"
"#,
    )
    .unwrap();
    fs::create_dir(dir.path().join("teams")).unwrap();
    fs::write(dir.path().join("teams/core.json"), r#"{ "title": "Core" }"#).unwrap();
    dir
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

fn write_input(dir: &Path, value: &Value) -> std::path::PathBuf {
    let path = dir.join("input.json");
    fs::write(&path, value.to_string()).unwrap();
    path
}

#[test]
fn test_render_object() {
    let dir = workspace();
    let input = write_input(
        dir.path(),
        &json!({ "id": 1, "name": "ada", "email": "a@x", "team_id": "core", "secret": "s" }),
    );

    let output = blueprint()
        .arg("render")
        .arg("--view")
        .arg(dir.path().join("user.toml"))
        .arg("--input")
        .arg(&input)
        .args(["--option", "locale=\"uk\""])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        stdout_json(&output),
        json!({
            "id": 1,
            "email": "a@x",
            "display": "ADA",
            "locale": "uk",
            "team": { "title": "Core" }
        })
    );
}

#[test]
fn test_render_array_from_stdin() {
    let dir = workspace();
    let input = json!([
        { "id": 1, "name": "a", "team_id": "core" },
        { "id": 2, "name": "b", "team_id": "missing" }
    ]);

    let output = assert_cmd::Command::new(env!("CARGO_BIN_EXE_blueprint"))
        .arg("render")
        .arg("--view")
        .arg(dir.path().join("user.toml"))
        .write_stdin(input.to_string())
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        stdout_json(&output),
        json!([
            { "id": 1, "display": "A", "locale": null, "team": { "title": "Core" } },
            { "id": 2, "display": "B", "locale": null, "team": null }
        ])
    );
}

#[test]
fn test_render_failure_exits_non_zero() {
    let dir = workspace();
    let input = write_input(dir.path(), &json!({ "id": 1, "name": 42 }));

    blueprint()
        .arg("render")
        .arg("--view")
        .arg(dir.path().join("user.toml"))
        .arg("--input")
        .arg(&input)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("expects a string source"));
}

#[test]
fn test_env_override_replaces_keep() {
    let dir = workspace();
    let input = write_input(dir.path(), &json!({ "id": 1, "name": "a", "secret": "s" }));

    let output = blueprint()
        .env("BLUEPRINT__KEEP", "id,secret")
        .arg("render")
        .arg("--view")
        .arg(dir.path().join("user.toml"))
        .arg("--input")
        .arg(&input)
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_json(&output)["secret"], json!("s"));
}

#[test]
fn test_inspect_prints_summary() {
    let dir = workspace();

    let output = blueprint()
        .arg("inspect")
        .arg("--view")
        .arg(dir.path().join("user.toml"))
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        stdout_json(&output),
        json!({
            "name": "user",
            "keep": ["id", "email"],
            "rules": 2,
            "async_rules": 1,
            "is_async": true
        })
    );
}

#[test]
fn test_include_cycle_is_reported() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.toml"), "include = [\"a.toml\"]").unwrap();

    blueprint()
        .arg("inspect")
        .arg("--view")
        .arg(dir.path().join("a.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Include cycle"));
}

#[test]
fn test_file_logging_writes_log_file() {
    let dir = workspace();
    let logs = dir.path().join("logs");

    blueprint()
        .arg("inspect")
        .arg("--view")
        .arg(dir.path().join("user.toml"))
        .arg("--verbose")
        .arg("--log-dir")
        .arg(&logs)
        .arg("--json-logs")
        .assert()
        .success();

    let has_log = fs::read_dir(&logs)
        .unwrap()
        .flatten()
        .any(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some("log"));
    assert!(has_log, "a log file should be created");
}
