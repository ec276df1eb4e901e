use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use serde_json::{json, Value};

fn gatehook(args: &[&str], project: &Path, stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_gatehook"))
        .args(args)
        .env("CLAUDE_PROJECT_DIR", project)
        .env_remove("GATEHOOK_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_gatehook_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_gatehook"))
        .arg("--version")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0.1.0"));
}

#[test]
fn test_gatehook_help_lists_events() {
    let output = Command::new(env!("CARGO_BIN_EXE_gatehook"))
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("pre-tool-use"));
    assert!(stdout.contains("teammate-idle"));
}

#[test]
fn test_dangerous_command_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let input = json!({
        "session_id": "abc",
        "hook_event_name": "PreToolUse",
        "tool_name": "Bash",
        "tool_input": {"command": "rm -rf /"}
    });
    let output = gatehook(&["pre-tool-use"], dir.path(), &input.to_string());

    assert_eq!(output.status.code(), Some(2));
    let out = stdout_json(&output);
    assert_eq!(out["hookSpecificOutput"]["permissionDecision"], "deny");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("dangerous command pattern"));
}

#[test]
fn test_stop_emits_empty_object() {
    let dir = tempfile::tempdir().unwrap();
    let output = gatehook(&["stop"], dir.path(), r#"{"hook_event_name":"Stop"}"#);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_json(&output), json!({}));
}

#[test]
fn test_session_start_continues() {
    let dir = tempfile::tempdir().unwrap();
    let output = gatehook(&["session-start"], dir.path(), r#"{"session_id":"s"}"#);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_json(&output)["continue"], true);
}

#[test]
fn test_malformed_input_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let output = gatehook(&["pre-tool-use"], dir.path(), "{not json");

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_project_config_disables_security() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join(".gatehook")).unwrap();
    std::fs::write(
        dir.path().join(".gatehook/config.toml"),
        "[security]\nenabled = false\n",
    )
    .unwrap();

    let input = json!({"tool_name": "Bash", "tool_input": {"command": "rm -rf /"}});
    let output = gatehook(&["pre-tool-use"], dir.path(), &input.to_string());

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_json(&output)["hookSpecificOutput"]["permissionDecision"], "allow");
}

#[test]
fn test_teammate_idle_blocked_by_quality_gate() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join(".gatehook/state");
    std::fs::create_dir_all(&state).unwrap();
    std::fs::write(
        dir.path().join(".gatehook/quality.toml"),
        "[quality_gate]\nmax_errors = 0\n",
    )
    .unwrap();
    std::fs::write(
        state.join("diagnostics-baseline.json"),
        r#"{"files": {"src/lib.rs": {"errors": 2, "warnings": 1}}}"#,
    )
    .unwrap();

    let input = json!({
        "hook_event_name": "TeammateIdle",
        "team_name": "core",
        "teammate_name": "backend"
    });
    let output = gatehook(&["teammate-idle"], dir.path(), &input.to_string());

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stdout_json(&output), json!({}));
    assert!(!output.stderr.is_empty());
}

#[test]
fn test_tools_subcommand() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_gatehook"))
        .args(["tools", "src/main.go"])
        .env("CLAUDE_PROJECT_DIR", dir.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("src/main.go: go"));
    assert!(stdout.contains("gofumpt"));
}
