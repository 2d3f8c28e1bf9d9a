//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway config directory and
//! verify outputs.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(config_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_breathe"))
        .env("BREATHE_CONFIG_DIR", config_dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_patterns_json_lists_all_exercises() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, stderr, code) = run_cli(dir.path(), &["patterns", "--json"]);
    assert_eq!(code, 0, "patterns failed: {stderr}");

    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let patterns = parsed.as_array().unwrap();
    assert_eq!(patterns.len(), 3);
    assert_eq!(patterns[0]["exercise"], "box");
    assert_eq!(patterns[0]["phases"].as_array().unwrap().len(), 4);
    assert_eq!(patterns[1]["exercise"], "4-7-8");
    assert_eq!(patterns[1]["cycle_secs"], 19.0);
}

#[test]
fn test_config_get_default() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "session.cycle_target"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "4");
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_config_set_persists() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "set", "box_breathing.side_secs", "6"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");

    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "box_breathing.side_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "6");
}

#[test]
fn test_config_set_out_of_range_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "box_breathing.side_secs", "40"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("side_secs"), "unexpected stderr: {stderr}");
}

#[test]
fn test_config_get_unknown_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "session.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown config key"));
}

#[test]
fn test_run_rejects_zero_cycles() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["run", "box", "--cycles", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("cycle target"), "unexpected stderr: {stderr}");
}

#[test]
fn test_run_rejects_unknown_exercise() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["run", "square"]);
    assert_ne!(code, 0);
}

#[test]
fn test_run_short_custom_session_json() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, stderr, code) = run_cli(
        dir.path(),
        &[
            "run", "custom", "--inhale", "1", "--hold", "1", "--exhale", "1", "--cycles", "1",
            "--mute", "--json",
        ],
    );
    assert_eq!(code, 0, "run failed: {stderr}");

    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let summary = lines.last().unwrap();
    assert_eq!(summary["completed_cycles"], 1);
    assert_eq!(summary["total_elapsed_secs"], 3);

    let phases: Vec<_> = lines
        .iter()
        .filter(|l| l["type"] == "PhaseEntered")
        .map(|l| l["phase"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(phases, vec!["Inhale", "Hold", "Exhale"]);
    assert!(lines.iter().any(|l| l["type"] == "SessionFinished" && l["reason"] == "target_reached"));
}
