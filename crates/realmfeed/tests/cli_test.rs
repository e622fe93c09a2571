//! Integration tests for the `realmfeed` CLI binary.
//!
//! These tests cover argument parsing, configuration commands, and `watch`
//! against the synthetic feed and an unreachable endpoint. None of them
//! need a live feed server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `realmfeed` binary with env isolation.
///
/// Clears all `REALMFEED_*` env vars and points config directories at
/// `home` so tests never touch the user's real configuration.
fn realmfeed_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("realmfeed");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("REALMFEED_CONFIG")
        .env_remove("REALMFEED_ENDPOINT")
        .env_remove("REALMFEED_MAX_RETRIES")
        .env_remove("REALMFEED_ATTEMPT_TIMEOUT_MS")
        .env_remove("REALMFEED_SEED");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn json_lines(output: &std::process::Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = realmfeed_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    realmfeed_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("watch")
                .and(predicate::str::contains("config"))
                .and(predicate::str::contains("completions")),
        );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    realmfeed_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("realmfeed"));
}

#[test]
fn test_invalid_subcommand() {
    let home = tempfile::tempdir().unwrap();
    let output = realmfeed_cmd(home.path()).arg("foobar").output().unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("foobar"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    realmfeed_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let home = tempfile::tempdir().unwrap();
    realmfeed_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_flag() {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().join("custom.toml");
    realmfeed_cmd(home.path())
        .args(["config", "path", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_show_without_file_uses_defaults() {
    let home = tempfile::tempdir().unwrap();
    realmfeed_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("max_retries")
                .and(predicate::str::contains("ws://127.0.0.1:9001/feed")),
        );
}

#[test]
fn test_config_show_applies_environment() {
    let home = tempfile::tempdir().unwrap();
    realmfeed_cmd(home.path())
        .env("REALMFEED_MAX_RETRIES", "7")
        .args(["config", "show", "--toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max_retries = 7"));
}

#[test]
fn test_config_init_refuses_to_overwrite() {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().join("realmfeed.toml");

    realmfeed_cmd(home.path())
        .args(["config", "init", "--config"])
        .arg(&path)
        .assert()
        .success();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("endpoint = "), "unexpected file:\n{written}");

    let output = realmfeed_cmd(home.path())
        .args(["config", "init", "--config"])
        .arg(&path)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("already exists"));

    realmfeed_cmd(home.path())
        .args(["config", "init", "--force", "--config"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn test_invalid_config_file_is_reported() {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().join("bad.toml");
    std::fs::write(&path, "population_floor = 500\n").unwrap();

    let output = realmfeed_cmd(home.path())
        .args(["config", "show", "--config"])
        .arg(&path)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("population_floor"));
}

// ── Watch ───────────────────────────────────────────────────────────

#[test]
fn test_watch_mock_emits_json_events() {
    let home = tempfile::tempdir().unwrap();
    let output = realmfeed_cmd(home.path())
        .args(["watch", "--mock", "--seed", "3", "--max-events", "5", "-o", "json"])
        .timeout(std::time::Duration::from_secs(30))
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let events = json_lines(&output);
    assert_eq!(events.len(), 5);
    assert_eq!(events[0]["kind"], "connection-changed");
    assert_eq!(events[0]["state"], "mock");
    assert_eq!(events[0]["usingMock"], true);
    assert!(events[1..].iter().all(|e| e["kind"] == "entity-upsert"));
}

#[test]
fn test_watch_falls_back_to_mock_when_unreachable() {
    let home = tempfile::tempdir().unwrap();
    let output = realmfeed_cmd(home.path())
        .args([
            "watch",
            "--endpoint",
            "ws://127.0.0.1:1/feed",
            "--max-retries",
            "1",
            "--attempt-timeout",
            "500ms",
            "--max-events",
            "3",
            "-o",
            "json",
        ])
        .timeout(std::time::Duration::from_secs(30))
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let states: Vec<String> = json_lines(&output)
        .iter()
        .map(|e| e["state"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(states, vec!["connecting", "closed", "mock"]);
}

#[test]
fn test_watch_rejects_http_endpoint() {
    let home = tempfile::tempdir().unwrap();
    let output = realmfeed_cmd(home.path())
        .args(["watch", "--endpoint", "http://127.0.0.1/feed", "--max-events", "1"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("endpoint"));
}

#[test]
fn test_watch_duration_with_summary() {
    let home = tempfile::tempdir().unwrap();
    realmfeed_cmd(home.path())
        .args(["watch", "--mock", "--duration", "400ms", "--summary", "-o", "json"])
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("Realm").and(predicate::str::contains("mock-1")));
}
