//! Integration tests for the `fwpath` CLI binary.
//!
//! Runs the binary against the fixture snapshot in `tests/fixtures`: an
//! internal LAN behind FW-01 and a DMZ behind FW-02 that denies everything.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

const LAB: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/lab.json");
const REQUESTS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/requests.yaml");

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `fwpath` binary with env isolation.
///
/// Clears all `FWPATH_*` env vars and points the config file at `config`
/// so tests never touch the user's real configuration.
fn fwpath_cmd_with_config(config: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("fwpath");
    cmd.env("FWPATH_CONFIG", config)
        .env("NO_COLOR", "1")
        .env_remove("FWPATH_PROFILE")
        .env_remove("FWPATH_SNAPSHOT")
        .env_remove("FWPATH_OUTPUT")
        .env_remove("FWPATH_DEFAULT_PROFILE")
        .env_remove("RUST_LOG");
    cmd
}

fn fwpath_cmd() -> assert_cmd::Command {
    fwpath_cmd_with_config(Path::new("/tmp/fwpath-cli-test-nonexistent/config.toml"))
}

/// `fwpath --snapshot <lab> <args...>`
fn lab_cmd(args: &[&str]) -> assert_cmd::Command {
    let mut cmd = fwpath_cmd();
    cmd.args(["--snapshot", LAB]).args(args);
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = fwpath_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    fwpath_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("firewall policy")
            .and(predicate::str::contains("trace"))
            .and(predicate::str::contains("batch"))
            .and(predicate::str::contains("validate")),
    );
}

#[test]
fn test_completions_zsh() {
    fwpath_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Trace ───────────────────────────────────────────────────────────

#[test]
fn test_trace_allowed_to_external() {
    let output = lab_cmd(&[
        "trace", "--src", "192.168.1.10", "--dst", "8.8.8.8", "--port", "443", "-o", "json",
    ])
    .output()
    .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let json = stdout_json(&output);
    assert_eq!(json["allowed"], true);
    assert_eq!(json["src_zone"], "internal");
    assert_eq!(json["dst_zone"], "external");
    assert_eq!(json["nat_required"], true);
    assert_eq!(json["blocked_by"], Value::Null);
    assert_eq!(json["hops"][0]["firewall_id"], "FW-01");
    assert_eq!(json["hops"][0]["firewall_name"], "edge-01");
    assert_eq!(json["hops"][0]["matched_policy_id"], "1");
    assert_eq!(json["hops"][0]["action"], "accept");
}

#[test]
fn test_trace_second_hop_denies() {
    let output = lab_cmd(&[
        "trace", "-s", "192.168.1.10", "-d", "172.16.0.15", "-P", "443", "-o", "json",
    ])
    .output()
    .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["allowed"], false);
    assert_eq!(json["hops"].as_array().unwrap().len(), 2);
    assert_eq!(json["hops"][1]["action"], "deny");
    assert_eq!(json["blocked_by"]["firewall_id"], "FW-02");
    assert_eq!(json["blocked_by"]["policy_id"], "dmz-deny-all");
}

#[test]
fn test_trace_implicit_deny_with_fail_on_block() {
    let output = lab_cmd(&[
        "trace", "-s", "192.168.1.10", "-d", "8.8.8.8", "-P", "22", "--fail-on-block", "-o", "plain",
    ])
    .output()
    .unwrap();
    assert_eq!(output.status.code(), Some(10), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "blocked");
}

#[test]
fn test_trace_table_explains_verdict() {
    lab_cmd(&["trace", "-s", "192.168.1.10", "-d", "172.16.0.15", "-P", "443"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("BLOCKED")
                .and(predicate::str::contains("FW-02 (dmz-02)"))
                .and(predicate::str::contains("policy dmz-deny-all")),
        );
}

#[test]
fn test_trace_malformed_ip_is_usage_error() {
    let output = lab_cmd(&["trace", "-s", "192.168.1", "-d", "8.8.8.8", "-P", "443"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("source"));
}

#[test]
fn test_trace_save_writes_json() {
    let dir = tempfile::tempdir().unwrap();
    let saved = dir.path().join("out").join("trace.json");
    lab_cmd(&[
        "trace", "-s", "192.168.1.10", "-d", "8.8.8.8", "-P", "443", "-q", "--save",
        saved.to_str().unwrap(),
    ])
    .assert()
    .success()
    .stdout(predicate::str::is_empty());

    let json: Value = serde_json::from_str(&std::fs::read_to_string(&saved).unwrap()).unwrap();
    assert_eq!(json["allowed"], true);
}

#[test]
fn test_external_zone_override() {
    let output = lab_cmd(&[
        "--external-zone", "wan", "trace", "-s", "192.168.1.10", "-d", "8.8.8.8", "-P", "443",
        "-o", "json",
    ])
    .output()
    .unwrap();
    let json = stdout_json(&output);
    assert_eq!(json["dst_zone"], "wan");
    assert_eq!(json["nat_required"], true);
}

// ── Snapshot errors ─────────────────────────────────────────────────

#[test]
fn test_missing_snapshot_flag() {
    let output = fwpath_cmd()
        .args(["trace", "-s", "192.168.1.10", "-d", "8.8.8.8", "-P", "443"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("No snapshot file configured"));
}

#[test]
fn test_missing_snapshot_file() {
    let output = fwpath_cmd()
        .args(["--snapshot", "/tmp/fwpath-cli-test-nonexistent/lab.json", "zones"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_validate_reports_issues() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.json");
    std::fs::write(
        &broken,
        r#"{
            "address_objects": [
                {"name": "a", "type": "group", "members": ["b"]},
                {"name": "b", "type": "group", "members": ["a"]}
            ],
            "zones": [{"name": "internal", "networks": ["10.0.0.0/8"], "firewall": "FW-01"}],
            "firewalls": [{"id": "FW-01", "zones": ["internal"]}],
            "policies": {"FW-01": [{"id": "1", "srcaddr": "a", "service": "NOPE", "action": "accept"}]}
        }"#,
    )
    .unwrap();

    let output = fwpath_cmd()
        .args(["--snapshot", broken.to_str().unwrap(), "validate", "-o", "json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(6), "{}", combined_output(&output));

    let json = stdout_json(&output);
    let kinds: Vec<&str> = json["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["kind"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"cyclic_group"), "{kinds:?}");
    assert!(kinds.contains(&"unknown_reference"), "{kinds:?}");
}

#[test]
fn test_validate_clean_fixture() {
    lab_cmd(&["validate"])
        .assert()
        .success()
        .stderr(predicate::str::contains("0 issue(s)"));
}

// ── Listings ────────────────────────────────────────────────────────

#[test]
fn test_zones_plain() {
    lab_cmd(&["zones", "-o", "plain"])
        .assert()
        .success()
        .stdout("internal\ndmz\nexternal\n");
}

#[test]
fn test_firewalls_json() {
    let output = lab_cmd(&["firewalls", "-o", "json"]).output().unwrap();
    assert_eq!(
        stdout_json(&output),
        json!([
            {"id": "FW-01", "name": "edge-01", "zones": ["internal"], "policies": 3},
            {"id": "FW-02", "name": "dmz-02", "zones": ["dmz"], "policies": 1}
        ])
    );
}

#[test]
fn test_policies_in_order() {
    lab_cmd(&["policies", "--firewall", "FW-01", "-o", "plain"])
        .assert()
        .success()
        .stdout("1\n2\n3\n");
    lab_cmd(&["policies", "-F", "FW-01", "--enabled-only", "-o", "plain"])
        .assert()
        .success()
        .stdout("1\n2\n");
}

#[test]
fn test_policies_unknown_firewall() {
    let output = lab_cmd(&["policies", "--firewall", "FW-99"]).output().unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("fwpath firewalls"));
}

// ── Batch ───────────────────────────────────────────────────────────

#[test]
fn test_batch_results_in_input_order() {
    let output = lab_cmd(&["batch", "--input", REQUESTS, "-j", "3", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let json = stdout_json(&output);
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 4);

    let allowed: Vec<bool> = entries
        .iter()
        .map(|e| e["trace"]["allowed"].as_bool().unwrap())
        .collect();
    assert_eq!(allowed, vec![true, false, true, false]);
    assert_eq!(entries[1]["trace"]["blocked_by"]["firewall_id"], "FW-02");
    assert_eq!(entries[2]["protocol"], "udp");
    assert_eq!(entries[2]["trace"]["hops"][0]["matched_policy_id"], "2");
}

#[test]
fn test_batch_unreadable_entry_is_reported_per_entry() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("requests.yaml");
    std::fs::write(
        &input,
        "- src: 192.168.1.10\n  dst: 8.8.8.8\n  port: 443\n\
         - src: 192.168.1.10\n  dst: 8.8.8.8\n  port: 70000\n",
    )
    .unwrap();

    let output = lab_cmd(&["batch", "-i", input.to_str().unwrap(), "-o", "json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));

    let json = stdout_json(&output);
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["trace"]["allowed"], true);
    assert_eq!(
        entries[1]["input"],
        json!({"src": "192.168.1.10", "dst": "8.8.8.8", "port": 70000})
    );
    assert!(
        entries[1]["error"].as_str().unwrap().contains("u16"),
        "{}",
        entries[1]["error"]
    );
}

#[test]
fn test_batch_fail_on_block() {
    lab_cmd(&["batch", "-i", REQUESTS, "--fail-on-block", "-q"])
        .assert()
        .code(10);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_init_then_trace_uses_profile() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    fwpath_cmd_with_config(&config)
        .args(["config", "init", "--name", "lab", "--snapshot", LAB])
        .assert()
        .success();
    assert!(std::fs::read_to_string(&config).unwrap().contains("lab.json"));

    // Second init without --force refuses to overwrite.
    fwpath_cmd_with_config(&config)
        .args(["config", "init"])
        .assert()
        .code(2);

    fwpath_cmd_with_config(&config)
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout("lab *\n");

    fwpath_cmd_with_config(&config)
        .args(["trace", "-s", "192.168.1.10", "-d", "8.8.8.8", "-P", "443", "-o", "plain"])
        .assert()
        .success()
        .stdout("allowed\n");
}

#[test]
fn test_config_set_and_unknown_profile() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    fwpath_cmd_with_config(&config)
        .args(["config", "set", "nat-source-zones", "internal, guest"])
        .assert()
        .success();
    fwpath_cmd_with_config(&config)
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("guest"));

    fwpath_cmd_with_config(&config)
        .args(["config", "use", "missing"])
        .assert()
        .code(4);
    fwpath_cmd_with_config(&config)
        .args(["config", "set", "colour", "red"])
        .assert()
        .code(2);
}
