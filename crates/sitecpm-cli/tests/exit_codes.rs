//! Exit code integration tests
//!
//! ## Exit Code Contract
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Success: no errors (warnings/hints/info allowed) |
//! | 1 | Failure: one or more errors emitted |
//!
//! - Default: only data errors (E001) cause exit 1
//! - --strict: warnings become errors
//! - --quiet: does NOT affect exit code
//! - --format=json: exit codes identical to text mode

use std::path::PathBuf;
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn sitecpm(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sitecpm"))
        .args(args)
        .env_remove("SITECPM_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute sitecpm")
}

fn run(command: &str, fixture_name: &str, args: &[&str]) -> Output {
    let path = fixture(fixture_name);
    let mut full = vec![command, path.to_str().unwrap()];
    full.extend_from_slice(args);
    sitecpm(&full)
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// =============================================================================
// check
// =============================================================================

#[test]
fn check_valid_network_exits_0() {
    let output = run("check", "valid.json", &[]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("4 activities OK"));
}

#[test]
fn check_cycle_exits_1_with_e001() {
    let output = run("check", "cycle.json", &[]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("error[E001]"), "stderr: {}", err);
    assert!(err.contains("cyclic dependency"));
}

#[test]
fn check_missing_dependency_is_fatal_by_default() {
    let output = run("check", "missing_dep.json", &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("A9"));
}

#[test]
fn check_lenient_downgrades_missing_dependency_to_warning() {
    let output = run("check", "missing_dep.json", &["--lenient"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stderr(&output).contains("warning[C001]"));
}

// =============================================================================
// schedule
// =============================================================================

#[test]
fn schedule_warnings_only_exits_0() {
    let output = run("schedule", "excluded.json", &[]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stderr(&output).contains("warning[X001]"));
}

#[test]
fn schedule_strict_escalates_warnings() {
    let output = run("schedule", "excluded.json", &["--strict"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("error[X001]"));
}

#[test]
fn quiet_does_not_change_exit_code() {
    let output = run("schedule", "excluded.json", &["--strict", "--quiet"]);
    assert_eq!(output.status.code(), Some(1));

    let output = run("schedule", "excluded.json", &["--quiet"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(!stderr(&output).contains("X001"));
}

#[test]
fn json_exit_codes_match_text_mode() {
    let text = run("schedule", "excluded.json", &["--strict"]);
    let json = run("schedule", "excluded.json", &["--strict", "--format", "json"]);
    assert_eq!(text.status.code(), json.status.code());

    let doc: serde_json::Value = serde_json::from_slice(&json.stdout).unwrap();
    assert_eq!(doc["exit_code"], 1);
    assert_eq!(doc["diagnostics"][0]["code"], "X001");
    assert_eq!(doc["diagnostics"][0]["severity"], "error");
}

#[test]
fn schedule_cycle_exits_1() {
    let output = run("schedule", "cycle.json", &["--format", "json"]);
    assert_eq!(output.status.code(), Some(1));

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["diagnostics"][0]["code"], "E001");
    assert!(doc.get("result").is_none());
}

#[test]
fn invalid_equipment_mode_fails() {
    let output = run("schedule", "valid.json", &["--equipment", "A1=crane"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unknown equipment mode"));
}
