//! CLI integration tests
//!
//! These tests run the binary against snapshot fixtures and check exit codes
//! and output.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

/// Get the path to the test fixtures directory
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(name: &str) -> String {
    fixtures_path().join(name).to_string_lossy().to_string()
}

fn deadsymbols() -> Command {
    Command::cargo_bin("deadsymbols").unwrap()
}

// ============================================================================
// Exit codes
// ============================================================================

#[test]
fn test_clean_snapshot_exits_zero() {
    deadsymbols()
        .arg(fixture("all_used.json"))
        .assert()
        .code(0)
        .stdout(predicate::str::contains("No unused symbols found!"));
}

#[test]
fn test_findings_exit_one() {
    deadsymbols()
        .arg(fixture("unused_method.json"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Foo.Bar"))
        .stdout(predicate::str::contains("Baz").not());
}

#[test]
fn test_missing_snapshot_exits_two() {
    deadsymbols()
        .arg(fixture("does_not_exist.json"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("analysis target not found"));
}

#[test]
fn test_malformed_snapshot_exits_two() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.json");
    std::fs::write(&path, "{ \"root\": ").unwrap();

    deadsymbols().arg(&path).assert().code(2);
}

#[test]
fn test_unknown_rule_set_exits_two() {
    deadsymbols()
        .arg(fixture("all_used.json"))
        .args(["--rule-set", "7"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid configuration"));
}

// ============================================================================
// Output
// ============================================================================

#[test]
fn test_json_output() {
    let output = deadsymbols()
        .arg(fixture("unused_method.json"))
        .args(["--format", "json", "--quiet"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["TotalFindings"], 1);
    let finding = &value["Findings"][0];
    assert_eq!(finding["SymbolKind"], "Method");
    assert_eq!(finding["SymbolName"], "Bar");
    assert_eq!(finding["Module"], "App");
    assert_eq!(finding["RelativePath"], "src/Foo.cs");
    assert_eq!(finding["Line"], 5);
}

#[test]
fn test_json_output_file() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("report.json");

    deadsymbols()
        .arg(fixture("unused_method.json"))
        .args(["--format", "json", "--output"])
        .arg(&out)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Report written to:"));

    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.contains("\"SymbolName\": \"Bar\""));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_retain_flag_suppresses_finding() {
    deadsymbols()
        .arg(fixture("unused_method.json"))
        .args(["--retain", "Bar"])
        .assert()
        .code(0);
}

#[test]
fn test_config_file_entry_points() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("deadsymbols.yml");
    std::fs::write(&config, "entry_points:\n  - \"App.Foo.Bar\"\n").unwrap();

    deadsymbols()
        .arg(fixture("unused_method.json"))
        .arg("--config")
        .arg(&config)
        .assert()
        .code(0);
}

#[test]
fn test_include_public_reports_nothing_new_for_called_method() {
    deadsymbols()
        .arg(fixture("unused_method.json"))
        .args(["--include-public", "--format", "json"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"TotalFindings\": 1"));
}
