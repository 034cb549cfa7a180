//! CLI integration tests.
//!
//! Runs the `fleetql` binary with `assert_cmd` against temporary data files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get the CLI binary command, isolated from any local configuration
#[allow(deprecated)]
fn fleetql_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("fleetql").unwrap();
    cmd.current_dir(dir.path()).env_remove("FLEETQL_CONFIG");
    cmd
}

fn write_fleet(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("fleet.json");
    fs::write(
        &path,
        r#"{
            "distributionsets": [
                { "id": 1, "name": "DS1-x", "version": "1.0" },
                { "id": 2, "name": "DS2-y", "version": "2.0" },
                { "id": 3, "name": "DS3-z", "version": "3.0" }
            ],
            "actions": [
                { "id": 1, "distributionSet": 1, "status": "running" },
                { "id": 2, "distributionSet": 3, "status": "finished" },
                { "id": 3, "distributionSet": 2, "status": "error" },
                { "id": 4, "distributionSet": 1, "status": "scheduled" },
                { "id": 5, "distributionSet": 3, "status": "running" }
            ]
        }"#,
    )
    .unwrap();
    path
}

// =============================================================================
// Help & Version Tests
// =============================================================================

#[test]
fn test_help_displays_usage() {
    let dir = TempDir::new().unwrap();

    fleetql_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("FleetQL CLI"))
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_invalid_command_shows_error() {
    let dir = TempDir::new().unwrap();

    fleetql_cmd(&dir)
        .arg("invalid_command_xyz")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

// =============================================================================
// Parse Command Tests
// =============================================================================

#[test]
fn test_parse_prints_syntax_tree() {
    let dir = TempDir::new().unwrap();

    fleetql_cmd(&dir)
        .args(["parse", "name==a*,name==b"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"or\""))
        .stdout(predicate::str::contains("Syntax tree"));
}

#[test]
fn test_parse_with_entity_prints_predicate() {
    let dir = TempDir::new().unwrap();

    fleetql_cmd(&dir)
        .args(["parse", "tag==canary", "--entity", "targets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Predicate (Target)"))
        .stdout(predicate::str::contains("tags"));
}

#[test]
fn test_parse_error_points_at_position() {
    let dir = TempDir::new().unwrap();

    fleetql_cmd(&dir)
        .args(["parse", "name=="])
        .assert()
        .failure()
        .stderr(predicate::str::contains("^"))
        .stderr(predicate::str::contains("FQL-001"));
}

#[test]
fn test_unknown_field_fails() {
    let dir = TempDir::new().unwrap();

    fleetql_cmd(&dir)
        .args(["parse", "securityToken==x", "-e", "target"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("FQL-002"));
}

// =============================================================================
// SQL Command Tests
// =============================================================================

#[test]
fn test_sql_renders_exists_for_tags() {
    let dir = TempDir::new().unwrap();

    fleetql_cmd(&dir)
        .args(["sql", "tag==canary", "--entity", "targets", "--sort", "name:DESC"])
        .assert()
        .success()
        .stdout(predicate::str::contains("EXISTS (SELECT 1 FROM sp_target_tags"))
        .stdout(predicate::str::contains("ORDER BY t0.name DESC NULLS LAST, t0.id ASC"))
        .stdout(predicate::str::contains("\"canary\""));
}

// =============================================================================
// Query Command Tests
// =============================================================================

#[test]
fn test_query_json_counts_related_matches() {
    let dir = TempDir::new().unwrap();
    let data = write_fleet(&dir);

    let output = fleetql_cmd(&dir)
        .arg("query")
        .arg(&data)
        .args([
            "--entity",
            "actions",
            "-q",
            "distributionSet.name==DS1*,distributionSet.name==DS2*",
            "--limit",
            "2",
            "--format",
            "json",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let page: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(page["total"], 3);
    assert_eq!(page["size"], 2);
}

#[test]
fn test_query_table_output() {
    let dir = TempDir::new().unwrap();
    let data = write_fleet(&dir);

    fleetql_cmd(&dir)
        .arg("query")
        .arg(&data)
        .args(["-e", "actions", "-q", "status==running"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 of 2 matching"));
}

#[test]
fn test_query_missing_file_fails() {
    let dir = TempDir::new().unwrap();

    fleetql_cmd(&dir)
        .args(["query", "missing.json", "-e", "targets"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("FQL-007"));
}

// =============================================================================
// Config Command Tests
// =============================================================================

#[test]
fn test_config_reads_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("fleetql.toml"), "[paging]\nmax_limit = 100\n").unwrap();

    fleetql_cmd(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("max_limit = 100"));
}
