//! End-to-end tests for the rolewatch binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn rolewatch(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rolewatch").unwrap();
    cmd.env("ROLEWATCH_HOME", home)
        .env_remove("ROLEWATCH_CONFIG")
        .env_remove("RUST_LOG")
        .env("ROLEWATCH_LOG_LEVEL", "off")
        .current_dir(home);
    cmd
}

const BEFORE: &str = r#"<hudson><roleMap type="globalRoles">
  <role name="admin" pattern=".*"><permissions><permission>read</permission><permission>write</permission></permissions></role>
</roleMap></hudson>"#;

const AFTER: &str = r#"<hudson><roleMap type="globalRoles">
  <role name="admin" pattern=".*"><permissions><permission>read</permission><permission>deploy</permission></permissions></role>
</roleMap></hudson>"#;

#[test]
fn test_diff_prints_lines() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("old.xml"), BEFORE).unwrap();
    fs::write(dir.path().join("new.xml"), AFTER).unwrap();

    rolewatch(dir.path())
        .args(["diff", "old.xml", "new.xml", "--actor", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Permission 'deploy' added to global role 'admin' by 'alice'",
        ))
        .stdout(predicate::str::contains(
            "Permission 'write' removed from global role 'admin' by 'alice'",
        ));
}

#[test]
fn test_record_bootstraps_then_logs() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("logs")).unwrap();
    let config = dir.path().join("config.xml");

    fs::write(&config, BEFORE).unwrap();
    rolewatch(dir.path())
        .arg("record")
        .assert()
        .success()
        .stdout(predicate::str::contains("Baseline created"));

    fs::write(&config, AFTER).unwrap();
    rolewatch(dir.path())
        .args(["record", "--actor", "bob"])
        .assert()
        .success();

    let log = fs::read_to_string(dir.path().join("logs").join("role-changes.log")).unwrap();
    assert_eq!(log.lines().count(), 2);
    assert!(log.contains("by 'bob'"));
}

#[test]
fn test_rotate_now_and_missing_log() {
    let dir = tempfile::tempdir().unwrap();
    let logs = dir.path().join("logs");
    fs::create_dir_all(&logs).unwrap();

    rolewatch(dir.path())
        .args(["rotate", "audit", "--now"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to rotate"));

    fs::write(logs.join("audit-1.log"), "entry\n").unwrap();
    rolewatch(dir.path())
        .args(["rotate", "audit", "--now"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rotated"));

    assert!(!logs.join("audit-1.log").exists());
    let archives: Vec<_> = fs::read_dir(&logs)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(archives.len(), 1);
    assert!(archives[0].starts_with("audit-1-") && archives[0].ends_with(".log"));
}

#[test]
fn test_check_reports_invalid_cron() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("logs")).unwrap();
    fs::write(
        dir.path().join("rolewatch.toml"),
        "[audit_log_rotation]\ncron = \"every day\"\n",
    )
    .unwrap();

    rolewatch(dir.path())
        .args(["--config", "rolewatch.toml", "check"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Invalid cron expression"));
}
