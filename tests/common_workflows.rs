//! Integration tests for common rolewatch workflows.
//!
//! These tests drive the facade the way a host application would.

use chrono::{FixedOffset, TimeZone};
use rolewatch::prelude::*;
use std::fs;
use std::sync::Arc;

const BEFORE: &str = r#"<?xml version='1.1' encoding='UTF-8'?>
<hudson>
  <authorizationStrategy class="com.michelin.cio.hudson.plugins.rolestrategy.RoleBasedAuthorizationStrategy">
    <roleMap type="globalRoles">
      <role name="admin" pattern=".*">
        <permissions><permission>hudson.model.Hudson.Administer</permission></permissions>
        <assignedSIDs><sid>alice</sid></assignedSIDs>
      </role>
    </roleMap>
    <roleMap type="projectRoles"/>
  </authorizationStrategy>
</hudson>"#;

const AFTER: &str = r#"<?xml version='1.1' encoding='UTF-8'?>
<hudson>
  <authorizationStrategy class="com.michelin.cio.hudson.plugins.rolestrategy.RoleBasedAuthorizationStrategy">
    <roleMap type="globalRoles">
      <role name="admin" pattern=".*">
        <permissions><permission>hudson.model.Hudson.Administer</permission></permissions>
        <assignedSIDs><sid>alice</sid><sid>bob</sid></assignedSIDs>
      </role>
    </roleMap>
    <roleMap type="projectRoles">
      <role name="deployers" pattern="deploy-.*">
        <permissions><permission>hudson.model.Item.Build</permission></permissions>
        <assignedSIDs/>
      </role>
    </roleMap>
  </authorizationStrategy>
</hudson>"#;

#[tokio::test]
async fn test_save_record_then_rotate_and_archive() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("logs")).unwrap();
    let settings = Settings::with_home(dir.path());
    assert!(settings.validate().is_ok());

    let at = |minute| {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, 0, minute, 0)
            .unwrap()
    };

    let watcher = ChangeWatcher::new(settings.role_audit.clone());
    fs::write(&settings.role_audit.config_file, BEFORE).unwrap();
    assert_eq!(
        watcher.on_save(&settings.role_audit.config_file, Some("alice"), at(0)),
        WatchOutcome::Bootstrapped
    );

    fs::write(&settings.role_audit.config_file, AFTER).unwrap();
    assert_eq!(
        watcher.on_save(&settings.role_audit.config_file, Some("alice"), at(1)),
        WatchOutcome::Recorded { events: 2, lines: 3 }
    );

    let archive_dir = dir.path().join("archive");
    let storage = Arc::new(LocalStorage::new(&archive_dir).await.unwrap());

    let mut rotation = settings.role_audit.rotation.clone();
    rotation.upload = true;
    rotation.bucket = "local".to_string();
    let rotator = LogRotator::new("role-change-log", rotation).with_storage(storage);

    // `H 0 * * *` without a seed fires at midnight
    assert_eq!(rotator.tick(at(1)).await, RotationOutcome::NotDue);
    let outcome = rotator.tick(at(0)).await;
    assert!(matches!(
        outcome,
        RotationOutcome::Rotated { uploaded: true, .. }
    ));

    let uploaded = archive_dir
        .join("role-change-logs")
        .join("role-changes-20240305_000000.log");
    let content = fs::read_to_string(uploaded).unwrap();
    assert!(content.contains("SID 'bob' added to global role 'admin' by 'alice'"));
    assert!(content.contains("New project role created: 'deployers' by 'alice'"));
    assert!(!settings.role_audit.log_file.exists());
}

#[test]
fn test_diff_through_facade() {
    let old = parse_snapshot(BEFORE).unwrap();
    let new = parse_snapshot(AFTER).unwrap();
    let now = FixedOffset::east_opt(3600)
        .unwrap()
        .with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
        .unwrap();

    let lines = render_events(&diff(&new, &old, None, now));
    assert_eq!(
        lines,
        vec![
            "[2024-01-01 12:00:00 +01:00] SID 'bob' removed from global role 'admin' by 'UNKNOWN'",
            "[2024-01-01 12:00:00 +01:00] project role deleted: 'deployers' by 'UNKNOWN'",
        ]
    );
}
