//! Change watcher
//!
//! Entry point for configuration save notifications. Each save of the
//! tracked document is compared with the baseline copy from the previous
//! save, the differences are appended to the role change log, and the
//! baseline is replaced with the saved bytes.

use crate::diff::diff;
use crate::snapshot::parse_snapshot;
use crate::writer::AuditLogWriter;
use crate::{AuditError, AuditResult};
use chrono::{DateTime, FixedOffset};
use rolewatch_config::AuditConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of handling one save notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The saved file is not the tracked configuration document
    Ignored,
    /// Role change auditing is turned off
    Disabled,
    /// No baseline existed; the saved document became the baseline
    Bootstrapped,
    /// Role definitions did not change
    Unchanged,
    /// Changes were appended to the log
    Recorded { events: usize, lines: usize },
    /// The cycle failed and was skipped; the baseline is untouched
    Skipped(String),
}

/// Audits role changes between successive saves of the configuration document.
pub struct ChangeWatcher {
    config: AuditConfig,
    writer: AuditLogWriter,
}

impl ChangeWatcher {
    /// Watcher appending to `config.log_file`.
    pub fn new(config: AuditConfig) -> Self {
        let writer = AuditLogWriter::to_file(&config.log_file);
        Self::with_writer(config, writer)
    }

    /// Watcher appending through a custom writer.
    pub fn with_writer(config: AuditConfig, writer: AuditLogWriter) -> Self {
        Self { config, writer }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Whether `path` names the tracked configuration document.
    pub fn is_tracked(&self, path: &Path) -> bool {
        normalize(path) == normalize(&self.config.config_file)
    }

    /// Handle a save of `path` by `actor` at `now`.
    ///
    /// Never fails: errors are logged and reported as
    /// [`WatchOutcome::Skipped`].
    pub fn on_save(
        &self,
        path: &Path,
        actor: Option<&str>,
        now: DateTime<FixedOffset>,
    ) -> WatchOutcome {
        match self.process(path, actor, now) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping role change audit");
                WatchOutcome::Skipped(e.to_string())
            }
        }
    }

    fn process(
        &self,
        path: &Path,
        actor: Option<&str>,
        now: DateTime<FixedOffset>,
    ) -> AuditResult<WatchOutcome> {
        if !self.is_tracked(path) {
            debug!(path = %path.display(), "Ignoring save of untracked file");
            return Ok(WatchOutcome::Ignored);
        }
        if !self.config.enabled {
            debug!("Role change auditing disabled");
            return Ok(WatchOutcome::Disabled);
        }

        let current = fs::read(path)?;
        let baseline_path = &self.config.baseline_file;

        if !baseline_path.exists() {
            replace_baseline(baseline_path, &current)?;
            info!(baseline = %baseline_path.display(), "Created role baseline");
            return Ok(WatchOutcome::Bootstrapped);
        }

        let baseline = fs::read(baseline_path)?;
        let old = parse_snapshot(as_text(&baseline, baseline_path)?)?;
        let new = parse_snapshot(as_text(&current, path)?)?;

        let events = diff(&old, &new, actor, now);
        let lines = self.writer.write(&events)?;

        replace_baseline(baseline_path, &current)?;

        if events.is_empty() {
            debug!("No role changes detected");
            Ok(WatchOutcome::Unchanged)
        } else {
            info!(
                events = events.len(),
                log = %self.writer.describe(),
                "Recorded role changes"
            );
            Ok(WatchOutcome::Recorded {
                events: events.len(),
                lines,
            })
        }
    }
}

fn as_text<'a>(bytes: &'a [u8], path: &Path) -> AuditResult<&'a str> {
    std::str::from_utf8(bytes)
        .map_err(|e| AuditError::Parse(format!("{} is not UTF-8: {}", path.display(), e)))
}

fn normalize(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Replace the baseline by writing a temporary sibling and renaming it over.
fn replace_baseline(baseline: &Path, content: &[u8]) -> AuditResult<()> {
    if let Some(parent) = baseline.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file_name = baseline
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "baseline".to_string());
    let temp = baseline.with_file_name(format!(".{}.tmp", file_name));

    fs::write(&temp, content)?;
    if let Err(e) = fs::rename(&temp, baseline) {
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBackend;
    use chrono::TimeZone;

    const ONE_ROLE: &str = r#"<hudson><roleMap type="globalRoles">
        <role name="admin" pattern=".*"><permission>read</permission></role>
    </roleMap></hudson>"#;

    const TWO_ROLES: &str = r#"<hudson><roleMap type="globalRoles">
        <role name="admin" pattern=".*"><permission>read</permission></role>
        <role name="ops" pattern=""><permission>build</permission></role>
    </roleMap></hudson>"#;

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, 8, 30, 0)
            .unwrap()
    }

    fn setup(dir: &Path) -> (ChangeWatcher, MemoryBackend) {
        let config = AuditConfig {
            enabled: true,
            config_file: dir.join("config.xml"),
            baseline_file: dir.join("logs").join("roles-prev.xml"),
            log_file: dir.join("logs").join("role-changes.log"),
            ..AuditConfig::default()
        };
        let backend = MemoryBackend::new();
        let writer = AuditLogWriter::builder().backend(backend.clone()).build();
        (ChangeWatcher::with_writer(config, writer), backend)
    }

    #[test]
    fn test_bootstrap_then_record() {
        let dir = tempfile::tempdir().unwrap();
        let (watcher, backend) = setup(dir.path());
        let config_file = dir.path().join("config.xml");

        fs::write(&config_file, ONE_ROLE).unwrap();
        assert_eq!(
            watcher.on_save(&config_file, Some("alice"), now()),
            WatchOutcome::Bootstrapped
        );
        assert!(backend.lines().is_empty());
        assert_eq!(
            fs::read_to_string(&watcher.config().baseline_file).unwrap(),
            ONE_ROLE
        );

        fs::write(&config_file, TWO_ROLES).unwrap();
        assert_eq!(
            watcher.on_save(&config_file, Some("alice"), now()),
            WatchOutcome::Recorded { events: 1, lines: 2 }
        );
        assert_eq!(
            backend.lines()[0],
            "[2024-03-05 08:30:00 +00:00] New global role created: 'ops' by 'alice'"
        );
        assert_eq!(
            fs::read_to_string(&watcher.config().baseline_file).unwrap(),
            TWO_ROLES
        );

        assert_eq!(
            watcher.on_save(&config_file, None, now()),
            WatchOutcome::Unchanged
        );
    }

    #[test]
    fn test_untracked_and_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let (watcher, _) = setup(dir.path());

        let other = dir.path().join("jobs.xml");
        fs::write(&other, ONE_ROLE).unwrap();
        assert_eq!(watcher.on_save(&other, None, now()), WatchOutcome::Ignored);

        let mut config = watcher.config().clone();
        config.enabled = false;
        let disabled = ChangeWatcher::with_writer(config, AuditLogWriter::builder().build());
        let config_file = dir.path().join("config.xml");
        fs::write(&config_file, ONE_ROLE).unwrap();
        assert_eq!(
            disabled.on_save(&config_file, None, now()),
            WatchOutcome::Disabled
        );
        assert!(!disabled.config().baseline_file.exists());
    }

    #[test]
    fn test_parse_failure_keeps_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let (watcher, backend) = setup(dir.path());
        let config_file = dir.path().join("config.xml");

        fs::write(&config_file, ONE_ROLE).unwrap();
        watcher.on_save(&config_file, None, now());

        fs::write(&config_file, "<hudson><roleMap>").unwrap();
        assert!(matches!(
            watcher.on_save(&config_file, None, now()),
            WatchOutcome::Skipped(_)
        ));
        assert!(backend.lines().is_empty());
        assert_eq!(
            fs::read_to_string(&watcher.config().baseline_file).unwrap(),
            ONE_ROLE
        );
    }

    #[test]
    fn test_failed_append_keeps_baseline() {
        struct FullDisk;

        impl crate::AuditBackend for FullDisk {
            fn append(&self, _lines: &[String]) -> AuditResult<()> {
                Err(std::io::Error::other("no space left on device").into())
            }

            fn describe(&self) -> String {
                "full disk".to_string()
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let (setup_watcher, _) = setup(dir.path());
        let watcher = ChangeWatcher::with_writer(
            setup_watcher.config().clone(),
            AuditLogWriter::builder().backend(FullDisk).build(),
        );
        let config_file = dir.path().join("config.xml");

        fs::write(&config_file, ONE_ROLE).unwrap();
        assert_eq!(
            watcher.on_save(&config_file, None, now()),
            WatchOutcome::Bootstrapped
        );

        fs::write(&config_file, TWO_ROLES).unwrap();
        match watcher.on_save(&config_file, Some("alice"), now()) {
            WatchOutcome::Skipped(reason) => assert!(reason.contains("no space left")),
            other => panic!("expected Skipped, got {:?}", other),
        }
        assert_eq!(
            fs::read_to_string(&watcher.config().baseline_file).unwrap(),
            ONE_ROLE
        );
    }

    #[test]
    fn test_log_file_that_is_a_directory_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let (setup_watcher, _) = setup(dir.path());
        let config = setup_watcher.config().clone();
        fs::create_dir_all(&config.log_file).unwrap();
        let watcher = ChangeWatcher::new(config);
        let config_file = dir.path().join("config.xml");

        fs::write(&config_file, ONE_ROLE).unwrap();
        watcher.on_save(&config_file, None, now());

        fs::write(&config_file, TWO_ROLES).unwrap();
        assert!(matches!(
            watcher.on_save(&config_file, None, now()),
            WatchOutcome::Skipped(_)
        ));
        assert_eq!(
            fs::read_to_string(&watcher.config().baseline_file).unwrap(),
            ONE_ROLE
        );
    }

    #[test]
    fn test_missing_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let (watcher, _) = setup(dir.path());

        let outcome = watcher.on_save(&dir.path().join("config.xml"), None, now());
        assert!(matches!(outcome, WatchOutcome::Skipped(_)));
    }
}
