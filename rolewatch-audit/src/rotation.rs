//! Cron-driven log rotation
//!
//! A [`LogRotator`] is checked once a minute. When its cron expression
//! matches the current wall-clock minute, the log file is renamed to a
//! timestamped archive next to it and, if enabled, the archive is uploaded
//! to object storage.

use crate::AuditResult;
use crate::lock::path_lock;
use chrono::{DateTime, FixedOffset};
use parking_lot::{Mutex, RwLock};
use rolewatch_config::RotationConfig;
use rolewatch_cron::{CronExpression, CronResult, CronScheduler};
use rolewatch_storage::{Storage, object_key};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

/// Timestamp layout appended to archive names, e.g. `20240305_000000`.
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Whether a rotation is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotatorState {
    Idle,
    Rotating,
}

/// Result of one tick or rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationOutcome {
    /// The schedule does not fire this minute
    NotDue,
    /// Rotation is turned off
    Disabled,
    /// Nothing to rotate: the log file is missing or a rotation is running
    Skipped,
    /// The log was archived; `uploaded` is false when upload is off or failed
    Rotated { archive: PathBuf, uploaded: bool },
    /// The tick failed; nothing was changed
    Failed(String),
}

/// Rotates one log file on a cron schedule.
///
/// # Examples
///
/// ```no_run
/// use chrono::Local;
/// use rolewatch_audit::LogRotator;
/// use rolewatch_config::RotationConfig;
///
/// # async fn example() {
/// let rotator = LogRotator::new(
///     "audit-log",
///     RotationConfig::for_log("logs/audit-1.log", "audit-logs"),
/// );
///
/// let outcome = rotator.tick(Local::now().fixed_offset()).await;
/// println!("{:?}", outcome);
/// # }
/// ```
pub struct LogRotator {
    name: String,
    config: RwLock<RotationConfig>,
    storage: Option<Arc<dyn Storage>>,
    rotating: AtomicBool,
    last_outcome: Mutex<Option<RotationOutcome>>,
}

impl LogRotator {
    /// Create a rotator. Uploads, when enabled, go to S3 using the bucket
    /// and region of the current config.
    pub fn new(name: impl Into<String>, config: RotationConfig) -> Self {
        Self {
            name: name.into(),
            config: RwLock::new(config),
            storage: None,
            rotating: AtomicBool::new(false),
            last_outcome: Mutex::new(None),
        }
    }

    /// Upload archives to `storage` instead of S3.
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of the current config.
    pub fn config(&self) -> RotationConfig {
        self.config.read().clone()
    }

    /// Replace the config read by subsequent ticks.
    pub fn update_config(&self, config: RotationConfig) {
        info!(rotator = %self.name, cron = %config.cron, enabled = config.enabled, "Rotation config updated");
        *self.config.write() = config;
    }

    pub fn state(&self) -> RotatorState {
        if self.rotating.load(Ordering::SeqCst) {
            RotatorState::Rotating
        } else {
            RotatorState::Idle
        }
    }

    /// Outcome of the most recent tick or rotation.
    pub fn last_outcome(&self) -> Option<RotationOutcome> {
        self.last_outcome.lock().clone()
    }

    /// Check the schedule for the minute of `now` and rotate when it fires.
    ///
    /// Never fails: a malformed cron expression or a failed rename is
    /// logged and reported as [`RotationOutcome::Failed`].
    pub async fn tick(&self, now: DateTime<FixedOffset>) -> RotationOutcome {
        let outcome = self.check_and_rotate(now).await;
        *self.last_outcome.lock() = Some(outcome.clone());
        outcome
    }

    async fn check_and_rotate(&self, now: DateTime<FixedOffset>) -> RotationOutcome {
        let config = self.config();
        if !config.enabled {
            return RotationOutcome::Disabled;
        }

        let due = match CronExpression::parse_with_seed(&config.cron, config.seed.as_deref()) {
            Ok(schedule) => {
                let due = schedule.matches(&now);
                if !due && let Some(next) = schedule.next_after(&now) {
                    debug!(rotator = %self.name, next = %next, "Rotation not due");
                }
                due
            }
            Err(e) => {
                warn!(rotator = %self.name, cron = %config.cron, error = %e, "Invalid rotation schedule");
                return RotationOutcome::Failed(e.to_string());
            }
        };

        if !due {
            return RotationOutcome::NotDue;
        }

        match self.rotate_with(&config, now).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(rotator = %self.name, log = %config.log_file.display(), error = %e, "Log rotation failed");
                RotationOutcome::Failed(e.to_string())
            }
        }
    }

    /// Rotate immediately, regardless of schedule and enabled flag.
    pub async fn rotate(&self, now: DateTime<FixedOffset>) -> AuditResult<RotationOutcome> {
        let config = self.config();
        let result = self.rotate_with(&config, now).await;
        *self.last_outcome.lock() = Some(match &result {
            Ok(outcome) => outcome.clone(),
            Err(e) => RotationOutcome::Failed(e.to_string()),
        });
        result
    }

    async fn rotate_with(
        &self,
        config: &RotationConfig,
        now: DateTime<FixedOffset>,
    ) -> AuditResult<RotationOutcome> {
        if self
            .rotating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(rotator = %self.name, "Rotation already in progress");
            return Ok(RotationOutcome::Skipped);
        }

        let result = self.rename_and_upload(config, now).await;
        self.rotating.store(false, Ordering::SeqCst);
        result
    }

    async fn rename_and_upload(
        &self,
        config: &RotationConfig,
        now: DateTime<FixedOffset>,
    ) -> AuditResult<RotationOutcome> {
        let Some(archive) = rename_to_archive(&config.log_file, now)? else {
            debug!(rotator = %self.name, log = %config.log_file.display(), "Log file not created, skipping rotation");
            return Ok(RotationOutcome::Skipped);
        };

        info!(rotator = %self.name, archive = %archive.display(), "Log rotated");

        let uploaded = config.upload && self.upload(config, &archive).await;
        Ok(RotationOutcome::Rotated { archive, uploaded })
    }

    async fn upload(&self, config: &RotationConfig, archive: &Path) -> bool {
        let Some(file_name) = archive.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            return false;
        };
        let key = object_key(config.prefix(), &file_name);

        let storage = match self.storage_for(config).await {
            Ok(storage) => storage,
            Err(e) => {
                warn!(rotator = %self.name, error = %e, "No upload target; archive kept locally");
                return false;
            }
        };

        match storage.put_file(archive, &key).await {
            Ok(meta) => {
                info!(
                    rotator = %self.name,
                    key = %meta.key,
                    target = %storage.describe(),
                    "Uploaded rotated log"
                );
                true
            }
            Err(e) => {
                warn!(
                    rotator = %self.name,
                    key = %key,
                    target = %storage.describe(),
                    error = %e,
                    "Failed to upload rotated log; archive kept locally"
                );
                false
            }
        }
    }

    #[cfg(feature = "s3")]
    async fn storage_for(&self, config: &RotationConfig) -> AuditResult<Arc<dyn Storage>> {
        use rolewatch_storage::{S3Config, S3Storage};

        if let Some(storage) = &self.storage {
            return Ok(storage.clone());
        }
        let s3 = S3Storage::new(S3Config::new(&config.bucket).region(&config.region)).await?;
        Ok(Arc::new(s3))
    }

    #[cfg(not(feature = "s3"))]
    async fn storage_for(&self, _config: &RotationConfig) -> AuditResult<Arc<dyn Storage>> {
        self.storage.clone().ok_or_else(|| {
            rolewatch_storage::StorageError::Config(
                "built without S3 support and no storage backend configured".to_string(),
            )
            .into()
        })
    }

    /// Register this rotator as a job that ticks on every scheduler tick.
    pub async fn schedule(self: &Arc<Self>, scheduler: &CronScheduler) -> CronResult<()> {
        let rotator = Arc::clone(self);
        scheduler
            .add_job(self.name.clone(), move |ctx| {
                let rotator = Arc::clone(&rotator);
                async move {
                    rotator.tick(ctx.tick_time.fixed_offset()).await;
                    Ok(())
                }
            })
            .await
    }
}

/// Archive path for `log_file` rotated at `now`.
///
/// The timestamp goes between the base name and the extension, where the
/// extension starts at the last `.` of the file name:
/// `logs/audit-1.log` at 2024-03-05 00:00:00 becomes
/// `logs/audit-1-20240305_000000.log`.
pub fn archive_path(log_file: &Path, now: &DateTime<FixedOffset>) -> PathBuf {
    let name = log_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (base, extension) = match name.rfind('.') {
        Some(index) => name.split_at(index),
        None => (name.as_str(), ""),
    };

    let archive_name = format!(
        "{}-{}{}",
        base,
        now.format(ARCHIVE_TIMESTAMP_FORMAT),
        extension
    );
    log_file.with_file_name(archive_name)
}

/// Rename `log_file` to its archive path, replacing any existing archive of
/// that name. Returns `None` when there is no log file.
fn rename_to_archive(log_file: &Path, now: DateTime<FixedOffset>) -> AuditResult<Option<PathBuf>> {
    let lock = path_lock(log_file);
    let _guard = lock.lock();

    if !log_file.exists() {
        return Ok(None);
    }

    let archive = archive_path(log_file, &now);
    if archive.exists() {
        fs::remove_file(&archive)?;
    }
    fs::rename(log_file, &archive)?;

    Ok(Some(archive))
}
