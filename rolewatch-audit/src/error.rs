//! Audit error types

use rolewatch_config::ConfigError;
use rolewatch_cron::CronError;
use rolewatch_storage::StorageError;

/// Result type for audit operations
pub type AuditResult<T> = std::result::Result<T, AuditError>;

/// Audit errors
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The configuration document is not well-formed
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Shipping an archive to remote storage failed
    #[error("Upload error: {0}")]
    Upload(#[from] StorageError),

    /// The rotation cron expression is malformed
    #[error("Schedule error: {0}")]
    Schedule(#[from] CronError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
