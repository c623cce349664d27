//! Error types for the rolewatch CLI.

use rolewatch_audit::AuditError;
use rolewatch_config::ConfigError;
use rolewatch_cron::CronError;
use thiserror::Error;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),

    #[error("Scheduler error: {0}")]
    Schedule(#[from] CronError),

    /// A watcher cycle or rotation did not complete
    #[error("{0}")]
    Failed(String),

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("Validation failed with {0} error(s)")]
    Validation(usize),
}

impl From<notify::Error> for CliError {
    fn from(e: notify::Error) -> Self {
        CliError::Watch(e.to_string())
    }
}
