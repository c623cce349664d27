// rolewatch - RBAC role change auditing with scheduled log rotation
//
// Watches a role-based access control configuration document, records every
// role change between saves to an append-only log, and rotates that log (and
// a second audit log) on cron schedules with optional S3 archiving.

// Re-export the audit engine at the top level
pub use rolewatch_audit::*;

// Re-export member crates
pub use rolewatch_audit as audit;
pub use rolewatch_config as config;
pub use rolewatch_cron as cron;
pub use rolewatch_storage as storage;

// Prelude for common imports
pub mod prelude {
    pub use rolewatch_audit::{
        AuditError, AuditLogWriter, AuditResult, ChangeEvent, ChangeKind, ChangeWatcher,
        LogRotator, RoleInfo, RoleMap, RoleScope, RotationOutcome, WatchOutcome, diff,
        parse_snapshot, render_events,
    };
    pub use rolewatch_config::{AuditConfig, RotationConfig, Settings, Validate};
    pub use rolewatch_cron::{CronExpression, CronPresets, CronScheduler};
    pub use rolewatch_storage::{LocalStorage, Storage};

    #[cfg(feature = "s3")]
    pub use rolewatch_storage::{S3Config, S3Storage};
}
