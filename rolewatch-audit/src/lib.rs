//! Role change auditing and log rotation for rolewatch
//!
//! This crate watches the role-based access control section of a CI
//! server's configuration document and keeps a human-readable audit trail
//! of every change, plus cron-driven rotation of audit logs.
//!
//! # Features
//!
//! - **Snapshot Parsing** - `roleMap` / `role` / `permission` / `sid` into a [`RoleMap`]
//! - **Diffing** - deterministic [`ChangeEvent`]s between two snapshots
//! - **Audit Log Writing** - append-only, one sentence per line
//! - **Change Watching** - baseline bookkeeping across configuration saves
//! - **Rotation** - timestamped archives with optional upload to S3
//!
//! # Quick Start
//!
//! ```no_run
//! use chrono::Local;
//! use rolewatch_audit::*;
//! use rolewatch_config::Settings;
//!
//! let settings = Settings::default();
//! let watcher = ChangeWatcher::new(settings.role_audit.clone());
//!
//! // Call after every save of the configuration document
//! let outcome = watcher.on_save(
//!     &settings.role_audit.config_file,
//!     Some("alice"),
//!     Local::now().fixed_offset(),
//! );
//! println!("{:?}", outcome);
//! ```

pub mod backend;
pub mod diff;
pub mod error;
pub mod event;
pub mod lock;
pub mod role;
pub mod rotation;
pub mod snapshot;
pub mod watcher;
pub mod writer;

pub use backend::*;
pub use diff::diff;
pub use error::{AuditError, AuditResult};
pub use event::*;
pub use role::{RoleInfo, RoleMap, RoleScope};
pub use rotation::{LogRotator, RotationOutcome, RotatorState, archive_path};
pub use snapshot::{parse_snapshot, parse_snapshot_file};
pub use watcher::{ChangeWatcher, WatchOutcome};
pub use writer::*;
