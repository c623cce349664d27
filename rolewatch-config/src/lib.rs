//! Settings for rolewatch.
//!
//! Settings come from an optional TOML or JSON file, are overlaid with
//! `ROLEWATCH_*` environment variables (after reading `.env` when present),
//! and finally fall back to defaults rooted at the configured home
//! directory.
//!
//! ```no_run
//! use rolewatch_config::{Settings, Validate};
//! use std::path::Path;
//!
//! let settings = Settings::load(Some(Path::new("rolewatch.toml"))).unwrap();
//! for diagnostic in settings.diagnostics() {
//!     eprintln!("{} {}: {}", diagnostic.severity, diagnostic.field, diagnostic.message);
//! }
//! settings.validate().unwrap();
//! ```

pub mod env;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use env::{ENV_PREFIX, EnvLoader};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use settings::{AuditConfig, RotationConfig, Settings};
pub use validation::{ConfigValidator, Diagnostic, Severity, Validate};
