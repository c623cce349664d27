// Settings validation

use crate::{ConfigError, Result};
use rolewatch_cron::{CronError, CronExpression};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single finding about a settings field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Dotted path of the field, e.g. `audit_log_rotation.cron`
    pub field: String,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Trait for validating settings
pub trait Validate {
    /// Collect every warning and error.
    fn diagnostics(&self) -> Vec<Diagnostic>;

    /// Fail when any diagnostic is an error; warnings pass.
    fn validate(&self) -> Result<()> {
        let errors: Vec<Diagnostic> = self
            .diagnostics()
            .into_iter()
            .filter(Diagnostic::is_error)
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }
}

/// Field-level checks shared by the settings sections
pub struct ConfigValidator;

impl ConfigValidator {
    /// Check that a rotation cron expression is present and parses.
    pub fn cron(value: &str, seed: Option<&str>, field: &str) -> Option<Diagnostic> {
        match CronExpression::parse_with_seed(value, seed) {
            Ok(_) => None,
            Err(CronError::EmptyExpression) => Some(Diagnostic::error(
                field,
                "Rotation cron expression cannot be empty.",
            )),
            Err(e) => Some(Diagnostic::error(
                field,
                format!("Invalid cron expression: {}", e),
            )),
        }
    }

    /// Warn when the directory that will hold `path` is missing or read-only.
    pub fn writable_parent(path: &Path, field: &str) -> Option<Diagnostic> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let writable = fs::metadata(parent)
            .map(|m| m.is_dir() && !m.permissions().readonly())
            .unwrap_or(false);

        if writable {
            None
        } else {
            Some(Diagnostic::warning(
                field,
                format!("{} might not be writable.", parent.display()),
            ))
        }
    }

    /// Warn when `value` is blank.
    pub fn not_blank(value: &str, field: &str, message: &str) -> Option<Diagnostic> {
        if value.trim().is_empty() {
            Some(Diagnostic::warning(field, message))
        } else {
            None
        }
    }
}
