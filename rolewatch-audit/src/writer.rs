//! Audit log writer

use crate::event::{ChangeEvent, render_events};
use crate::{AuditBackend, AuditResult, FileBackend};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Audit log writer
///
/// Renders change events and appends them to a backend.
#[derive(Clone)]
pub struct AuditLogWriter {
    backend: Arc<dyn AuditBackend>,
    enabled: bool,
}

impl AuditLogWriter {
    /// Create a new audit log writer builder
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rolewatch_audit::*;
    ///
    /// let writer = AuditLogWriter::builder()
    ///     .backend(FileBackend::new("logs/role-changes.log"))
    ///     .build();
    /// ```
    pub fn builder() -> AuditLogWriterBuilder {
        AuditLogWriterBuilder::new()
    }

    /// Writer appending to the file at `path`
    pub fn to_file(path: impl AsRef<Path>) -> Self {
        Self::builder()
            .backend(FileBackend::new(path.as_ref()))
            .build()
    }

    /// Append the rendered lines of `events`, returning the number of lines written.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Local;
    /// use rolewatch_audit::*;
    ///
    /// let backend = MemoryBackend::new();
    /// let writer = AuditLogWriter::builder().backend(backend.clone()).build();
    ///
    /// let event = ChangeEvent::new(
    ///     RoleScope::Global,
    ///     "admin",
    ///     ChangeKind::RoleDeleted,
    ///     Some("alice"),
    ///     Local::now().fixed_offset(),
    /// );
    /// assert_eq!(writer.write(&[event]).unwrap(), 1);
    /// assert!(backend.lines()[0].ends_with("global role deleted: 'admin' by 'alice'"));
    /// ```
    pub fn write(&self, events: &[ChangeEvent]) -> AuditResult<usize> {
        if !self.enabled || events.is_empty() {
            return Ok(0);
        }

        let lines = render_events(events);
        self.backend.append(&lines)?;

        debug!(
            lines = lines.len(),
            target = %self.backend.describe(),
            "Appended role change entries"
        );

        Ok(lines.len())
    }

    /// Check if writer is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the writer
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Where entries are written
    pub fn describe(&self) -> String {
        self.backend.describe()
    }
}

/// Append `events` to the log file at `log_path`.
pub fn append(events: &[ChangeEvent], log_path: &Path) -> AuditResult<usize> {
    AuditLogWriter::to_file(log_path).write(events)
}

/// Audit log writer builder
pub struct AuditLogWriterBuilder {
    backend: Option<Arc<dyn AuditBackend>>,
    enabled: bool,
}

impl AuditLogWriterBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            backend: None,
            enabled: true,
        }
    }

    /// Set the storage backend
    pub fn backend(mut self, backend: impl AuditBackend + 'static) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    /// Enable or disable the writer
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Build the writer; without a backend, entries go to memory.
    pub fn build(self) -> AuditLogWriter {
        AuditLogWriter {
            backend: self
                .backend
                .unwrap_or_else(|| Arc::new(crate::MemoryBackend::new())),
            enabled: self.enabled,
        }
    }
}

impl Default for AuditLogWriterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
