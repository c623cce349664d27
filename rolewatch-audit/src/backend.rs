//! Audit log storage backends

use crate::AuditResult;
use crate::lock::path_lock;
use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Audit log storage backend trait
pub trait AuditBackend: Send + Sync {
    /// Append rendered lines, in order.
    fn append(&self, lines: &[String]) -> AuditResult<()>;

    /// Where the lines go, for log messages.
    fn describe(&self) -> String;
}

/// File-based audit backend
///
/// Appends one line per entry, creating the file and its directory when
/// missing. Existing content is never rewritten.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Create a new file backend
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rolewatch_audit::*;
    ///
    /// let backend = FileBackend::new("logs/role-changes.log");
    /// ```
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditBackend for FileBackend {
    fn append(&self, lines: &[String]) -> AuditResult<()> {
        if lines.is_empty() {
            return Ok(());
        }

        let lock = path_lock(&self.path);
        let _guard = lock.lock();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        for line in lines {
            file.write_all(line.as_bytes())?;
            file.write_all(b"\n")?;
        }
        file.flush()?;

        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Memory backend for testing
///
/// Stores audit lines in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryBackend {
    /// Create a new memory backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all lines
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Clear all lines
    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl AuditBackend for MemoryBackend {
    fn append(&self, lines: &[String]) -> AuditResult<()> {
        self.lines.lock().extend(lines.iter().cloned());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_backend_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("role-changes.log");
        let backend = FileBackend::new(&path);

        backend.append(&["one".to_string()]).unwrap();
        backend
            .append(&["two".to_string(), "three".to_string()])
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\nthree\n");
    }

    #[test]
    fn test_file_backend_empty_batch_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("role-changes.log");

        FileBackend::new(&path).append(&[]).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_memory_backend() {
        let backend = MemoryBackend::new();
        backend.append(&["a".to_string()]).unwrap();
        assert_eq!(backend.lines(), vec!["a"]);

        backend.clear();
        assert!(backend.lines().is_empty());
    }
}
