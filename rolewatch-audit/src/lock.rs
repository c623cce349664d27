//! Process-wide locks keyed by log file path
//!
//! Appends and rotation of the same log file take the same lock, so a
//! rotation never renames a file halfway through an append.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

static PATH_LOCKS: Lazy<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Lock shared by every writer and rotator of `path`.
pub fn path_lock(path: &Path) -> Arc<Mutex<()>> {
    let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    PATH_LOCKS.lock().entry(key).or_default().clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_path_same_lock() {
        let a = path_lock(Path::new("logs/role-changes.log"));
        let b = path_lock(Path::new("logs/role-changes.log"));
        let c = path_lock(Path::new("logs/audit-1.log"));

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
