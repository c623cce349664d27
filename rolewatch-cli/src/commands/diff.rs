//! Print the role changes between two snapshot files.

use super::local_now;
use crate::error::CliResult;
use rolewatch_audit::{diff, parse_snapshot_file, render_events};
use std::path::Path;

/// Diff command
pub fn execute(old: &Path, new: &Path, actor: Option<&str>) -> CliResult<()> {
    for line in lines(old, new, actor)? {
        println!("{}", line);
    }
    Ok(())
}

fn lines(old: &Path, new: &Path, actor: Option<&str>) -> CliResult<Vec<String>> {
    let before = parse_snapshot_file(old)?;
    let after = parse_snapshot_file(new)?;
    Ok(render_events(&diff(&before, &after, actor, local_now())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_lines_for_deleted_role() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.xml");
        let new = dir.path().join("new.xml");
        fs::write(
            &old,
            r#"<hudson><roleMap type="projectRoles"><role name="dev" pattern="x"/></roleMap></hudson>"#,
        )
        .unwrap();
        fs::write(&new, r#"<hudson><roleMap type="projectRoles"/></hudson>"#).unwrap();

        let lines = lines(&old, &new, Some("alice")).unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("] project role deleted: 'dev' by 'alice'"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.xml");
        assert!(lines(&missing, &missing, None).is_err());
    }
}
