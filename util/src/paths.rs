//! Storage-path helpers for uploaded files.
//!
//! All uploads live under the configured `STORAGE_ROOT`:
//!
//! ```text
//! {root}/assignments/{assignment_id}/            -> material files
//! {root}/assignments/{assignment_id}/submissions/{student_id}/
//! ```

use crate::config;
use std::path::PathBuf;

/// Root directory for all stored uploads.
pub fn storage_root() -> PathBuf {
    PathBuf::from(config::storage_root())
}

/// Directory holding the material files of one assignment.
pub fn assignment_dir(assignment_id: i64) -> PathBuf {
    storage_root()
        .join("assignments")
        .join(assignment_id.to_string())
}

/// Directory holding one student's submission files for an assignment.
pub fn submission_dir(assignment_id: i64, student_id: i64) -> PathBuf {
    assignment_dir(assignment_id)
        .join("submissions")
        .join(student_id.to_string())
}

/// Creates the directory (and parents) if missing, returning it for chaining.
pub fn ensure_dir(path: PathBuf) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_dir_nests_under_assignment() {
        let dir = submission_dir(7, 42);
        let s = dir.to_string_lossy();
        assert!(s.contains("assignments"));
        assert!(s.ends_with("7/submissions/42"));
    }
}
