//! Detection of decks held open by an office application.
//!
//! Office suites drop a `~$<file name>` owner file next to a document while
//! it is open. Both checks here are advisory.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Path of the owner file for `path`.
pub fn lock_artifact_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("~${}", name))
}

/// Whether an owner file exists next to `path`.
pub fn has_lock_artifact(path: &Path) -> bool {
    lock_artifact_path(path).exists()
}

/// Whether `path` exists but cannot be opened for read and write.
///
/// A missing file is not locked.
pub fn is_file_locked(path: &Path) -> bool {
    if !path.exists() {
        return false;
    }
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .is_err()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_lock_artifact_path() {
        assert_eq!(
            lock_artifact_path(Path::new("/decks/plan.pptx")),
            PathBuf::from("/decks/~$plan.pptx")
        );
        assert_eq!(
            lock_artifact_path(Path::new("plan.pptx")),
            PathBuf::from("~$plan.pptx")
        );
    }

    #[test]
    fn test_has_lock_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let deck = dir.path().join("plan.pptx");
        fs::write(&deck, b"PK").unwrap();
        assert!(!has_lock_artifact(&deck));

        fs::write(dir.path().join("~$plan.pptx"), b"owner").unwrap();
        assert!(has_lock_artifact(&deck));
    }

    #[test]
    fn test_is_file_locked() {
        let dir = tempfile::tempdir().unwrap();
        let deck = dir.path().join("plan.pptx");
        assert!(!is_file_locked(&deck));
        fs::write(&deck, b"PK").unwrap();
        assert!(!is_file_locked(&deck));
    }
}
