use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::StorageError;

use super::journal::sibling;

/// An advisory lock guarding a journal against a second writer process.
///
/// The lock lives in a sibling `<journal>.lock` file and is released when
/// this struct is dropped (the underlying file descriptor is closed).
#[derive(Debug)]
pub struct JournalLock {
    _file: File,
    path: PathBuf,
}

impl JournalLock {
    /// Acquire the lock for the journal at `journal_path` without blocking.
    ///
    /// Returns `Err(StorageError::FileLocked)` if another handle holds it.
    pub fn acquire(journal_path: &Path) -> Result<Self, StorageError> {
        let path = sibling(journal_path, ".lock");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        file.try_lock_exclusive()
            .map_err(|_| StorageError::FileLocked)?;

        Ok(Self { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_second_acquire_fails() {
        let dir = tempdir().unwrap();
        let journal = dir.path().join("content.journal");

        let lock = JournalLock::acquire(&journal).unwrap();
        assert_eq!(lock.path(), dir.path().join("content.journal.lock"));
        match JournalLock::acquire(&journal) {
            Err(StorageError::FileLocked) => {}
            other => panic!("expected FileLocked, got {other:?}"),
        }
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = tempdir().unwrap();
        let journal = dir.path().join("content.journal");

        {
            let _lock = JournalLock::acquire(&journal).unwrap();
        }
        let _again = JournalLock::acquire(&journal).unwrap();
    }

    #[test]
    fn test_lock_file_never_aliases_journal() {
        let dir = tempdir().unwrap();
        let journal = dir.path().join("content.lock");

        let lock = JournalLock::acquire(&journal).unwrap();
        assert_eq!(lock.path(), dir.path().join("content.lock.lock"));
        assert_ne!(lock.path(), journal);
    }
}
