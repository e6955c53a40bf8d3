//! Advisory locking of the store file.
//!
//! The lock lives in a sibling `<store>.lock` file rather than on the store
//! file itself, so compaction can rename a new store file into place while
//! the lock is held.

use crate::error::CoreResult;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::Path;

/// A held lock on the store. Released on drop.
#[derive(Debug)]
pub(crate) struct StoreLock {
    file: File,
}

impl StoreLock {
    /// Blocks until a shared (reader) lock is held.
    pub(crate) fn shared(lock_path: &Path) -> CoreResult<Self> {
        let file = open_lock_file(lock_path)?;
        file.lock_shared()?;
        Ok(Self { file })
    }

    /// Blocks until the exclusive (writer) lock is held.
    pub(crate) fn exclusive(lock_path: &Path) -> CoreResult<Self> {
        let file = open_lock_file(lock_path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn open_lock_file(lock_path: &Path) -> CoreResult<File> {
    if let Some(parent) = lock_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)?)
}
