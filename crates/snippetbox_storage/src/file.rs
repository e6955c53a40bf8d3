//! File-based storage backend.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A storage backend over a single file.
///
/// # Durability
///
/// `sync()` calls `File::sync_all()`; nothing appended before a successful
/// `sync()` is lost on process termination.
///
/// # Example
///
/// ```no_run
/// use snippetbox_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("data/snippits.db")).unwrap();
/// backend.append(b"record").unwrap();
/// backend.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    handle: Mutex<Handle>,
}

/// The open file and its logical length, guarded together so a reader never
/// sees a length the file has not reached yet.
#[derive(Debug)]
struct Handle {
    file: File,
    len: u64,
}

impl FileBackend {
    /// Opens or creates a file backend at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        Self::with_options(path, false)
    }

    /// Opens or creates a file backend, creating parent directories first.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot
    /// be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)?,
            _ => {}
        }
        Self::open(path)
    }

    /// Creates an empty file at `path`, replacing whatever was there.
    ///
    /// Used for the scratch file written during compaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create_truncated(path: &Path) -> StorageResult<Self> {
        Self::with_options(path, true)
    }

    fn with_options(path: &Path, truncate: bool) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(truncate)
            .open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            path: path.to_owned(),
            handle: Mutex::new(Handle { file, len }),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for FileBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let mut handle = self.handle.lock();
        let size = handle.len;
        let fits = offset
            .checked_add(len as u64)
            .is_some_and(|end| end <= size);
        if !fits {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        let mut out = Vec::with_capacity(len);
        if len > 0 {
            handle.file.seek(SeekFrom::Start(offset))?;
            (&mut handle.file).take(len as u64).read_to_end(&mut out)?;
        }
        if out.len() < len {
            // Shrunk underneath us by another process.
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        Ok(out)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let handle = self.handle.get_mut();
        let at = handle.len;
        if !data.is_empty() {
            handle.file.seek(SeekFrom::Start(at))?;
            handle.file.write_all(data)?;
            handle.len = at + data.len() as u64;
        }
        Ok(at)
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.handle.lock().len)
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(self.handle.get_mut().file.sync_all()?)
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let handle = self.handle.get_mut();
        if new_size > handle.len {
            return Err(StorageError::TruncateBeyondEnd {
                requested: new_size,
                size: handle.len,
            });
        }
        handle.file.set_len(new_size)?;
        handle.file.sync_all()?;
        handle.len = new_size;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snippits.db");

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 0);
        assert!(path.exists());
        assert_eq!(backend.path(), path);
    }

    #[test]
    fn append_returns_offsets() {
        let dir = tempdir().unwrap();
        let mut backend = FileBackend::open(&dir.path().join("snippits.db")).unwrap();

        assert_eq!(backend.append(b"hello").unwrap(), 0);
        assert_eq!(backend.append(b" world").unwrap(), 5);
        assert_eq!(backend.read_all().unwrap(), b"hello world");
        assert_eq!(backend.read_at(6, 5).unwrap(), b"world");
    }

    #[test]
    fn read_past_end_fails() {
        let dir = tempdir().unwrap();
        let mut backend = FileBackend::open(&dir.path().join("snippits.db")).unwrap();
        backend.append(b"hello").unwrap();

        let result = backend.read_at(3, 5);
        assert!(matches!(result, Err(StorageError::ReadPastEnd { .. })));
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snippits.db");

        {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.append(b"persistent").unwrap();
            backend.sync().unwrap();
        }

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 10);
        assert_eq!(backend.read_all().unwrap(), b"persistent");
    }

    #[test]
    fn truncate_cuts_tail_and_next_append_follows() {
        let dir = tempdir().unwrap();
        let mut backend = FileBackend::open(&dir.path().join("snippits.db")).unwrap();
        backend.append(b"keep-torn").unwrap();

        backend.truncate(4).unwrap();
        assert_eq!(backend.append(b"!").unwrap(), 4);
        assert_eq!(backend.read_all().unwrap(), b"keep!");

        let err = backend.truncate(100).unwrap_err();
        assert!(matches!(err, StorageError::TruncateBeyondEnd { .. }));
    }

    #[test]
    fn create_dirs_and_truncated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("snippits.db");

        let mut backend = FileBackend::open_with_create_dirs(&path).unwrap();
        backend.append(b"old").unwrap();
        drop(backend);

        let fresh = FileBackend::create_truncated(&path).unwrap();
        assert_eq!(fresh.size().unwrap(), 0);
    }
}
