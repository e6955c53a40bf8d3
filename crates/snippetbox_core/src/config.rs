//! Store configuration.

use std::path::{Path, PathBuf};

/// Default location of the store file, relative to the working directory.
pub const DEFAULT_STORE_PATH: &str = "data/snippits.db";

/// Configuration for a [`crate::SnippetStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the store file.
    pub path: PathBuf,

    /// Whether every save is synced to disk before returning.
    pub sync_on_write: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORE_PATH),
            sync_on_write: true,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration for the store file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Sets whether every save is synced to disk.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Path of the advisory lock file next to the store file.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        sibling(&self.path, ".lock")
    }

    /// Path of the scratch file written during compaction.
    #[must_use]
    pub fn compaction_path(&self) -> PathBuf {
        sibling(&self.path, ".compact")
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
