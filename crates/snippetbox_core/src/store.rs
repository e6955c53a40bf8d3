//! The file-backed snippet store.

use crate::collection::Collection;
use crate::compaction::{self, CompactionStats};
use crate::config::StoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::id::SnippetId;
use crate::index::IndexDefinition;
use crate::lock::StoreLock;
use crate::record::{RecordKind, RecordScanner, StoreRecord};
use crate::snippet::{Snippet, SummaryResult};
use crate::stats::StoreStats;
use snippetbox_storage::{FileBackend, StorageBackend};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Durable storage for snippets.
///
/// A `SnippetStore` is only a configuration: every operation opens the
/// store file, takes the advisory lock (shared for reads, exclusive for
/// writes), replays the log, does its work and closes the file again.
/// Cloning it, or constructing several for the same path, is fine;
/// concurrent saves serialize on the lock and readers always see a
/// complete prefix of the log.
///
/// # Example
///
/// ```no_run
/// use snippetbox_core::{Snippet, SnippetStore, StoreConfig};
///
/// let store = SnippetStore::new(StoreConfig::default());
/// let snippet = Snippet::new("hello", "println!(\"hi\");");
/// store.save(&snippet)?;
///
/// assert_eq!(store.get(&snippet.id)?, Some(snippet));
/// let page = store.find(0, 10)?;
/// assert_eq!(page.total, 1);
/// # Ok::<(), snippetbox_core::CoreError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SnippetStore {
    config: StoreConfig,
}

impl SnippetStore {
    /// Creates a store with the given configuration. Touches no files.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Creates a store for the file at `path` with default settings.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(StoreConfig::new(path))
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the path of the store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Inserts `snippet`, or replaces the stored snippet with the same id.
    ///
    /// Declares the `created_at` index first if the file does not have it
    /// yet. A torn record left by an earlier crash is cut off before the
    /// append. Either the whole record lands or the call fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, read or written, or
    /// if it is corrupt.
    pub fn save(&self, snippet: &Snippet) -> CoreResult<()> {
        let _lock = StoreLock::exclusive(&self.config.lock_path())?;
        let mut backend = FileBackend::open_with_create_dirs(&self.config.path)?;

        let (valid_len, has_index) = scan_for_append(&backend)?;
        let size = backend.size()?;
        // The scanner only reports a torn tail shorter than the record its
        // header claims, which is capped at MAX_RECORD_SIZE.
        let torn = size - valid_len;
        if torn > 0 {
            warn!(
                path = %self.config.path.display(),
                torn_bytes = torn,
                "discarding torn record at end of store"
            );
            backend.truncate(valid_len)?;
        }

        let mut batch = Vec::new();
        if !has_index {
            batch.extend(StoreRecord::declare_index(&IndexDefinition::created_at())?.encode()?);
        }
        batch.extend(StoreRecord::put(snippet)?.encode()?);

        let offset = backend.append(&batch)?;
        if self.config.sync_on_write {
            backend.sync()?;
        }

        debug!(id = %snippet.id, offset, bytes = batch.len(), "saved snippet");
        Ok(())
    }

    /// Looks up a snippet by id. `Ok(None)` means no such snippet.
    ///
    /// # Errors
    ///
    /// Returns an error only if the file cannot be read or is corrupt.
    pub fn get(&self, id: &SnippetId) -> CoreResult<Option<Snippet>> {
        let Some(collection) = self.read_collection()? else {
            return Ok(None);
        };
        Ok(collection.get(id).cloned())
    }

    /// Returns up to `page_size` summaries, newest first, after skipping
    /// `start`, together with the size of the whole collection.
    ///
    /// Starting past the end yields an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if `start` is negative or
    /// `page_size` is not positive, without touching the file. Otherwise
    /// fails only on I/O errors or corruption.
    pub fn find(&self, start: i64, page_size: i64) -> CoreResult<SummaryResult> {
        if start < 0 {
            return Err(CoreError::invalid_argument(format!(
                "start must not be negative, got {start}"
            )));
        }
        if page_size <= 0 {
            return Err(CoreError::invalid_argument(format!(
                "page size must be positive, got {page_size}"
            )));
        }
        let start = usize::try_from(start)
            .map_err(|_| CoreError::invalid_argument(format!("start {start} is out of range")))?;
        let page_size = usize::try_from(page_size).map_err(|_| {
            CoreError::invalid_argument(format!("page size {page_size} is out of range"))
        })?;

        let Some(collection) = self.read_collection()? else {
            return Ok(SummaryResult {
                list: Vec::new(),
                total: 0,
                start,
            });
        };

        Ok(SummaryResult {
            list: collection.page(start, page_size),
            total: collection.len(),
            start,
        })
    }

    /// Returns the number of stored snippets.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is corrupt.
    pub fn count(&self) -> CoreResult<usize> {
        Ok(self.read_collection()?.map_or(0, |c| c.len()))
    }

    /// Describes the store file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is corrupt.
    pub fn inspect(&self) -> CoreResult<StoreStats> {
        let mut stats = StoreStats {
            path: self.config.path.display().to_string(),
            ..StoreStats::default()
        };
        if !self.config.path.exists() {
            return Ok(stats);
        }

        let _lock = StoreLock::shared(&self.config.lock_path())?;
        let backend = FileBackend::open(&self.config.path)?;
        let collection = Collection::load(&backend)?;

        stats.exists = true;
        stats.file_size = backend.size()?;
        stats.record_count = collection.records();
        stats.snippet_count = collection.len();
        stats.obsolete_versions = collection.obsolete();
        stats.torn_bytes = stats.file_size.saturating_sub(collection.valid_len());
        stats.indexes = collection
            .indexes()
            .iter()
            .map(|d| d.field.clone())
            .collect();
        Ok(stats)
    }

    /// Reports what [`SnippetStore::compact`] would do, without writing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is corrupt.
    pub fn plan_compaction(&self) -> CoreResult<CompactionStats> {
        if !self.config.path.exists() {
            return Ok(CompactionStats::default());
        }
        let _lock = StoreLock::shared(&self.config.lock_path())?;
        let backend = FileBackend::open(&self.config.path)?;
        let collection = Collection::load(&backend)?;
        let records = compaction::compacted_records(&collection)?;
        Ok(compaction::plan(&collection, &records, backend.size()?))
    }

    /// Rewrites the store file without superseded versions or torn bytes.
    ///
    /// The new log is written to a scratch file, synced, and renamed over
    /// the old one while the exclusive lock is held, so readers see either
    /// the old file or the new one.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, written or renamed, or
    /// is corrupt. On error the existing file is left in place.
    pub fn compact(&self) -> CoreResult<CompactionStats> {
        if !self.config.path.exists() {
            return Ok(CompactionStats::default());
        }
        let _lock = StoreLock::exclusive(&self.config.lock_path())?;

        let backend = FileBackend::open(&self.config.path)?;
        let collection = Collection::load(&backend)?;
        let records = compaction::compacted_records(&collection)?;
        let stats = compaction::plan(&collection, &records, backend.size()?);
        drop(backend);

        if !stats.would_shrink() {
            debug!(path = %self.config.path.display(), "store already compact");
            return Ok(stats);
        }

        let scratch = self.config.compaction_path();
        {
            let mut out = FileBackend::create_truncated(&scratch)?;
            let mut bytes = Vec::new();
            for record in &records {
                bytes.extend(record.encode()?);
            }
            out.append(&bytes)?;
            out.sync()?;
        }
        fs::rename(&scratch, &self.config.path)?;

        debug!(
            path = %self.config.path.display(),
            bytes_before = stats.bytes_before,
            bytes_after = stats.bytes_after,
            obsolete_removed = stats.obsolete_removed,
            "compacted store"
        );
        Ok(stats)
    }

    fn read_collection(&self) -> CoreResult<Option<Collection>> {
        if !self.config.path.exists() {
            return Ok(None);
        }
        let _lock = StoreLock::shared(&self.config.lock_path())?;
        let backend = FileBackend::open(&self.config.path)?;
        Ok(Some(Collection::load(&backend)?))
    }
}

/// Finds the end of the intact log and whether `created_at` is declared,
/// decoding only index declarations.
fn scan_for_append(backend: &dyn StorageBackend) -> CoreResult<(u64, bool)> {
    let data = backend.read_all()?;
    let mut scanner = RecordScanner::new(&data);
    let mut has_index = false;

    for item in &mut scanner {
        let (offset, record) = item?;
        if record.kind == RecordKind::DeclareIndex && !has_index {
            has_index = record.index_definition(offset)?.field == IndexDefinition::CREATED_AT;
        }
    }

    Ok((scanner.valid_len(), has_index))
}
