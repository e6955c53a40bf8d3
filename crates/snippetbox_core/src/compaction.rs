//! Store compaction.
//!
//! The log keeps every version a put ever wrote. Compaction rewrites it
//! with the index declarations followed by the latest version of each
//! snippet, oldest first. It must not change what `get` or `find` return.

use crate::collection::Collection;
use crate::error::CoreResult;
use crate::record::StoreRecord;
use serde::Serialize;

/// Outcome of a compaction run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CompactionStats {
    /// Records in the log before compaction.
    pub input_records: usize,
    /// Records in the log after compaction.
    pub output_records: usize,
    /// Superseded snippet versions dropped.
    pub obsolete_removed: usize,
    /// File size before compaction.
    pub bytes_before: u64,
    /// File size after compaction.
    pub bytes_after: u64,
}

impl CompactionStats {
    /// Returns true if compaction would shrink the log.
    #[must_use]
    pub fn would_shrink(&self) -> bool {
        self.output_records < self.input_records || self.bytes_after < self.bytes_before
    }
}

/// Builds the compacted record sequence for `collection`.
pub(crate) fn compacted_records(collection: &Collection) -> CoreResult<Vec<StoreRecord>> {
    let mut out = Vec::with_capacity(collection.indexes().len() + collection.len());
    for definition in collection.indexes() {
        out.push(StoreRecord::declare_index(definition)?);
    }
    for snippet in collection.oldest_first() {
        out.push(StoreRecord::put(snippet)?);
    }
    Ok(out)
}

/// Computes statistics for compacting `collection` stored in `bytes_before` bytes.
pub(crate) fn plan(
    collection: &Collection,
    records: &[StoreRecord],
    bytes_before: u64,
) -> CompactionStats {
    CompactionStats {
        input_records: collection.records(),
        output_records: records.len(),
        obsolete_removed: collection.obsolete(),
        bytes_before,
        bytes_after: records.iter().map(|r| r.encoded_size() as u64).sum(),
    }
}
