//! Store inspection.

use serde::Serialize;

/// A snapshot of the store file's shape, reported by `snippetbox inspect`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StoreStats {
    /// Path of the store file.
    pub path: String,
    /// Whether the file exists yet.
    pub exists: bool,
    /// File size in bytes.
    pub file_size: u64,
    /// Complete records in the log.
    pub record_count: usize,
    /// Live snippets.
    pub snippet_count: usize,
    /// Superseded snippet versions still in the log.
    pub obsolete_versions: usize,
    /// Bytes after the last complete record (a torn write).
    pub torn_bytes: u64,
    /// Declared secondary indexes, by field.
    pub indexes: Vec<String>,
}
