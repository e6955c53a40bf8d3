//! The `CreatedAt` secondary index.

use crate::id::SnippetId;
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A secondary index declaration, persisted in the store file.
///
/// Declarations are idempotent: the store writes one the first time it
/// sees the index missing and never again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Indexed document field.
    pub field: String,
    /// Whether the natural scan order is descending.
    pub descending: bool,
}

impl IndexDefinition {
    /// Name of the creation time field.
    pub const CREATED_AT: &'static str = "created_at";

    /// The newest-first index on `created_at`.
    #[must_use]
    pub fn created_at() -> Self {
        Self {
            field: Self::CREATED_AT.to_string(),
            descending: true,
        }
    }
}

/// Ordered index over `(created_at, id)`.
///
/// The id component makes keys unique, so snippets created in the same
/// millisecond still have a total, stable order and pagination never
/// duplicates or skips an entry.
#[derive(Debug, Default, Clone)]
pub struct CreatedAtIndex {
    entries: BTreeSet<(Timestamp, SnippetId)>,
}

impl CreatedAtIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry. Returns false if it was already present.
    pub fn insert(&mut self, created_at: Timestamp, id: SnippetId) -> bool {
        self.entries.insert((created_at, id))
    }

    /// Removes an entry. Returns false if it was absent.
    pub fn remove(&mut self, created_at: Timestamp, id: SnippetId) -> bool {
        self.entries.remove(&(created_at, id))
    }

    /// Number of indexed snippets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns up to `limit` ids, newest first, after skipping `start`.
    #[must_use]
    pub fn newest_first(&self, start: usize, limit: usize) -> Vec<SnippetId> {
        self.entries
            .iter()
            .rev()
            .skip(start)
            .take(limit)
            .map(|(_, id)| *id)
            .collect()
    }

    /// Returns every id, oldest first.
    pub fn oldest_first(&self) -> impl Iterator<Item = SnippetId> + '_ {
        self.entries.iter().map(|(_, id)| *id)
    }
}
