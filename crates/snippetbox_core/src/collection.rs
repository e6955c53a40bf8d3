//! In-memory view of the snippet collection, rebuilt from the store log.

use crate::error::CoreResult;
use crate::id::SnippetId;
use crate::index::{CreatedAtIndex, IndexDefinition};
use crate::record::{RecordKind, RecordScanner};
use crate::snippet::{Snippet, Summary};
use snippetbox_storage::StorageBackend;
use std::collections::HashMap;

/// The collection as of the last complete record in the log.
#[derive(Debug, Default)]
pub(crate) struct Collection {
    documents: HashMap<SnippetId, Snippet>,
    by_created_at: CreatedAtIndex,
    indexes: Vec<IndexDefinition>,
    /// Records replayed, including superseded versions.
    records: usize,
    /// Put records replaced by a later put for the same id.
    obsolete: usize,
    /// End of the intact record prefix.
    valid_len: u64,
}

impl Collection {
    /// Replays every record held by `backend`.
    pub(crate) fn load(backend: &dyn StorageBackend) -> CoreResult<Self> {
        let data = backend.read_all()?;
        let mut collection = Self::default();
        let mut scanner = RecordScanner::new(&data);

        for item in &mut scanner {
            let (offset, record) = item?;
            collection.records += 1;
            match record.kind {
                RecordKind::Put => collection.apply_put(record.snippet(offset)?),
                RecordKind::DeclareIndex => {
                    collection.declare(record.index_definition(offset)?);
                }
            }
        }

        collection.valid_len = scanner.valid_len();
        Ok(collection)
    }

    /// Inserts `snippet`, replacing any earlier version with the same id.
    pub(crate) fn apply_put(&mut self, snippet: Snippet) {
        if let Some(previous) = self.documents.remove(&snippet.id) {
            self.by_created_at.remove(previous.created_at, previous.id);
            self.obsolete += 1;
        }
        self.by_created_at.insert(snippet.created_at, snippet.id);
        self.documents.insert(snippet.id, snippet);
    }

    fn declare(&mut self, definition: IndexDefinition) {
        if !self.indexes.contains(&definition) {
            self.indexes.push(definition);
        }
    }

    pub(crate) fn get(&self, id: &SnippetId) -> Option<&Snippet> {
        self.documents.get(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.documents.len()
    }

    /// Summaries for one page, newest first.
    pub(crate) fn page(&self, start: usize, limit: usize) -> Vec<Summary> {
        self.by_created_at
            .newest_first(start, limit)
            .iter()
            .filter_map(|id| self.documents.get(id))
            .map(Snippet::summary)
            .collect()
    }

    /// Live documents, oldest first.
    pub(crate) fn oldest_first(&self) -> impl Iterator<Item = &Snippet> + '_ {
        self.by_created_at
            .oldest_first()
            .filter_map(|id| self.documents.get(&id))
    }

    pub(crate) fn indexes(&self) -> &[IndexDefinition] {
        &self.indexes
    }

    pub(crate) fn records(&self) -> usize {
        self.records
    }

    pub(crate) fn obsolete(&self) -> usize {
        self.obsolete
    }

    pub(crate) fn valid_len(&self) -> u64 {
        self.valid_len
    }
}
