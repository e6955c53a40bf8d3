//! The snippet data model.

use crate::id::SnippetId;
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};

/// A stored text or code submission.
///
/// A snippet is either fully present in the store or absent; there are no
/// partial or deleted states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    /// Assigned once, at creation.
    pub id: SnippetId,
    /// Short human-readable label.
    pub description: String,
    /// Free-form body. May be empty.
    #[serde(default)]
    pub contents: String,
    /// Time of first persistence.
    pub created_at: Timestamp,
}

impl Snippet {
    /// Creates a snippet with a fresh identifier, stamped with the current
    /// time.
    pub fn new(description: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            id: SnippetId::new(),
            description: description.into(),
            contents: contents.into(),
            created_at: Timestamp::now(),
        }
    }

    /// Returns the list-view projection of this snippet.
    #[must_use]
    pub fn summary(&self) -> Summary {
        Summary {
            id: self.id.to_string(),
            description: self.description.clone(),
            created_at: self.created_at,
        }
    }
}

/// A snippet without its contents, for list views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// The snippet id in its URL form.
    pub id: String,
    /// Short human-readable label.
    pub description: String,
    /// Time of first persistence.
    pub created_at: Timestamp,
}

/// One page of summaries, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SummaryResult {
    /// At most `page_size` summaries ordered by `created_at` descending.
    pub list: Vec<Summary>,
    /// Number of snippets in the whole collection at query time.
    pub total: usize,
    /// The offset that was requested.
    pub start: usize,
}

impl SummaryResult {
    /// Returns true if snippets exist beyond this page.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.start.saturating_add(self.list.len()) < self.total
    }

    /// Returns true if this page does not start at the newest snippet.
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.start > 0
    }
}
