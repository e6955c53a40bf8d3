//! New-snippet form parsing and validation.

use snippetbox_core::Snippet;
use std::collections::{BTreeMap, HashMap};

/// Longest accepted description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 100;

/// The fields of the new-snippet form plus any validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSnippetForm {
    /// Short description.
    pub description: String,
    /// Snippet body.
    pub contents: String,
    /// Field name to message, filled by [`validate`](Self::validate).
    pub errors: BTreeMap<&'static str, String>,
}

impl NewSnippetForm {
    /// Creates a form from its two fields.
    pub fn new(description: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            contents: contents.into(),
            errors: BTreeMap::new(),
        }
    }

    /// Picks the form fields out of a decoded body. Missing fields are empty.
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let field = |name: &str| fields.get(name).cloned().unwrap_or_default();
        Self::new(field("description"), field("contents"))
    }

    /// Runs the field rules. Returns true when the form is acceptable.
    pub fn validate(&mut self) -> bool {
        self.errors.clear();

        if self.description.trim().is_empty() {
            self.errors
                .insert("description", "This field cannot be blank".into());
        } else if self.description.chars().count() > MAX_DESCRIPTION_CHARS {
            self.errors.insert(
                "description",
                format!("This field cannot be more than {MAX_DESCRIPTION_CHARS} characters long"),
            );
        }

        if self.contents.trim().is_empty() {
            self.errors
                .insert("contents", "This field cannot be blank".into());
        }

        self.errors.is_empty()
    }

    /// Message for one field, if it failed.
    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    /// Builds the snippet to persist.
    pub fn to_snippet(&self) -> Snippet {
        Snippet::new(self.description.trim(), self.contents.as_str())
    }
}
