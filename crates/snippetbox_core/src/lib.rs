//! # SnippetBox Core
//!
//! The persistent side of SnippetBox:
//!
//! - [`SnippetId`] - time-sortable, URL-safe identifiers
//! - [`Snippet`], [`Summary`], [`SummaryResult`] - the data model
//! - [`SnippetStore`] - a file-backed document collection with a
//!   `CreatedAt` index, point lookups, newest-first pagination and upserts
//!
//! ## File layout
//!
//! ```text
//! data/
//! ├─ snippits.db       # append-only log of framed CBOR records
//! └─ snippits.db.lock  # advisory lock (shared for reads, exclusive for writes)
//! ```
//!
//! Every store operation opens the file, takes the lock, works, and closes
//! the file again. No handle outlives a call.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod codec;
mod collection;
mod compaction;
mod config;
mod error;
mod id;
mod index;
mod lock;
mod record;
mod snippet;
mod stats;
mod store;
mod types;

pub use compaction::CompactionStats;
pub use config::StoreConfig;
pub use error::{CoreError, CoreResult};
pub use id::SnippetId;
pub use index::{CreatedAtIndex, IndexDefinition};
pub use record::{RecordKind, StoreRecord};
pub use snippet::{Snippet, Summary, SummaryResult};
pub use stats::StoreStats;
pub use store::SnippetStore;
pub use types::Timestamp;

/// Crate version, reported by `snippetbox version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
