//! # SnippetBox Storage
//!
//! The byte-level layer under the snippet store.
//!
//! Backends are **opaque append-only byte stores**: they never interpret
//! what they hold. Record framing, checksums and the snippet document
//! format all belong to `snippetbox_core`.
//!
//! ## Available Backends
//!
//! - [`FileBackend`] - a single file on local disk
//! - [`InMemoryBackend`] - a `Vec<u8>`, for tests
//!
//! ## Example
//!
//! ```rust
//! use snippetbox_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"snippet").unwrap();
//! assert_eq!(backend.read_at(offset, 7).unwrap(), b"snippet");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
