//! Error types for SnippetBox core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in store operations.
///
/// A missing snippet is not an error: [`crate::SnippetStore::get`] reports
/// it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] snippetbox_storage::StorageError),

    /// I/O error outside the backend (lock file, rename).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A document could not be encoded to CBOR.
    #[error("encoding failed: {message}")]
    Encode {
        /// Description of the failure.
        message: String,
    },

    /// A document could not be decoded from CBOR.
    #[error("decoding failed at offset {offset}: {message}")]
    Decode {
        /// Offset of the record holding the document.
        offset: u64,
        /// Description of the failure.
        message: String,
    },

    /// The store file is structurally damaged.
    #[error("store corrupted at offset {offset}: {message}")]
    Corrupted {
        /// Offset of the damaged record.
        offset: u64,
        /// Description of the damage.
        message: String,
    },

    /// A record's checksum does not match its contents.
    #[error("checksum mismatch at offset {offset}: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Offset of the record.
        offset: u64,
        /// Stored checksum.
        expected: u32,
        /// Computed checksum.
        actual: u32,
    },

    /// A caller passed an argument outside the operation's contract.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the violation.
        message: String,
    },
}

impl CoreError {
    /// Creates an encode error.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    /// Creates a decode error for the record at `offset`.
    pub fn decode(offset: u64, message: impl Into<String>) -> Self {
        Self::Decode {
            offset,
            message: message.into(),
        }
    }

    /// Creates a corruption error for the record at `offset`.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::Corrupted {
            offset,
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Returns true for caller mistakes, false for storage failures.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}
