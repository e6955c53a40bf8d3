//! Error types for the server.

use crate::guard::GuardError;
use snippetbox_core::CoreError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while handling a request or running the server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Malformed request (bad query string, bad form body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The anti-forgery check failed (nothing was written), or the guard
    /// could not be built.
    #[error("guard: {0}")]
    Guard(#[from] GuardError),

    /// No route or no snippet for this path.
    #[error("not found")]
    NotFound,

    /// The route exists but not for this method.
    #[error("method not allowed")]
    MethodNotAllowed {
        /// Methods the route accepts, for the `Allow` header.
        allow: &'static str,
    },

    /// The request body exceeds the configured limit.
    #[error("request body larger than {limit} bytes")]
    PayloadTooLarge {
        /// Configured limit.
        limit: usize,
    },

    /// Store failure.
    #[error("store error: {0}")]
    Store(#[from] CoreError),

    /// The server configuration cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The listener could not bind.
    #[error("cannot bind {addr}: {message}")]
    Bind {
        /// Requested address.
        addr: String,
        /// Reason reported by the listener.
        message: String,
    },

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        match self {
            ServerError::InvalidRequest(_)
            | ServerError::NotFound
            | ServerError::MethodNotAllowed { .. }
            | ServerError::PayloadTooLarge { .. } => true,
            ServerError::Guard(e) => e.reason().is_some(),
            ServerError::Store(e) => e.is_invalid_argument(),
            ServerError::InvalidConfig(_) | ServerError::Bind { .. } | ServerError::Io(_) => false,
        }
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::InvalidRequest(_) => 400,
            ServerError::Guard(e) if e.reason().is_some() => 400,
            ServerError::NotFound => 404,
            ServerError::MethodNotAllowed { .. } => 405,
            ServerError::PayloadTooLarge { .. } => 413,
            ServerError::Store(e) if e.is_invalid_argument() => 400,
            _ => 500,
        }
    }
}
