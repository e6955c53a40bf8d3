//! # SnippetBox Server
//!
//! Everything between an HTTP connection and the snippet store:
//!
//! - [`MutationGuard`] - HMAC-SHA256 anti-forgery tokens bound to a session
//! - [`Request`] / [`Response`] - plain values the handlers work on
//! - [`RequestHandler`] - one function per route, `Request -> Response`
//! - [`render`] - pure functions from data to HTML
//! - [`SnippetServer`] - a blocking `tiny_http` listener with worker threads
//!
//! # Write path
//!
//! ```text
//! POST /snippet/ -> MutationGuard::validate -> NewSnippetForm::validate
//!                -> Snippet::new -> SnippetStore::save -> 303 /snippet/{id}
//! ```
//!
//! A request the guard rejects never reaches the store.
//!
//! # Example
//!
//! ```no_run
//! use snippetbox_core::SnippetStore;
//! use snippetbox_server::{ServerConfig, SnippetServer};
//!
//! let store = SnippetStore::open("data/snippits.db");
//! let server = SnippetServer::new(ServerConfig::default(), store).unwrap();
//! server.serve().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod forms;
mod guard;
mod handler;
mod http;
pub mod render;
mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use forms::{NewSnippetForm, MAX_DESCRIPTION_CHARS};
pub use guard::{
    FormSubmission, GuardConfig, GuardError, GuardResult, MutationGuard, RejectReason, SessionId,
    TokenPair, SESSION_COOKIE, TOKEN_FIELD,
};
pub use handler::{HandlerContext, RequestHandler};
pub use http::{Method, Request, Response};
pub use server::SnippetServer;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
