//! Server configuration.

use crate::error::{ServerError, ServerResult};
use crate::guard::GuardConfig;
use std::net::SocketAddr;

/// Configuration for the snippet server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Number of worker threads pulling requests off the listener.
    pub workers: usize,
    /// Snippets per page on the home page.
    pub page_size: usize,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
    /// Site name shown in every page.
    pub site_title: String,
    /// Anti-forgery settings.
    pub guard: GuardConfig,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            workers: 4,
            page_size: 10,
            max_body_bytes: 64 * 1024,
            site_title: "Snippetbox".into(),
            guard: GuardConfig::random(),
        }
    }

    /// Sets the worker thread count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Checks the settings a server cannot run with.
    pub fn validate(&self) -> ServerResult<()> {
        if self.page_size == 0 {
            return Err(ServerError::InvalidConfig("page size must be positive".into()));
        }
        if self.workers == 0 {
            return Err(ServerError::InvalidConfig("worker count must be positive".into()));
        }
        Ok(())
    }

    /// Sets the request body limit.
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Sets the site title.
    pub fn with_site_title(mut self, title: impl Into<String>) -> Self {
        self.site_title = title.into();
        self
    }

    /// Sets the anti-forgery configuration.
    pub fn with_guard(mut self, guard: GuardConfig) -> Self {
        self.guard = guard;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 4000)))
    }
}
