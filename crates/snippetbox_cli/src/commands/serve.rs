//! Serve command implementation.

use snippetbox_core::{SnippetStore, StoreConfig};
use snippetbox_server::{GuardConfig, ServerConfig, SnippetServer};
use std::net::SocketAddr;
use std::path::Path;
use tracing::warn;

/// Flags of the `serve` command.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// Listen address.
    pub addr: SocketAddr,
    /// Home page size.
    pub page_size: usize,
    /// Worker threads.
    pub workers: usize,
    /// Token key; random when absent.
    pub secret: Option<String>,
    /// Site title.
    pub title: String,
}

impl ServeOptions {
    /// Maps the flags onto a server configuration.
    pub fn server_config(&self) -> ServerConfig {
        let guard = match &self.secret {
            Some(secret) => GuardConfig::new(secret.as_bytes().to_vec()),
            None => {
                warn!("no --secret given; forms issued before a restart will be rejected after it");
                GuardConfig::random()
            }
        };
        ServerConfig::new(self.addr)
            .with_page_size(self.page_size)
            .with_workers(self.workers)
            .with_site_title(self.title.as_str())
            .with_guard(guard)
    }
}

/// Runs the serve command. Blocks until the process is stopped.
pub fn run(path: &Path, options: ServeOptions) -> Result<(), Box<dyn std::error::Error>> {
    let store = SnippetStore::new(StoreConfig::new(path));
    let server = SnippetServer::new(options.server_config(), store)?;
    server.serve()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_map_onto_config() {
        let options = ServeOptions {
            addr: "0.0.0.0:8080".parse().unwrap(),
            page_size: 25,
            workers: 2,
            secret: Some("s3cret".into()),
            title: "Pastes".into(),
        };
        let config = options.server_config();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.page_size, 25);
        assert_eq!(config.workers, 2);
        assert_eq!(config.site_title, "Pastes");
    }
}
