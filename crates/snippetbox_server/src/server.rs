//! Blocking HTTP listener.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::{HandlerContext, RequestHandler};
use crate::http::{Method, Request, Response};
use snippetbox_core::SnippetStore;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The snippet server.
///
/// [`handle`](Self::handle) runs one request in-process;
/// [`serve`](Self::serve) binds the configured address and feeds requests
/// from a pool of worker threads into the same handler.
#[derive(Debug)]
pub struct SnippetServer {
    handler: RequestHandler,
    context: Arc<HandlerContext>,
}

impl SnippetServer {
    /// Creates a new server over `store`.
    pub fn new(config: ServerConfig, store: SnippetStore) -> ServerResult<Self> {
        let context = Arc::new(HandlerContext::new(config, store)?);
        let handler = RequestHandler::new(Arc::clone(&context));
        Ok(Self { handler, context })
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.context.config
    }

    /// Underlying store.
    pub fn store(&self) -> &SnippetStore {
        &self.context.store
    }

    /// Handles one request.
    pub fn handle(&self, request: &Request) -> Response {
        self.handler.handle(request)
    }

    /// Binds the configured address and serves until the process exits.
    pub fn serve(&self) -> ServerResult<()> {
        let addr = self.context.config.bind_addr;
        let listener = tiny_http::Server::http(addr).map_err(|e| ServerError::Bind {
            addr: addr.to_string(),
            message: e.to_string(),
        })?;

        let workers = self.context.config.workers;
        info!(
            %addr,
            workers,
            store = %self.context.store.path().display(),
            "snippetbox listening"
        );

        std::thread::scope(|scope| {
            for worker in 0..workers {
                let listener = &listener;
                scope.spawn(move || self.worker_loop(worker, listener));
            }
        });
        Ok(())
    }

    fn worker_loop(&self, worker: usize, listener: &tiny_http::Server) {
        let mut failures = 0u32;
        loop {
            let mut incoming = match listener.recv() {
                Ok(rq) => {
                    failures = 0;
                    rq
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    let delay = recv_backoff(failures);
                    if failures == 1 || delay == MAX_RECV_BACKOFF {
                        warn!(worker, failures, error = %e, "http recv error");
                    }
                    std::thread::sleep(delay);
                    continue;
                }
            };

            let response = match self.read_request(&mut incoming) {
                Ok(request) => {
                    let response = self.handle(&request);
                    debug!(
                        worker,
                        method = %request.method,
                        path = %request.path,
                        status = response.status,
                        "request"
                    );
                    response
                }
                Err(e) => {
                    warn!(worker, error = %e, "unreadable request");
                    Response::text(400, "bad request\n")
                }
            };

            if let Err(e) = incoming.respond(into_tiny(response)) {
                debug!(worker, error = %e, "client went away");
            }
        }
    }

    /// Copies a `tiny_http` request into a plain [`Request`].
    ///
    /// At most `max_body_bytes + 1` body bytes are read, so an oversized
    /// body is still detectable by the handler.
    fn read_request(&self, incoming: &mut tiny_http::Request) -> ServerResult<Request> {
        let mut request = Request::new(Method::parse(incoming.method().as_str()), incoming.url());
        request.headers = incoming
            .headers()
            .iter()
            .map(|h| (h.field.to_string(), h.value.to_string()))
            .collect();

        let limit = self.context.config.max_body_bytes as u64 + 1;
        let mut body = Vec::new();
        incoming.as_reader().take(limit).read_to_end(&mut body)?;
        request.body = body;
        Ok(request)
    }
}

const MAX_RECV_BACKOFF: Duration = Duration::from_secs(1);

/// Pause after the `failures`-th consecutive `recv` error: 10ms doubling up
/// to [`MAX_RECV_BACKOFF`].
fn recv_backoff(failures: u32) -> Duration {
    let shift = failures.saturating_sub(1).min(16);
    Duration::from_millis(10u64 << shift).min(MAX_RECV_BACKOFF)
}

fn into_tiny(response: Response) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let mut out = tiny_http::Response::from_string(response.body).with_status_code(response.status);
    for (name, value) in &response.headers {
        match tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => out.add_header(header),
            Err(()) => warn!(header = %name, "dropping unencodable response header"),
        }
    }
    out
}
