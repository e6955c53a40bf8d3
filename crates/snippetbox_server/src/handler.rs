//! Route handlers.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::forms::NewSnippetForm;
use crate::guard::{FormSubmission, MutationGuard, SessionId, SESSION_COOKIE, TOKEN_FIELD};
use crate::http::{Method, Request, Response};
use crate::render::{self, Layout};
use snippetbox_core::{SnippetId, SnippetStore};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Everything a handler needs, shared across worker threads.
#[derive(Debug)]
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    /// Snippet store.
    pub store: SnippetStore,
    /// Anti-forgery guard keyed from `config.guard`.
    pub guard: MutationGuard,
}

impl HandlerContext {
    /// Creates a handler context.
    pub fn new(config: ServerConfig, store: SnippetStore) -> ServerResult<Self> {
        config.validate()?;
        let guard = MutationGuard::new(config.guard.clone())?;
        Ok(Self {
            config,
            store,
            guard,
        })
    }
}

/// Maps requests to route functions.
#[derive(Debug, Clone)]
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Shared context.
    pub fn context(&self) -> &HandlerContext {
        &self.context
    }

    /// Handles one request. Errors become error pages.
    pub fn handle(&self, request: &Request) -> Response {
        match self.dispatch(request) {
            Ok(response) => response,
            Err(err) => self.error_response(request, &err),
        }
    }

    fn dispatch(&self, request: &Request) -> ServerResult<Response> {
        let readable = matches!(request.method, Method::Get | Method::Head);
        match request.path.as_str() {
            "/" if readable => self.home(request),
            "/" => Err(ServerError::MethodNotAllowed { allow: "GET, HEAD" }),
            "/health" if readable => Ok(Response::text(200, "OK")),
            "/health" => Err(ServerError::MethodNotAllowed { allow: "GET, HEAD" }),
            "/snippet" | "/snippet/" => match request.method {
                Method::Get | Method::Head => self.new_snippet(request),
                Method::Post => self.create_snippet(request),
                Method::Other(_) => Err(ServerError::MethodNotAllowed {
                    allow: "GET, HEAD, POST",
                }),
            },
            path => match path.strip_prefix("/snippet/") {
                Some(id) if readable => self.show_snippet(request, id),
                Some(_) => Err(ServerError::MethodNotAllowed { allow: "GET, HEAD" }),
                None => Err(ServerError::NotFound),
            },
        }
    }

    /// `GET /` - newest snippets, paginated by `?start=N`.
    pub fn home(&self, request: &Request) -> ServerResult<Response> {
        let start = match request.query_param("start") {
            None => 0,
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(start) if start >= 0 => start,
                _ => {
                    return Err(ServerError::InvalidRequest(format!(
                        "start must be a non-negative integer, got {raw:?}"
                    )))
                }
            },
        };
        let page_size = i64::try_from(self.context.config.page_size).unwrap_or(i64::MAX);

        let result = self.context.store.find(start, page_size)?;
        let html = render::home_page(&result, &self.layout(request));
        Ok(Response::html(200, html))
    }

    /// `GET /snippet/` - the new-snippet form with a fresh token.
    ///
    /// A request without a usable session cookie gets a new session.
    pub fn new_snippet(&self, request: &Request) -> ServerResult<Response> {
        let existing = request.cookie(SESSION_COOKIE).and_then(SessionId::parse);
        let session = existing.unwrap_or_default();
        let token = self.context.guard.issue_token(&session);

        let html = render::new_page(&NewSnippetForm::default(), &token, &self.layout(request));
        let response = Response::html(200, html);
        Ok(match existing {
            Some(_) => response,
            None => response.with_header("Set-Cookie", session_cookie(&session)),
        })
    }

    /// `POST /snippet/` - guard, validate, save, redirect.
    ///
    /// The store is only touched after the guard accepts the submission and
    /// the form validates.
    pub fn create_snippet(&self, request: &Request) -> ServerResult<Response> {
        let limit = self.context.config.max_body_bytes;
        if request.body.len() > limit {
            return Err(ServerError::PayloadTooLarge { limit });
        }

        let fields = request.form();
        let submission = FormSubmission::new(
            request.cookie(SESSION_COOKIE),
            fields.get(TOKEN_FIELD).map(String::as_str),
        );
        let session = self.context.guard.validate(&submission)?;

        let mut form = NewSnippetForm::from_fields(&fields);
        if !form.validate() {
            debug!(errors = ?form.errors, "new snippet form rejected");
            let token = self.context.guard.issue_token(&session);
            let html = render::new_page(&form, &token, &self.layout(request));
            return Ok(Response::html(422, html));
        }

        let snippet = form.to_snippet();
        self.context.store.save(&snippet)?;
        info!(id = %snippet.id, "snippet created");

        Ok(Response::see_other(format!("/snippet/{}", snippet.id)))
    }

    /// `GET /snippet/{id}`.
    pub fn show_snippet(&self, request: &Request, id: &str) -> ServerResult<Response> {
        let id = SnippetId::parse(id).ok_or(ServerError::NotFound)?;
        let snippet = self.context.store.get(&id)?.ok_or(ServerError::NotFound)?;
        let html = render::show_page(&snippet, &self.layout(request));
        Ok(Response::html(200, html))
    }

    fn layout(&self, request: &Request) -> Layout {
        let config = &self.context.config;
        Layout::new(
            config.site_title.as_str(),
            request.path.as_str(),
            config.page_size,
        )
    }

    fn error_response(&self, request: &Request, err: &ServerError) -> Response {
        let layout = self.layout(request);
        let status = err.status_code();

        let body = if err.is_server_error() {
            error!(method = %request.method, path = %request.path, error = %err, "request failed");
            render::error_page(status, "Internal Server Error", &layout)
        } else {
            match err {
                ServerError::Guard(_) => {
                    warn!(path = %request.path, error = %err, "write rejected");
                }
                _ => debug!(method = %request.method, path = %request.path, error = %err, "client error"),
            }
            match err {
                ServerError::NotFound => render::not_found_page(&layout),
                _ => render::error_page(status, &err.to_string(), &layout),
            }
        };

        let response = Response::html(status, body);
        match err {
            ServerError::MethodNotAllowed { allow } => response.with_header("Allow", *allow),
            _ => response,
        }
    }
}

fn session_cookie(session: &SessionId) -> String {
    format!("{SESSION_COOKIE}={session}; Path=/; HttpOnly; SameSite=Lax")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::GuardConfig;
    use snippetbox_core::Snippet;
    use tempfile::TempDir;

    fn create_handler(dir: &TempDir) -> RequestHandler {
        let config = ServerConfig::default()
            .with_page_size(2)
            .with_guard(GuardConfig::new(b"handler-test-secret".to_vec()));
        let store = SnippetStore::open(dir.path().join("snippits.db"));
        RequestHandler::new(Arc::new(HandlerContext::new(config, store).unwrap()))
    }

    #[test]
    fn health() {
        let dir = TempDir::new().unwrap();
        let resp = create_handler(&dir).handle(&Request::get("/health"));
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, "OK");
    }

    #[test]
    fn empty_home() {
        let dir = TempDir::new().unwrap();
        let resp = create_handler(&dir).handle(&Request::get("/"));
        assert_eq!(resp.status, 200);
        assert!(resp.body.contains("nothing to see here"));
    }

    #[test]
    fn bad_start_is_client_error() {
        let dir = TempDir::new().unwrap();
        let handler = create_handler(&dir);
        assert_eq!(handler.handle(&Request::get("/?start=-1")).status, 400);
        assert_eq!(handler.handle(&Request::get("/?start=abc")).status, 400);
        assert_eq!(handler.handle(&Request::get("/?start=0")).status, 200);
    }

    #[test]
    fn home_lists_saved_snippets() {
        let dir = TempDir::new().unwrap();
        let handler = create_handler(&dir);
        let snippet = Snippet::new("listed <here>", "body");
        handler.context().store.save(&snippet).unwrap();

        let resp = handler.handle(&Request::get("/"));
        assert!(resp.body.contains("listed &lt;here&gt;"));
        assert!(resp.body.contains(&format!("/snippet/{}", snippet.id)));
    }

    #[test]
    fn new_snippet_sets_session_once() {
        let dir = TempDir::new().unwrap();
        let handler = create_handler(&dir);

        let resp = handler.handle(&Request::get("/snippet/"));
        assert_eq!(resp.status, 200);
        let cookie = resp.header("set-cookie").unwrap();
        assert!(cookie.starts_with("snippetbox_session="));
        assert!(resp.body.contains("name=\"csrf_token\""));

        let session = SessionId::new();
        let resp = handler
            .handle(&Request::get("/snippet/").with_cookie(SESSION_COOKIE, &session.to_string()));
        assert_eq!(resp.header("set-cookie"), None);
    }

    #[test]
    fn show_unknown_or_garbage_id_is_not_found() {
        let dir = TempDir::new().unwrap();
        let handler = create_handler(&dir);
        assert_eq!(handler.handle(&Request::get("/snippet/garbage")).status, 404);
        let unknown = SnippetId::new();
        let resp = handler.handle(&Request::get(&format!("/snippet/{unknown}")));
        assert_eq!(resp.status, 404);
        assert!(resp.body.contains("Not Found"));
    }

    #[test]
    fn unknown_route_and_method() {
        let dir = TempDir::new().unwrap();
        let handler = create_handler(&dir);
        assert_eq!(handler.handle(&Request::get("/nope")).status, 404);

        let resp = handler.handle(&Request::new(Method::Other("DELETE".into()), "/"));
        assert_eq!(resp.status, 405);
        assert_eq!(resp.header("allow"), Some("GET, HEAD"));

        let resp = handler.handle(&Request::new(Method::Post, "/snippet/abc"));
        assert_eq!(resp.status, 405);
    }

    #[test]
    fn post_without_token_is_rejected() {
        let dir = TempDir::new().unwrap();
        let handler = create_handler(&dir);
        let request = Request::post_form("/snippet/", [("description", "d"), ("contents", "c")]);

        let resp = handler.handle(&request);
        assert_eq!(resp.status, 400);
        assert_eq!(handler.context().store.count().unwrap(), 0);
    }

    #[test]
    fn oversized_body_is_refused() {
        let dir = TempDir::new().unwrap();
        let handler = create_handler(&dir);
        let big = "x".repeat(ServerConfig::default().max_body_bytes + 1);
        let request = Request::post_form("/snippet/", [("contents", big.as_str())]);
        assert_eq!(handler.handle(&request).status, 413);
    }
}
