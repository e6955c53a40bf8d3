//! End-to-end write path through the request handler.

use snippetbox_core::SnippetStore;
use snippetbox_server::{
    GuardConfig, Method, Request, Response, ServerConfig, SessionId, SnippetServer,
    SESSION_COOKIE, TOKEN_FIELD,
};
use std::time::Duration;
use tempfile::TempDir;

fn server(dir: &TempDir) -> SnippetServer {
    let config = ServerConfig::default()
        .with_page_size(2)
        .with_guard(GuardConfig::new(b"integration-secret".to_vec()));
    SnippetServer::new(config, SnippetStore::open(dir.path().join("snippits.db"))).unwrap()
}

/// Pulls the session cookie value out of a `Set-Cookie` header.
fn session_from(response: &Response) -> String {
    let cookie = response.header("set-cookie").expect("session cookie");
    let pair = cookie.split(';').next().unwrap();
    pair.split_once('=').unwrap().1.to_string()
}

/// Pulls the hidden token value out of a rendered form.
fn token_from(response: &Response) -> String {
    let marker = format!("name=\"{TOKEN_FIELD}\" value=\"");
    let start = response.body.find(&marker).expect("token field") + marker.len();
    let end = start + response.body[start..].find('"').unwrap();
    response.body[start..end].to_string()
}

fn post(session: &str, token: &str, description: &str, contents: &str) -> Request {
    Request::post_form(
        "/snippet/",
        [
            (TOKEN_FIELD, token),
            ("description", description),
            ("contents", contents),
        ],
    )
    .with_cookie(SESSION_COOKIE, session)
}

#[test]
fn create_then_show() {
    let dir = TempDir::new().unwrap();
    let server = server(&dir);

    let form = server.handle(&Request::get("/snippet/"));
    let session = session_from(&form);
    let token = token_from(&form);

    let created = server.handle(&post(&session, &token, "hello", "fn main() {}"));
    assert_eq!(created.status, 303);
    let location = created.header("location").unwrap().to_string();
    assert!(location.starts_with("/snippet/"));
    assert_eq!(server.store().count().unwrap(), 1);

    let shown = server.handle(&Request::get(&location));
    assert_eq!(shown.status, 200);
    assert!(shown.body.contains("hello"));
    assert!(shown.body.contains("fn main() {}"));
}

#[test]
fn rejected_writes_leave_store_untouched() {
    let dir = TempDir::new().unwrap();
    let server = server(&dir);

    let form = server.handle(&Request::get("/snippet/"));
    let session = session_from(&form);
    let token = token_from(&form);

    // No session cookie.
    let no_cookie = Request::post_form(
        "/snippet/",
        [(TOKEN_FIELD, token.as_str()), ("description", "d"), ("contents", "c")],
    );
    assert_eq!(server.handle(&no_cookie).status, 400);

    // Token issued for a different session.
    let other = SessionId::new().to_string();
    assert_eq!(server.handle(&post(&other, &token, "d", "c")).status, 400);

    // Token signed with another key.
    let foreign_dir = TempDir::new().unwrap();
    let foreign = SnippetServer::new(
        ServerConfig::default().with_guard(GuardConfig::new(b"someone-else".to_vec())),
        SnippetStore::open(foreign_dir.path().join("snippits.db")),
    )
    .unwrap();
    let foreign_form =
        foreign.handle(&Request::get("/snippet/").with_cookie(SESSION_COOKIE, &session));
    let forged = token_from(&foreign_form);
    assert_eq!(server.handle(&post(&session, &forged, "d", "c")).status, 400);

    // Empty token.
    assert_eq!(server.handle(&post(&session, "", "d", "c")).status, 400);

    assert_eq!(server.store().count().unwrap(), 0);
}

#[test]
fn expired_token_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = ServerConfig::default().with_guard(
        GuardConfig::new(b"short-lived".to_vec()).with_expiry(Duration::from_millis(1)),
    );
    let server =
        SnippetServer::new(config, SnippetStore::open(dir.path().join("snippits.db"))).unwrap();

    let form = server.handle(&Request::get("/snippet/"));
    let session = session_from(&form);
    let token = token_from(&form);
    std::thread::sleep(Duration::from_millis(10));

    assert_eq!(server.handle(&post(&session, &token, "d", "c")).status, 400);
    assert_eq!(server.store().count().unwrap(), 0);
}

#[test]
fn invalid_form_is_rerendered_with_fresh_token() {
    let dir = TempDir::new().unwrap();
    let server = server(&dir);

    let form = server.handle(&Request::get("/snippet/"));
    let session = session_from(&form);
    let token = token_from(&form);

    let resp = server.handle(&post(&session, &token, "   ", "kept <contents>"));
    assert_eq!(resp.status, 422);
    assert!(resp.body.contains("This field cannot be blank"));
    assert!(resp.body.contains("kept &lt;contents&gt;"));
    assert_eq!(server.store().count().unwrap(), 0);

    let fresh = token_from(&resp);
    assert_ne!(fresh, token);
    assert_eq!(server.handle(&post(&session, &fresh, "fixed", "kept")).status, 303);
    assert_eq!(server.store().count().unwrap(), 1);
}

#[test]
fn home_paginates_newest_first() {
    let dir = TempDir::new().unwrap();
    let server = server(&dir);

    let form = server.handle(&Request::get("/snippet/"));
    let session = session_from(&form);
    for name in ["first", "second", "third"] {
        let token = token_from(
            &server.handle(&Request::get("/snippet/").with_cookie(SESSION_COOKIE, &session)),
        );
        assert_eq!(server.handle(&post(&session, &token, name, "x")).status, 303);
        std::thread::sleep(Duration::from_millis(2));
    }

    let page = server.handle(&Request::get("/"));
    assert!(page.body.contains("third"));
    assert!(page.body.contains("second"));
    assert!(!page.body.contains("first"));
    assert!(page.body.find("third").unwrap() < page.body.find("second").unwrap());
    assert!(page.body.contains("/?start=2"));

    let page = server.handle(&Request::get("/?start=2"));
    assert!(page.body.contains("first"));
    assert!(page.body.contains("/?start=0"));

    let past_end = server.handle(&Request::get("/?start=10"));
    assert_eq!(past_end.status, 200);
}

#[test]
fn head_and_unknown_methods() {
    let dir = TempDir::new().unwrap();
    let server = server(&dir);
    assert_eq!(server.handle(&Request::new(Method::Head, "/")).status, 200);
    let resp = server.handle(&Request::new(Method::Other("PUT".into()), "/snippet/"));
    assert_eq!(resp.status, 405);
    assert_eq!(resp.header("allow"), Some("GET, HEAD, POST"));
}
