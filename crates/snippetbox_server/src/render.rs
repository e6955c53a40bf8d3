//! HTML rendering.
//!
//! Every function here is pure: data in, markup out. Interpolated text goes
//! through [`escape_html`].

use crate::forms::NewSnippetForm;
use crate::guard::TokenPair;
use chrono::{DateTime, Utc};
use snippetbox_core::{Snippet, SummaryResult, Timestamp};
use std::fmt::Write;

/// Page chrome shared by every page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Site name shown in the header and the `<title>`.
    pub site_title: String,
    /// Path of the current request, for nav highlighting.
    pub path: String,
    /// Page size used to build previous/next links.
    pub page_size: usize,
}

impl Layout {
    /// Creates a layout for a request to `path`.
    pub fn new(site_title: impl Into<String>, path: impl Into<String>, page_size: usize) -> Self {
        Self {
            site_title: site_title.into(),
            path: path.into(),
            page_size,
        }
    }
}

/// Escapes text for use in element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Formats a timestamp as `02 Jan 2006 at 15:04` in UTC.
pub fn human_date(ts: Timestamp) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ts.as_millis()) {
        Some(dt) => dt.format("%d %b %Y at %H:%M").to_string(),
        None => String::new(),
    }
}

/// The paginated list of snippets.
pub fn home_page(result: &SummaryResult, layout: &Layout) -> String {
    let mut main = String::from("<h2>Latest Snippets</h2>\n");

    if result.list.is_empty() {
        main.push_str("<p>There's nothing to see here... yet!</p>\n");
    } else {
        main.push_str("<table>\n<tr><th>Description</th><th>Created</th><th>ID</th></tr>\n");
        for summary in &result.list {
            let id = escape_html(&summary.id);
            let _ = writeln!(
                main,
                "<tr><td><a href=\"/snippet/{id}\">{}</a></td><td>{}</td><td>#{id}</td></tr>",
                escape_html(&summary.description),
                human_date(summary.created_at),
            );
        }
        main.push_str("</table>\n");
        let _ = writeln!(
            main,
            "<p class=\"range\">Showing {}&ndash;{} of {}</p>",
            result.start + 1,
            result.start + result.list.len(),
            result.total,
        );
    }

    if result.has_previous() || result.has_more() {
        main.push_str("<nav class=\"pager\">\n");
        if result.has_previous() {
            let prev = result.start.saturating_sub(layout.page_size.max(1));
            let _ = writeln!(main, "<a href=\"/?start={prev}\">&larr; Newer</a>");
        }
        if result.has_more() {
            let next = result.start + result.list.len();
            let _ = writeln!(main, "<a href=\"/?start={next}\">Older &rarr;</a>");
        }
        main.push_str("</nav>\n");
    }

    base("Home", &main, layout)
}

/// A single snippet.
pub fn show_page(snippet: &Snippet, layout: &Layout) -> String {
    let id = snippet.id.to_string();
    let main = format!(
        "<div class=\"snippet\">\n\
         <div class=\"metadata\"><strong>{}</strong><span>#{id}</span></div>\n\
         <pre><code>{}</code></pre>\n\
         <div class=\"metadata\"><time>Created: {}</time></div>\n\
         </div>\n",
        escape_html(&snippet.description),
        escape_html(&snippet.contents),
        human_date(snippet.created_at),
    );
    base(&format!("Snippet #{id}"), &main, layout)
}

/// The new-snippet form, with any validation messages.
pub fn new_page(form: &NewSnippetForm, token: &TokenPair, layout: &Layout) -> String {
    let mut main = String::from("<form action=\"/snippet/\" method=\"POST\">\n");
    let _ = writeln!(
        main,
        "<input type=\"hidden\" name=\"{}\" value=\"{}\">",
        token.field_name,
        escape_html(&token.field_value),
    );

    main.push_str("<div>\n<label for=\"description\">Description:</label>\n");
    push_error(&mut main, form.error("description"));
    let _ = writeln!(
        main,
        "<input type=\"text\" id=\"description\" name=\"description\" value=\"{}\">\n</div>",
        escape_html(&form.description),
    );

    main.push_str("<div>\n<label for=\"contents\">Contents:</label>\n");
    push_error(&mut main, form.error("contents"));
    let _ = writeln!(
        main,
        "<textarea id=\"contents\" name=\"contents\">{}</textarea>\n</div>",
        escape_html(&form.contents),
    );

    main.push_str("<div><input type=\"submit\" value=\"Publish snippet\"></div>\n</form>\n");
    base("Create a New Snippet", &main, layout)
}

/// Shown for unknown routes and absent snippets.
pub fn not_found_page(layout: &Layout) -> String {
    base(
        "Not Found",
        "<h2>Not Found</h2>\n<p>The page you asked for does not exist.</p>\n",
        layout,
    )
}

/// Shown for 4xx/5xx responses that have no page of their own.
pub fn error_page(status: u16, message: &str, layout: &Layout) -> String {
    let main = format!("<h2>{status}</h2>\n<p>{}</p>\n", escape_html(message));
    base(&status.to_string(), &main, layout)
}

fn push_error(out: &mut String, message: Option<&str>) {
    if let Some(message) = message {
        let _ = writeln!(out, "<label class=\"error\">{}</label>", escape_html(message));
    }
}

fn nav_link(layout: &Layout, href: &str, label: &str) -> String {
    if layout.path == href {
        format!("<a href=\"{href}\" class=\"live\">{label}</a>")
    } else {
        format!("<a href=\"{href}\">{label}</a>")
    }
}

fn base(title: &str, main: &str, layout: &Layout) -> String {
    let site = escape_html(&layout.site_title);
    format!(
        "<!doctype html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{} - {site}</title>\n\
         </head>\n\
         <body>\n\
         <header><h1><a href=\"/\">{site}</a></h1></header>\n\
         <nav>{} {}</nav>\n\
         <main>\n{main}</main>\n\
         </body>\n\
         </html>\n",
        escape_html(title),
        nav_link(layout, "/", "Home"),
        nav_link(layout, "/snippet/", "New snippet"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::{SessionId, TOKEN_FIELD};
    use snippetbox_core::Summary;

    fn layout(path: &str) -> Layout {
        Layout::new("Snippetbox", path, 2)
    }

    fn summary(id: &str, description: &str, millis: i64) -> Summary {
        Summary {
            id: id.into(),
            description: description.into(),
            created_at: Timestamp::from_millis(millis),
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html("<a href=\"x\">'&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn formats_dates() {
        // 2006-01-02T15:04:05Z
        assert_eq!(
            human_date(Timestamp::from_millis(1_136_214_245_000)),
            "02 Jan 2006 at 15:04"
        );
    }

    #[test]
    fn empty_home_page() {
        let html = home_page(&SummaryResult::default(), &layout("/"));
        assert!(html.contains("nothing to see here"));
        assert!(!html.contains("pager"));
    }

    #[test]
    fn home_page_links_and_pager() {
        let result = SummaryResult {
            list: vec![summary("b", "second <b>", 2), summary("a", "first", 1)],
            total: 5,
            start: 2,
        };
        let html = home_page(&result, &layout("/"));
        assert!(html.contains("<a href=\"/snippet/b\">second &lt;b&gt;</a>"));
        assert!(html.contains("href=\"/?start=0\""));
        assert!(html.contains("href=\"/?start=4\""));
        assert!(html.contains("Showing 3&ndash;4 of 5"));
        assert!(html.contains("class=\"live\">Home"));
    }

    #[test]
    fn last_page_has_no_next_link() {
        let result = SummaryResult {
            list: vec![summary("a", "first", 1)],
            total: 1,
            start: 0,
        };
        let html = home_page(&result, &layout("/"));
        assert!(!html.contains("?start="));
    }

    #[test]
    fn show_page_escapes_contents() {
        let snippet = Snippet::new("desc", "if a < b && c > d {}");
        let html = show_page(&snippet, &layout("/snippet/x"));
        assert!(html.contains("if a &lt; b &amp;&amp; c &gt; d {}"));
        assert!(html.contains(&snippet.id.to_string()));
    }

    #[test]
    fn new_page_carries_token_and_errors() {
        let token = TokenPair {
            secret_handle: SessionId::from_bytes([7; 16]),
            field_name: TOKEN_FIELD,
            field_value: "tok-en_1".into(),
        };
        let mut form = NewSnippetForm::new("", "\"quoted\"");
        form.validate();
        let html = new_page(&form, &token, &layout("/snippet/"));

        assert!(html.contains("name=\"csrf_token\" value=\"tok-en_1\""));
        assert!(html.contains("This field cannot be blank"));
        assert!(html.contains("&quot;quoted&quot;"));
        assert!(html.contains("class=\"live\">New snippet"));
    }

    #[test]
    fn not_found_uses_site_title() {
        let html = not_found_page(&Layout::new("My <Box>", "/nope", 10));
        assert!(html.contains("Not Found - My &lt;Box&gt;"));
    }
}
