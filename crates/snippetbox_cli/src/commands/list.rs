//! List command implementation.

use super::OutputFormat;
use snippetbox_core::{SnippetStore, SummaryResult};
use snippetbox_server::render::human_date;
use std::fmt::Write;
use std::path::Path;

/// Runs the list command.
pub fn run(
    path: &Path,
    start: i64,
    limit: i64,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = SnippetStore::open(path);
    let page = store.find(start, limit)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page)?),
        OutputFormat::Text => print!("{}", format_text(&page)),
    }
    Ok(())
}

fn format_text(page: &SummaryResult) -> String {
    let mut out = String::new();
    if page.list.is_empty() {
        let _ = writeln!(out, "No snippets (total {}).", page.total);
        return out;
    }
    for summary in &page.list {
        let _ = writeln!(
            out,
            "{}  {}  {}",
            summary.id,
            human_date(summary.created_at),
            summary.description
        );
    }
    let _ = writeln!(
        out,
        "\n{}-{} of {}{}",
        page.start + 1,
        page.start + page.list.len(),
        page.total,
        if page.has_more() { " (more)" } else { "" }
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use snippetbox_core::{Summary, Timestamp};

    #[test]
    fn text_output() {
        let page = SummaryResult {
            list: vec![Summary {
                id: "abc".into(),
                description: "hello".into(),
                created_at: Timestamp::from_millis(1_136_214_245_000),
            }],
            total: 3,
            start: 0,
        };
        let text = format_text(&page);
        assert!(text.starts_with("abc  02 Jan 2006 at 15:04  hello\n"));
        assert!(text.contains("1-1 of 3 (more)"));
    }

    #[test]
    fn empty_output() {
        assert_eq!(
            format_text(&SummaryResult::default()),
            "No snippets (total 0).\n"
        );
    }
}
