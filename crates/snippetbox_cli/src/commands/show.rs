//! Show command implementation.

use super::OutputFormat;
use snippetbox_core::{SnippetId, SnippetStore};
use snippetbox_server::render::human_date;
use std::path::Path;

/// Runs the show command.
pub fn run(path: &Path, id: &str, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = SnippetId::parse(id).ok_or_else(|| format!("Invalid snippet id: {id}"))?;
    let store = SnippetStore::open(path);
    let snippet = store
        .get(&parsed)?
        .ok_or_else(|| format!("No snippet {id} in {}", path.display()))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snippet)?),
        OutputFormat::Text => {
            println!("#{}  {}", snippet.id, snippet.description);
            println!("Created: {}", human_date(snippet.created_at));
            println!();
            println!("{}", snippet.contents);
        }
    }
    Ok(())
}
