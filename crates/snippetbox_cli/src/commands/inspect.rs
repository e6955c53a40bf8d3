//! Inspect command implementation.

use super::OutputFormat;
use snippetbox_core::{SnippetStore, StoreStats};
use std::path::Path;

/// Runs the inspect command.
pub fn run(path: &Path, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let stats = SnippetStore::open(path).inspect()?;
    if !stats.exists {
        return Err(format!("No store found at {:?}", path).into());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Text => print_text_output(&stats),
    }
    Ok(())
}

fn print_text_output(stats: &StoreStats) {
    println!("Store: {}", stats.path);
    println!();
    println!("File size:          {} bytes", stats.file_size);
    println!("Records:            {}", stats.record_count);
    println!("Snippets:           {}", stats.snippet_count);
    println!("Obsolete versions:  {}", stats.obsolete_versions);
    if stats.torn_bytes > 0 {
        println!(
            "Torn tail:          {} bytes (truncated on next write)",
            stats.torn_bytes
        );
    }
    if stats.indexes.is_empty() {
        println!("Indexes:            none");
    } else {
        println!("Indexes:            {}", stats.indexes.join(", "));
    }
}
