//! Compact command implementation.

use snippetbox_core::{CompactionStats, SnippetStore};
use std::path::Path;

/// Runs the compact command.
pub fn run(path: &Path, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Store file not found: {}", path.display()).into());
    }

    println!("Compacting store at {:?}", path);
    if dry_run {
        println!("(dry run - no changes will be made)");
    }
    println!();

    let store = SnippetStore::open(path);
    let plan = store.plan_compaction()?;
    print_stats("Compaction Analysis", &plan);

    if !dry_run {
        println!();
        if plan.would_shrink() {
            println!("Performing compaction...");
            let done = store.compact()?;
            println!(
                "Compaction complete: {} -> {} bytes",
                done.bytes_before, done.bytes_after
            );
        } else {
            println!("No compaction needed - store is already optimal");
        }
    }

    Ok(())
}

fn print_stats(title: &str, stats: &CompactionStats) {
    let saved = stats.bytes_before.saturating_sub(stats.bytes_after);
    println!("{title}:");
    println!("  Input records:     {}", stats.input_records);
    println!("  Output records:    {}", stats.output_records);
    println!("  Obsolete versions: {}", stats.obsolete_removed);
    println!();
    println!("  Size before: {} bytes", stats.bytes_before);
    println!("  Size after:  {} bytes", stats.bytes_after);
    println!(
        "  Space saved: {} bytes ({:.1}%)",
        saved,
        if stats.bytes_before > 0 {
            (saved as f64 / stats.bytes_before as f64) * 100.0
        } else {
            0.0
        }
    );
}
