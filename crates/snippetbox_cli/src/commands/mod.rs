//! CLI command implementations.

pub mod compact;
pub mod inspect;
pub mod list;
pub mod serve;
pub mod show;

use clap::ValueEnum;

/// Output format for read commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}
