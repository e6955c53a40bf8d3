//! SnippetBox CLI
//!
//! Runs the snippet server and offers maintenance commands over the store
//! file.
//!
//! # Commands
//!
//! - `serve` - Start the HTTP server
//! - `list` - Print a page of snippet summaries, newest first
//! - `show` - Print one snippet
//! - `inspect` - Display store statistics
//! - `compact` - Rewrite the store without superseded versions

mod commands;

use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand};
use commands::OutputFormat;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// SnippetBox snippet server and store tools.
#[derive(Parser, Debug)]
#[command(name = "snippetbox")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store file
    #[arg(global = true, short, long, default_value = "data/snippits.db")]
    data: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:4000")]
        addr: SocketAddr,

        /// Snippets per page on the home page
        #[arg(long, default_value_t = 10, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
        page_size: usize,

        /// Worker threads
        #[arg(short, long, default_value_t = 4, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
        workers: usize,

        /// Key for anti-forgery tokens (random per process if omitted)
        #[arg(long)]
        secret: Option<String>,

        /// Site name shown on every page
        #[arg(long, default_value = "Snippetbox")]
        title: String,
    },

    /// Print a page of snippet summaries, newest first
    List {
        /// Offset into the newest-first ordering
        #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(i64).range(0..))]
        start: i64,

        /// Page size
        #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(i64).range(1..))]
        limit: i64,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print one snippet
    Show {
        /// Snippet identifier
        id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Display store statistics
    Inspect {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Rewrite the store without superseded versions
    Compact {
        /// Dry run - show what would be done
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve {
            addr,
            page_size,
            workers,
            secret,
            title,
        } => {
            let options = commands::serve::ServeOptions {
                addr,
                page_size,
                workers,
                secret,
                title,
            };
            commands::serve::run(&cli.data, options)?;
        }
        Commands::List {
            start,
            limit,
            format,
        } => {
            commands::list::run(&cli.data, start, limit, format)?;
        }
        Commands::Show { id, format } => {
            commands::show::run(&cli.data, &id, format)?;
        }
        Commands::Inspect { format } => {
            commands::inspect::run(&cli.data, format)?;
        }
        Commands::Compact { dry_run } => {
            commands::compact::run(&cli.data, dry_run)?;
        }
        Commands::Version => {
            println!("SnippetBox CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("SnippetBox Core v{}", snippetbox_core::VERSION);
            println!("SnippetBox Server v{}", snippetbox_server::VERSION);
        }
    }

    Ok(())
}
