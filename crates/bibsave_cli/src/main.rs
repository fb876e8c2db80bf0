//! bibsave CLI
//!
//! Command-line tools for writing bibsave database snapshots as BibTeX.
//!
//! # Commands
//!
//! - `save` - Write a snapshot to a `.bib` file atomically
//! - `preview` - Print the output without writing a file
//! - `order` - Show the resolved record order
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use commands::OutputOptions;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// bibsave command-line tools.
#[derive(Parser)]
#[command(name = "bibsave")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a database snapshot to a BibTeX file
    Save {
        /// JSON database snapshot
        input: PathBuf,

        /// Destination file
        #[arg(short, long)]
        output: PathBuf,

        /// Copy the previous file to <output>.bak first
        #[arg(short, long)]
        backup: bool,

        /// Skip records flagged as search hits
        #[arg(long)]
        skip_search_hits: bool,

        /// Skip records flagged as group hits
        #[arg(long)]
        skip_group_hits: bool,

        #[command(flatten)]
        options: OutputOptions,
    },

    /// Print the BibTeX output without writing a file
    Preview {
        /// JSON database snapshot
        input: PathBuf,

        #[command(flatten)]
        options: OutputOptions,
    },

    /// Show the order records would be written in
    Order {
        /// JSON database snapshot
        input: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        #[command(flatten)]
        options: OutputOptions,
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
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Save {
            input,
            output,
            backup,
            skip_search_hits,
            skip_group_hits,
            options,
        } => {
            let filters = commands::save::Filters {
                skip_search_hits,
                skip_group_hits,
            };
            commands::save::run(&input, &output, &options, backup, filters)?;
        }
        Commands::Preview { input, options } => {
            commands::preview::run(&input, &options)?;
        }
        Commands::Order {
            input,
            format,
            options,
        } => {
            commands::order::run(&input, &options, &format)?;
        }
        Commands::Version => {
            println!("bibsave CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
