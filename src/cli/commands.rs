//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Feed import and tamper CLI
#[derive(Parser, Debug)]
#[command(name = "feed-tamper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Feed type definition file (YAML)
    #[arg(short, long, global = true)]
    pub feed_type: Option<PathBuf>,

    /// State file (JSON)
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import a source, resuming from the state file when given
    Import {
        /// Local path or http(s) URL of the source
        #[arg(short, long)]
        source: String,

        /// Entity store (JSON lines), loaded first and rewritten afterwards
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stop after this many batches
        #[arg(long)]
        max_batches: Option<u64>,

        /// Start over instead of resuming
        #[arg(long)]
        reset: bool,
    },

    /// Parse and tamper one batch, printing the items
    Parse {
        /// Local path or http(s) URL of the source
        #[arg(short, long)]
        source: String,
    },

    /// List the available tamper plugins
    Plugins,

    /// Validate a feed type definition
    Validate,

    /// Print an empty CSV template for a feed type
    Template,

    /// Show the import state
    State {
        /// Reset the progress and counters
        #[arg(long)]
        reset: bool,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
