use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "codescope")]
#[command(author, version, about = "Semantic code search backed by Qdrant", long_about = None)]
pub struct Cli {
    /// Workspace root to index and search
    #[arg(long, global = true, default_value = ".", env = "CODESCOPE_ROOT")]
    pub root: PathBuf,

    /// Config file, instead of <root>/.codescope.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Index every eligible file under the root (Ctrl-C stops between files)
    Index,

    /// Search the index with a natural-language query
    #[command(visible_alias = "s")]
    Search {
        /// The search query
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Maximum number of hits fetched before per-file deduplication
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Keep the index in sync with file changes until Ctrl-C
    Watch {
        /// Skip the full run before watching
        #[arg(long)]
        no_initial: bool,
    },

    /// Re-index the given files
    Update {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Remove the given files from the index
    Remove {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Delete the collection
    Drop,

    /// Print the resolved configuration with secrets masked
    Config,
}

/// Query words joined back into one string.
#[must_use]
pub fn query_text(query: &[String]) -> String {
    query.join(" ")
}
