//! CLI module for Replikk.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Replikk - Subtitle RAG
///
/// A CLI tool that indexes a season of TV subtitles and answers questions
/// about it with cited dialogue. The name "Replikk" comes from the Norwegian
/// word for a line of dialogue.
#[derive(Parser, Debug)]
#[command(name = "replikk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build or update the subtitle index
    Index {
        /// Directory containing SxxEyy.txt subtitle files (overrides config)
        #[arg(short, long)]
        dir: Option<String>,

        /// Drop the existing index and rebuild from scratch
        #[arg(short, long)]
        rebuild: bool,
    },

    /// Ask a question and get a cited answer from the indexed season
    Ask {
        /// The question to ask
        question: String,

        /// LLM model to use for answer generation
        #[arg(short, long)]
        model: Option<String>,

        /// Number of chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Search for dialogue without generating an answer
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Start an interactive question session
    Chat {
        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List indexed episodes
    List,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "rag.model")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
