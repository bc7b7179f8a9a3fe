//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;

/// Hybrid TF-IDF and n-gram search over a small document corpus
#[derive(Parser, Debug)]
#[command(name = "psearch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Print JSON instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: ~/.config/psearch/config.toml)
    #[arg(long, global = true, env = "PSEARCH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the search worker over JSON lines on stdin/stdout
    Serve(commands::serve::ServeArgs),

    /// Search a JSON corpus file
    Search(commands::search::SearchArgs),

    /// Extract keyword tags from text
    Tags(commands::tags::TagsArgs),

    /// Print the n-gram embedding of a text
    Hash(commands::hash::HashArgs),

    /// Recommend related papers by shared keywords
    Recommend(commands::recommend::RecommendArgs),
}
