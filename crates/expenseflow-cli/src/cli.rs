//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// ExpenseFlow - Turn expense notes into a budget report
#[derive(Parser)]
#[command(name = "expenseflow")]
#[command(about = "Local-first expense analysis and budget guidance", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Directory for stored records and analyses
    ///
    /// Defaults to ~/.local/share/expenseflow/data (platform equivalent).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Directory with models.toml, pipeline.toml and prompts/ overrides
    ///
    /// Missing files fall back to the built-in defaults.
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze expense notes and print guidance
    ///
    /// Example: expenseflow analyze "kahve 50 TL" "laptop" --income 15000 --days 7
    Analyze {
        /// Expense notes, one per argument
        texts: Vec<String>,

        /// Read notes from a file (one per line, '#' starts a comment)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Monthly income (enables budget status)
        #[arg(short, long)]
        income: Option<f64>,

        /// Number of days the notes cover
        #[arg(short, long, default_value = "1")]
        days: u32,

        /// Skip market-price lookups
        #[arg(long)]
        no_search: bool,

        /// Model strategy: auto, fast, accurate
        #[arg(long)]
        strategy: Option<String>,

        /// Price lookup threshold (overrides config)
        #[arg(long)]
        threshold: Option<f64>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,

        /// Don't store records and analysis
        #[arg(long)]
        no_save: bool,
    },

    /// List stored analyses (newest first)
    History {
        /// Maximum number to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show a stored analysis
    Show {
        /// Analysis ID
        id: String,
    },

    /// Delete a stored analysis
    Delete {
        /// Analysis ID
        id: String,
    },

    /// List stored expense records (most recent last)
    Expenses {
        /// Maximum number to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show which model serves each task
    Route {
        /// Model strategy to preview: auto, fast, accurate
        #[arg(long)]
        strategy: Option<String>,
    },

    /// Manage AI prompts
    Prompts {
        #[command(subcommand)]
        action: PromptsAction,
    },

    /// Check the configured inference and search backends
    Backends,
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all prompts and their override status
    List,

    /// Show the content of a prompt
    Show {
        /// Prompt ID (e.g. parse_expense)
        id: String,
    },
}
