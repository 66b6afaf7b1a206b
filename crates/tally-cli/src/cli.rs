//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Ledger summaries and AI-assisted expense entry
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Ledger aggregation, rate-governed API, and expense assistant", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "tally.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to ~/.local/share/tally/config.toml, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Record an expense, income, or invoice
    Add {
        /// Entry kind: expense, income, invoice
        kind: String,

        /// Amount (positive, e.g. 12.50)
        amount: String,

        /// Owner of the entry
        #[arg(short, long, default_value = "default")]
        owner: String,

        /// Category key for expenses and income (e.g. foodDining)
        #[arg(short, long)]
        category: Option<String>,

        /// Invoice status: pending, paid, overdue, cancelled
        #[arg(short, long)]
        status: Option<String>,

        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Free-form description
        #[arg(long)]
        description: Option<String>,
    },

    /// List ledger entries
    List {
        /// Owner whose entries to list
        #[arg(short, long, default_value = "default")]
        owner: String,

        /// Period: all, month, year
        #[arg(short, long, default_value = "all")]
        period: String,

        /// Year for month/year periods (defaults to current)
        #[arg(long)]
        year: Option<i32>,

        /// Month for month periods (defaults to current)
        #[arg(long)]
        month: Option<u32>,

        /// Maximum number of entries to show (most recent)
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show totals, breakdowns, and monthly trend for a period
    Summary {
        /// Owner to summarize
        #[arg(short, long, default_value = "default")]
        owner: String,

        /// Period: all, month, year
        #[arg(short, long, default_value = "all")]
        period: String,

        /// Year for month/year periods (defaults to current)
        #[arg(long)]
        year: Option<i32>,

        /// Month for month periods (defaults to current)
        #[arg(long)]
        month: Option<u32>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Suggest a category for an expense description
    Categorize {
        /// Expense description
        description: String,

        /// Reply locale (en, es)
        #[arg(long, default_value = "en")]
        locale: String,
    },

    /// Parse free text like "$12 lunch yesterday" into an expense
    Parse {
        /// Text to parse
        text: String,

        /// Reply locale (en, es)
        #[arg(long, default_value = "en")]
        locale: String,
    },

    /// Generate spending insights for an owner
    Insights {
        /// Owner to analyze
        #[arg(short, long, default_value = "default")]
        owner: String,

        /// Reply locale (en, es)
        #[arg(long, default_value = "en")]
        locale: String,

        /// Print the insights as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Allowed CORS origin (repeatable)
        #[arg(long = "allow-origin")]
        allowed_origins: Vec<String>,
    },
}
