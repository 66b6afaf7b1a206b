//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `load_config` - Resolve runtime configuration
//! - `period_from_args` - Build a reporting period from CLI flags
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{Context, Result};
use tally_core::config::TallyConfig;
use tally_core::db::Database;
use tally_core::period::{Period, PeriodKind};

/// Open the database, creating it and its schema if needed
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

/// Explicit config file, else the data-dir override, else built-in defaults
pub fn load_config(path: Option<&Path>) -> Result<TallyConfig> {
    match path {
        Some(p) => TallyConfig::load_from(p)
            .with_context(|| format!("Failed to load config from {}", p.display())),
        None => TallyConfig::load().context("Failed to load config"),
    }
}

/// Unknown period kinds mean all-time; missing year/month default at resolution
pub fn period_from_args(kind: &str, year: Option<i32>, month: Option<u32>) -> Period {
    Period {
        kind: PeriodKind::parse_or_all(kind),
        year,
        month,
    }
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    open_db(db_path)?;

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Record an entry: tally add expense 12.50 --category foodDining");
    println!("  2. See the summary: tally summary --period month");
    println!("  3. Start the API:   tally serve");

    Ok(())
}
