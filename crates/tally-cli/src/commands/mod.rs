//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init) and shared utilities (open_db, load_config)
//! - `entries` - Ledger entry commands (add, list)
//! - `reports` - Summary report command
//! - `assistant` - AI-assisted commands (categorize, parse, insights)
//! - `serve` - Web server command

pub mod assistant;
pub mod core;
pub mod entries;
pub mod reports;
pub mod serve;

// Re-export command functions for main.rs
pub use assistant::*;
pub use core::*;
pub use entries::*;
pub use reports::*;
pub use serve::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Money for display, rounded to cents
pub fn format_money(value: rust_decimal::Decimal) -> String {
    format!("{:.2}", tally_core::models::money::round(value))
}
