//! Ledger entry commands (add, list)

use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_core::db::Database;
use tally_core::ledger::EntryFilter;
use tally_core::models::{EntryKind, InvoiceStatus, NewLedgerEntry};
use tally_core::period::{self, Period};

use super::{format_money, truncate};

/// Raw `tally add` arguments
#[derive(Debug, Clone, Default)]
pub struct AddArgs {
    pub kind: String,
    pub amount: String,
    pub owner: String,
    pub category: Option<String>,
    pub status: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
}

/// Parse `tally add` arguments into a typed entry.
///
/// Only parsing happens here; amounts and categories are stored as given.
pub fn build_entry(args: &AddArgs, today: NaiveDate) -> Result<NewLedgerEntry> {
    let kind = EntryKind::from_str(&args.kind).map_err(anyhow::Error::msg)?;

    let raw_amount = args.amount.trim().trim_start_matches('$');
    let amount = Decimal::from_str(raw_amount)
        .with_context(|| format!("Invalid amount: {}", args.amount))?;

    let status = args
        .status
        .as_deref()
        .map(InvoiceStatus::from_str)
        .transpose()
        .map_err(anyhow::Error::msg)?;

    let occurred_at = match args.date.as_deref() {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .context("Invalid --date format (use YYYY-MM-DD)")?,
        None => today,
    };

    Ok(NewLedgerEntry {
        owner_id: args.owner.clone(),
        kind,
        amount,
        category: args.category.clone(),
        status,
        description: args.description.clone(),
        occurred_at,
    })
}

pub fn cmd_add(db: &Database, entry: &NewLedgerEntry) -> Result<i64> {
    let id = db.insert_entry(entry).context("Failed to record entry")?;

    println!(
        "✅ Recorded {} #{}: {} on {}",
        entry.kind,
        id,
        format_money(entry.amount),
        entry.occurred_at
    );

    Ok(id)
}

pub fn cmd_list(db: &Database, owner: &str, period: &Period, limit: usize) -> Result<()> {
    let range = period::resolve(period);
    let entries = db.list_entries(&EntryFilter::owner(owner).with_range(range))?;

    if entries.is_empty() {
        println!("No entries found for {} ({}).", owner, period.kind);
        return Ok(());
    }

    let skip = entries.len().saturating_sub(limit);

    println!();
    println!(
        "   {:>5} │ {:10} │ {:8} │ {:>10} │ {:15} │ Description",
        "ID", "Date", "Kind", "Amount", "Category"
    );
    println!("   ──────┼────────────┼──────────┼────────────┼─────────────────┼────────────");

    for entry in entries.iter().skip(skip).rev() {
        let date = entry
            .occurred_at
            .map(|d| d.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!(
            "   {:>5} │ {:10} │ {:8} │ {:>10} │ {:15} │ {}",
            entry.id.unwrap_or_default(),
            date,
            entry.kind.as_str(),
            format_money(entry.amount),
            truncate(entry.group_key(), 15),
            truncate(entry.description.as_deref().unwrap_or(""), 40)
        );
    }

    if skip > 0 {
        println!();
        println!("   ({} older entries not shown, use --limit)", skip);
    }

    Ok(())
}
