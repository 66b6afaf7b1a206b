//! Ledger entry operations

use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Row};
use rust_decimal::Decimal;
use tracing::warn;

use super::Database;
use crate::error::Result;
use crate::ledger::{EntryFilter, LedgerStore};
use crate::models::{EntryKind, InvoiceStatus, LedgerEntry, NewLedgerEntry};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A row as stored, before the text columns are interpreted
struct RawEntry {
    id: i64,
    owner_id: String,
    kind: String,
    amount: String,
    category: Option<String>,
    status: Option<String>,
    description: Option<String>,
    occurred_at: String,
}

impl RawEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            kind: row.get(2)?,
            amount: row.get(3)?,
            category: row.get(4)?,
            status: row.get(5)?,
            description: row.get(6)?,
            occurred_at: row.get(7)?,
        })
    }

    /// `None` for rows whose kind is unknown; bad amounts read as zero and bad
    /// dates as missing so aggregation skips them.
    fn into_entry(self) -> Option<LedgerEntry> {
        let kind = match EntryKind::from_str(&self.kind) {
            Ok(kind) => kind,
            Err(_) => {
                warn!(id = self.id, kind = %self.kind, "Skipping ledger row with unknown kind");
                return None;
            }
        };

        let amount = Decimal::from_str(self.amount.trim()).unwrap_or_else(|_| {
            warn!(id = self.id, amount = %self.amount, "Unreadable amount, treating as zero");
            Decimal::ZERO
        });

        let occurred_at = NaiveDate::parse_from_str(self.occurred_at.trim(), DATE_FORMAT).ok();
        if occurred_at.is_none() {
            warn!(id = self.id, date = %self.occurred_at, "Unreadable entry date");
        }

        Some(LedgerEntry {
            id: Some(self.id),
            owner_id: self.owner_id,
            kind,
            amount,
            category: self.category,
            status: self
                .status
                .as_deref()
                .and_then(|s| InvoiceStatus::from_str(s).ok()),
            description: self.description,
            occurred_at,
        })
    }
}

impl Database {
    /// Record a new entry, returning its id
    pub fn insert_entry(&self, entry: &NewLedgerEntry) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO ledger_entries (owner_id, kind, amount, category, status, description, occurred_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                entry.owner_id,
                entry.kind.as_str(),
                entry.amount.to_string(),
                entry.category,
                entry.status.map(|s| s.as_str()),
                entry.description,
                entry.occurred_at.format(DATE_FORMAT).to_string(),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// List an owner's entries, oldest first
    pub fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<LedgerEntry>> {
        let conn = self.conn()?;

        let mut sql = String::from(
            "SELECT id, owner_id, kind, amount, category, status, description, occurred_at \
             FROM ledger_entries WHERE owner_id = ?",
        );
        let mut values: Vec<String> = vec![filter.owner_id.clone()];

        if let Some(range) = &filter.date_range {
            if !range.is_open_start() {
                sql.push_str(" AND occurred_at >= ?");
                values.push(range.start.date().format(DATE_FORMAT).to_string());
            }
            sql.push_str(" AND occurred_at <= ?");
            values.push(range.end.date().format(DATE_FORMAT).to_string());
        }
        sql.push_str(" ORDER BY occurred_at, id");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(values.iter()), RawEntry::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows.into_iter().filter_map(RawEntry::into_entry).collect())
    }
}

impl LedgerStore for Database {
    fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<LedgerEntry>> {
        Database::list_entries(self, filter)
    }
}
