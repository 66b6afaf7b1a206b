//! Ledger store abstraction

use crate::error::Result;
use crate::models::LedgerEntry;
use crate::period::DateRange;

/// Which entries to list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFilter {
    pub owner_id: String,
    /// `None` lists the owner's full history
    pub date_range: Option<DateRange>,
}

impl EntryFilter {
    pub fn owner(owner_id: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            date_range: None,
        }
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// True if `entry` belongs to the owner and falls inside the range.
    ///
    /// An entry with an unreadable date only matches an unbounded filter.
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        if entry.owner_id != self.owner_id {
            return false;
        }
        match (&self.date_range, entry.occurred_at) {
            (None, _) => true,
            (Some(range), Some(date)) => range.contains(date),
            (Some(_), None) => false,
        }
    }
}

/// Source of ledger entries for reports
pub trait LedgerStore {
    fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<LedgerEntry>>;
}

impl LedgerStore for [LedgerEntry] {
    fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<LedgerEntry>> {
        Ok(self.iter().filter(|e| filter.matches(e)).cloned().collect())
    }
}

impl LedgerStore for Vec<LedgerEntry> {
    fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<LedgerEntry>> {
        self.as_slice().list_entries(filter)
    }
}
