//! Report assembly: resolve the period, list entries, aggregate

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::aggregate::{summarize, trend_window};
use crate::ai::InsightMetrics;
use crate::error::Result;
use crate::insights::build_metrics;
use crate::ledger::{EntryFilter, LedgerStore};
use crate::models::{LedgerEntry, SummaryReport};
use crate::period::{first_day_of_month, month_range, resolve_at, DateRange, Period};

/// Build the summary report for one owner and period as of `now`
pub fn build_summary<S: LedgerStore + ?Sized>(
    store: &S,
    owner_id: &str,
    period: &Period,
    now: NaiveDateTime,
    lookback_months: u32,
) -> Result<SummaryReport> {
    let range = resolve_at(period, now);
    let today = now.date();

    let period_entries = store.list_entries(&EntryFilter::owner(owner_id).with_range(range))?;
    let trend_entries = match trend_window(lookback_months, today) {
        Some(window) => store.list_entries(&EntryFilter::owner(owner_id).with_range(window))?,
        None => Vec::new(),
    };

    debug!(
        owner_id,
        period = period.kind.as_str(),
        entries = period_entries.len(),
        trend_entries = trend_entries.len(),
        "Building summary"
    );

    Ok(summarize(
        &period_entries,
        &trend_entries,
        period,
        &range,
        today,
        lookback_months,
    ))
}

/// Insight inputs: full history plus the current and previous calendar month
pub fn build_insight_metrics<S: LedgerStore + ?Sized>(
    store: &S,
    owner_id: &str,
    today: NaiveDate,
) -> Result<InsightMetrics> {
    let history = store.list_entries(&EntryFilter::owner(owner_id))?;

    let current = month_range(today.year(), today.month());
    let previous = first_day_of_month(today)
        .pred_opt()
        .and_then(|d| month_range(d.year(), d.month()));

    let current_entries = within(&history, owner_id, current);
    let previous_entries = within(&history, owner_id, previous);

    Ok(build_metrics(&history, &current_entries, &previous_entries))
}

fn within(entries: &[LedgerEntry], owner_id: &str, range: Option<DateRange>) -> Vec<LedgerEntry> {
    let Some(range) = range else {
        return Vec::new();
    };
    let filter = EntryFilter::owner(owner_id).with_range(range);
    entries.iter().filter(|e| filter.matches(e)).cloned().collect()
}
