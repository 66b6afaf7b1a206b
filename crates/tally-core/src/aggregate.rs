//! Aggregation engine: totals, breakdowns, and monthly trends over ledger entries
//!
//! Every function here is pure. Inputs are borrowed, never mutated, and entries
//! that fail [`LedgerEntry::is_valid`] are skipped rather than treated as errors.
//! Arithmetic stays in `Decimal`; rounding to cents happens only on serialization.

use std::collections::{BTreeMap, HashMap};

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;

use crate::models::{
    CategoryAmount, EntryKind, KindTotal, LedgerEntry, ReportPeriod, SummaryReport, Totals,
    TrendBucket,
};
use crate::period::{first_day_of_month, last_day_of_month, month_key, DateRange, Period};

/// Default trend lookback in months
pub const DEFAULT_LOOKBACK_MONTHS: u32 = 12;

/// Sum and count valid entries per kind, plus the paid-invoice subtotal
pub fn compute_totals(entries: &[LedgerEntry]) -> Totals {
    let mut totals = Totals::default();

    for entry in entries.iter().filter(|e| e.is_valid()) {
        let slot = totals.by_kind.entry(entry.kind).or_default();
        slot.amount += entry.amount;
        slot.count += 1;

        if entry.is_paid_invoice() {
            totals.paid_invoices += entry.amount;
        }
    }

    totals
}

/// Group valid entries of `kind` by category (status for invoices).
///
/// Sorted by amount descending, ties broken by category name ascending.
pub fn compute_category_breakdown(entries: &[LedgerEntry], kind: EntryKind) -> Vec<CategoryAmount> {
    let mut groups: HashMap<&str, KindTotal> = HashMap::new();

    for entry in entries.iter().filter(|e| e.kind == kind && e.is_valid()) {
        let slot = groups.entry(entry.group_key()).or_default();
        slot.amount += entry.amount;
        slot.count += 1;
    }

    let mut breakdown: Vec<CategoryAmount> = groups
        .into_iter()
        .map(|(category, total)| CategoryAmount {
            category: category.to_string(),
            amount: total.amount,
            count: total.count,
        })
        .collect();

    breakdown.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });

    breakdown
}

/// Window covered by a trend: the `lookback_months` calendar months ending
/// with the month containing `today`. `None` when `lookback_months` is 0.
pub fn trend_window(lookback_months: u32, today: NaiveDate) -> Option<DateRange> {
    if lookback_months == 0 {
        return None;
    }
    let this_month = first_day_of_month(today);
    let first = this_month
        .checked_sub_months(Months::new(lookback_months - 1))
        .unwrap_or(NaiveDate::MIN);
    let last = last_day_of_month(today).unwrap_or(today);
    Some(DateRange::days(first, last))
}

/// Bucket valid entries inside the trend window by `YYYY-MM`.
///
/// Only months that contain at least one entry are emitted; there is no
/// zero-fill, so the bucket amounts always sum to the in-window total.
/// Buckets are ordered most recent first.
pub fn compute_monthly_trend(
    entries: &[LedgerEntry],
    lookback_months: u32,
    today: NaiveDate,
) -> Vec<TrendBucket> {
    let Some(window) = trend_window(lookback_months, today) else {
        return Vec::new();
    };

    let mut buckets: BTreeMap<String, KindTotal> = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.is_valid()) {
        let Some(date) = entry.occurred_at else {
            continue;
        };
        if !window.contains(date) {
            continue;
        }
        let slot = buckets.entry(month_key(date)).or_default();
        slot.amount += entry.amount;
        slot.count += 1;
    }

    buckets
        .into_iter()
        .rev()
        .map(|(month_key, total)| TrendBucket {
            month_key,
            amount: total.amount,
            count: total.count,
        })
        .collect()
}

/// Income plus paid invoices minus expenses
pub fn compute_net_income(totals: &Totals) -> Decimal {
    totals.amount(EntryKind::Income) + totals.paid_invoices - totals.amount(EntryKind::Expense)
}

/// Assemble a full report.
///
/// `period_entries` are the owner's entries inside `range`; `trend_entries`
/// cover at least the trend window ending at `today`.
pub fn summarize(
    period_entries: &[LedgerEntry],
    trend_entries: &[LedgerEntry],
    period: &Period,
    range: &DateRange,
    today: NaiveDate,
    lookback_months: u32,
) -> SummaryReport {
    let totals = compute_totals(period_entries);
    let net_income = compute_net_income(&totals);

    let mut category_breakdown = BTreeMap::new();
    let mut monthly_trend = BTreeMap::new();
    for &kind in EntryKind::all() {
        category_breakdown.insert(kind, compute_category_breakdown(period_entries, kind));

        let of_kind: Vec<LedgerEntry> = trend_entries
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect();
        monthly_trend.insert(kind, compute_monthly_trend(&of_kind, lookback_months, today));
    }

    SummaryReport {
        period: ReportPeriod {
            kind: period.kind,
            start: range.start,
            end: range.end,
        },
        totals,
        net_income,
        category_breakdown,
        monthly_trend,
    }
}
