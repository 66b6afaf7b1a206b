//! Numeric inputs for insight generation, derived from aggregation output

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::aggregate::{compute_category_breakdown, compute_net_income, compute_totals};
use crate::ai::{InsightMetrics, TopCategory};
use crate::models::{CategoryAmount, EntryKind, LedgerEntry};

/// How many expense categories are passed to the provider
pub const TOP_CATEGORY_COUNT: usize = 5;

/// Percentage change from `previous` to `current`.
///
/// With no previous spend the change is 0 when there is still none, else 100.
pub fn month_over_month_pct(current: Decimal, previous: Decimal) -> f64 {
    if previous.is_zero() {
        return if current.is_zero() { 0.0 } else { 100.0 };
    }
    ((current - previous) / previous * Decimal::ONE_HUNDRED)
        .to_f64()
        .unwrap_or(0.0)
}

/// First `n` groups of an (already sorted) breakdown
pub fn top_categories(breakdown: &[CategoryAmount], n: usize) -> Vec<TopCategory> {
    breakdown
        .iter()
        .take(n)
        .map(|c| TopCategory {
            category: c.category.clone(),
            amount: c.amount,
        })
        .collect()
}

/// Metrics from the owner's full history and the current/previous calendar months
pub fn build_metrics(
    history: &[LedgerEntry],
    current_month: &[LedgerEntry],
    previous_month: &[LedgerEntry],
) -> InsightMetrics {
    let totals = compute_totals(history);
    let breakdown = compute_category_breakdown(history, EntryKind::Expense);

    let current = compute_totals(current_month).amount(EntryKind::Expense);
    let previous = compute_totals(previous_month).amount(EntryKind::Expense);

    InsightMetrics {
        total_income: totals.amount(EntryKind::Income),
        total_expenses: totals.amount(EntryKind::Expense),
        net_income: compute_net_income(&totals),
        top_categories: top_categories(&breakdown, TOP_CATEGORY_COUNT),
        current_month_expenses: current,
        previous_month_expenses: previous,
        month_over_month_pct: month_over_month_pct(current, previous),
    }
}
