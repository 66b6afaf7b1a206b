//! Integration tests for tally-core
//!
//! These tests exercise the store → report → assistant workflow.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_core::{
    assistant::{AssistantSettings, ExpenseAssistant},
    reports::{build_insight_metrics, build_summary},
    Database, EntryKind, InvoiceStatus, Locale, MockProvider, NewLedgerEntry, Period,
    PromptLibrary, ProviderClient, ProviderError,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn add(db: &Database, kind: EntryKind, amount: &str, key: &str, on: NaiveDate) {
    let (category, status) = match kind {
        EntryKind::Invoice => (None, Some(InvoiceStatus::from_str(key).unwrap())),
        _ => (Some(key.to_string()), None),
    };
    db.insert_entry(&NewLedgerEntry {
        owner_id: "owner-1".into(),
        kind,
        amount: Decimal::from_str(amount).unwrap(),
        category,
        status,
        description: None,
        occurred_at: on,
    })
    .expect("Failed to insert entry");
}

fn seeded_db() -> Database {
    let db = Database::in_memory().expect("Failed to create in-memory database");
    add(&db, EntryKind::Expense, "50", "foodDining", date(2025, 11, 1));
    add(&db, EntryKind::Expense, "30", "transportation", date(2025, 11, 5));
    add(&db, EntryKind::Income, "1000", "salary", date(2025, 11, 1));
    add(&db, EntryKind::Invoice, "400", "paid", date(2025, 11, 8));
    add(&db, EntryKind::Invoice, "250", "pending", date(2025, 11, 9));
    add(&db, EntryKind::Expense, "60", "foodDining", date(2025, 10, 20));
    db
}

// =============================================================================
// Report assembly
// =============================================================================

#[test]
fn test_month_summary_from_sqlite() {
    let db = seeded_db();
    let now = date(2025, 11, 20).and_hms_opt(9, 0, 0).unwrap();

    let report = build_summary(&db, "owner-1", &Period::month(2025, 11), now, 12).unwrap();

    let expense = report.totals.get(EntryKind::Expense);
    assert_eq!(expense.amount, Decimal::from(80));
    assert_eq!(expense.count, 2);
    assert_eq!(report.totals.get(EntryKind::Invoice).count, 2);
    assert_eq!(report.totals.paid_invoices, Decimal::from(400));
    assert_eq!(report.net_income, Decimal::from(1320));

    let breakdown = &report.category_breakdown[&EntryKind::Expense];
    assert_eq!(breakdown[0].category, "foodDining");
    assert_eq!(breakdown[0].amount, Decimal::from(50));
    assert_eq!(breakdown[1].category, "transportation");

    let statuses: Vec<_> = report.category_breakdown[&EntryKind::Invoice]
        .iter()
        .map(|c| c.category.as_str())
        .collect();
    assert_eq!(statuses, vec!["paid", "pending"]);

    let trend = &report.monthly_trend[&EntryKind::Expense];
    assert_eq!(trend[0].month_key, "2025-11");
    assert_eq!(trend[1].month_key, "2025-10");
    assert_eq!(trend[1].amount, Decimal::from(60));
}

#[test]
fn test_summary_serializes_rounded_money() {
    let db = Database::in_memory().unwrap();
    add(&db, EntryKind::Expense, "0.105", "other", date(2025, 11, 1));
    add(&db, EntryKind::Expense, "0.10", "other", date(2025, 11, 2));
    let now = date(2025, 11, 20).and_hms_opt(9, 0, 0).unwrap();

    let report = build_summary(&db, "owner-1", &Period::all(), now, 12).unwrap();
    assert_eq!(
        report.totals.amount(EntryKind::Expense),
        Decimal::from_str("0.205").unwrap()
    );

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["totals"]["by_kind"]["expense"]["amount"], 0.21);
    assert_eq!(json["period"]["kind"], "all");
}

#[test]
fn test_other_owner_sees_nothing() {
    let db = seeded_db();
    let now = date(2025, 11, 20).and_hms_opt(9, 0, 0).unwrap();
    let report = build_summary(&db, "owner-2", &Period::all(), now, 12).unwrap();
    assert!(report.net_income.is_zero());
    assert!(report.category_breakdown.values().all(|b| b.is_empty()));
}

// =============================================================================
// Insights
// =============================================================================

#[tokio::test]
async fn test_insights_fallback_end_to_end() {
    let db = seeded_db();
    let metrics = build_insight_metrics(&db, "owner-1", date(2025, 11, 20)).unwrap();
    assert_eq!(metrics.total_expenses, Decimal::from(140));
    assert!((metrics.month_over_month_pct - 33.333).abs() < 0.01);

    let assistant = ExpenseAssistant::new(
        Some(ProviderClient::mock(MockProvider::failing(
            ProviderError::RateLimited,
        ))),
        PromptLibrary::embedded_only(),
        AssistantSettings::default(),
    );

    let report = assistant.generate_insights(&metrics, Locale::En).await;
    assert!(report.summary.contains("140.00"));
    assert!(!report.trends.is_empty());
    assert!(!report.recommendations.is_empty());
    assert_eq!(report.alerts.len(), 1);
}

#[tokio::test]
async fn test_offline_assistant_never_fails() {
    let assistant = ExpenseAssistant::offline();

    assert_eq!(
        assistant.categorize("Dinner", Locale::Es).await.as_str(),
        "other"
    );

    let parsed = assistant
        .parse_from_text_on("spent 12.40 at the market", Locale::En, date(2025, 11, 20))
        .await;
    assert_eq!(parsed.amount, Some(Decimal::from_str("12.40").unwrap()));
    assert_eq!(parsed.date, "2025-11-20");
    assert_eq!(parsed.category, None);
}
