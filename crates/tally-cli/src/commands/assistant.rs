//! AI-assisted command implementations
//!
//! Each command always prints a result; when no provider is configured or the
//! provider fails, the assistant's local fallback is shown instead.

use anyhow::Result;
use chrono::Local;
use tally_core::assistant::ExpenseAssistant;
use tally_core::db::Database;
use tally_core::locale::Locale;
use tally_core::reports::build_insight_metrics;

use super::format_money;

fn provider_tip(assistant: &ExpenseAssistant) {
    if assistant.provider().is_none() {
        println!("   💡 Tip: Set OPENAI_COMPATIBLE_HOST or OLLAMA_HOST for AI answers");
    }
}

pub async fn cmd_categorize(
    assistant: &ExpenseAssistant,
    description: &str,
    locale: &str,
) -> Result<()> {
    let locale = Locale::from_code(locale);
    provider_tip(assistant);

    let category = assistant.categorize(description, locale).await;
    println!("{} ({})", locale.category_label(category), category);

    Ok(())
}

pub async fn cmd_parse(assistant: &ExpenseAssistant, text: &str, locale: &str) -> Result<()> {
    let locale = Locale::from_code(locale);
    provider_tip(assistant);

    let parsed = assistant.parse_from_text(text, locale).await;

    println!(
        "   Amount:      {}",
        parsed
            .amount
            .map(format_money)
            .unwrap_or_else(|| "-".to_string())
    );
    println!("   Description: {}", parsed.description);
    println!(
        "   Category:    {}",
        parsed
            .category
            .as_deref()
            .map(|c| locale.label_for_key(c))
            .unwrap_or_else(|| "-".to_string())
    );
    println!("   Date:        {}", parsed.date);

    Ok(())
}

pub async fn cmd_insights(
    db: &Database,
    assistant: &ExpenseAssistant,
    owner: &str,
    locale: &str,
    json: bool,
) -> Result<()> {
    let locale = Locale::from_code(locale);
    let metrics = build_insight_metrics(db, owner, Local::now().date_naive())?;
    let report = assistant.generate_insights(&metrics, locale).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    provider_tip(assistant);
    println!();
    println!("💡 {}", report.summary);
    println!(
        "   Expenses: {}  this month: {}  last month: {}",
        format_money(metrics.total_expenses),
        format_money(metrics.current_month_expenses),
        format_money(metrics.previous_month_expenses)
    );

    let sections = [
        ("📈 Trends", &report.trends),
        ("✅ Recommendations", &report.recommendations),
        ("⚠️  Alerts", &report.alerts),
    ];
    for (title, items) in sections {
        if items.is_empty() {
            continue;
        }
        println!();
        println!("{}", title);
        for item in items {
            println!("   - {}", item);
        }
    }

    Ok(())
}
