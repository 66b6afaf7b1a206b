//! Report command implementations

use anyhow::Result;
use chrono::Local;
use tally_core::db::Database;
use tally_core::models::{EntryKind, SummaryReport};
use tally_core::period::Period;
use tally_core::reports::build_summary;

use super::{format_money, truncate};

pub fn cmd_summary(
    db: &Database,
    owner: &str,
    period: &Period,
    lookback_months: u32,
    json: bool,
) -> Result<()> {
    let report = build_summary(
        db,
        owner,
        period,
        Local::now().naive_local(),
        lookback_months,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(())
}

fn print_summary(report: &SummaryReport) {
    println!();
    println!("📊 Summary ({})", report.period.kind);
    if report.period.kind != tally_core::PeriodKind::All {
        println!(
            "   Period: {} to {}",
            report.period.start.date(),
            report.period.end.date()
        );
    }
    println!("   ─────────────────────────────");

    for &kind in EntryKind::all() {
        let total = report.totals.get(kind);
        println!(
            "   {:8} {:>12}  ({} entries)",
            kind.as_str(),
            format_money(total.amount),
            total.count
        );
    }
    println!(
        "   {:8} {:>12}",
        "paid inv",
        format_money(report.totals.paid_invoices)
    );
    println!("   Net income: {}", format_money(report.net_income));

    for &kind in EntryKind::all() {
        let Some(breakdown) = report.category_breakdown.get(&kind) else {
            continue;
        };
        if breakdown.is_empty() {
            continue;
        }
        println!();
        let grouping = if kind == EntryKind::Invoice {
            "status"
        } else {
            "category"
        };
        println!("   {} by {}", kind.as_str(), grouping);
        for group in breakdown {
            println!(
                "     {:20} {:>12} {:>5}",
                truncate(&group.category, 20),
                format_money(group.amount),
                group.count
            );
        }
    }

    if let Some(trend) = report
        .monthly_trend
        .get(&EntryKind::Expense)
        .filter(|t| !t.is_empty())
    {
        println!();
        println!("   📈 Monthly expenses");
        for bucket in trend {
            println!(
                "     {} {:>12} {:>5}",
                bucket.month_key,
                format_money(bucket.amount),
                bucket.count
            );
        }
    }
}
