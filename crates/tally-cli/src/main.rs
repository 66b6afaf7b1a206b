//! Tally CLI - ledger summaries and AI-assisted expense entry
//!
//! Usage:
//!   tally init                         Initialize database
//!   tally add expense 12.50 -c foodDining
//!   tally summary --period month       Totals, breakdowns, and trend
//!   tally parse "$12 lunch yesterday"  Free text to a structured expense
//!   tally serve --port 3000            Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Add {
            kind,
            amount,
            owner,
            category,
            status,
            date,
            description,
        } => {
            let db = commands::open_db(&cli.db)?;
            let args = commands::AddArgs {
                kind,
                amount,
                owner,
                category,
                status,
                date,
                description,
            };
            let entry = commands::build_entry(&args, chrono::Local::now().date_naive())?;
            commands::cmd_add(&db, &entry).map(|_| ())
        }
        Commands::List {
            owner,
            period,
            year,
            month,
            limit,
        } => {
            let db = commands::open_db(&cli.db)?;
            let period = commands::period_from_args(&period, year, month);
            commands::cmd_list(&db, &owner, &period, limit)
        }
        Commands::Summary {
            owner,
            period,
            year,
            month,
            json,
        } => {
            let db = commands::open_db(&cli.db)?;
            let period = commands::period_from_args(&period, year, month);
            commands::cmd_summary(
                &db,
                &owner,
                &period,
                config.insights.trend_lookback_months,
                json,
            )
        }
        Commands::Categorize {
            description,
            locale,
        } => {
            let assistant = tally_core::ExpenseAssistant::from_env(&config);
            commands::cmd_categorize(&assistant, &description, &locale).await
        }
        Commands::Parse { text, locale } => {
            let assistant = tally_core::ExpenseAssistant::from_env(&config);
            commands::cmd_parse(&assistant, &text, &locale).await
        }
        Commands::Insights {
            owner,
            locale,
            json,
        } => {
            let db = commands::open_db(&cli.db)?;
            let assistant = tally_core::ExpenseAssistant::from_env(&config);
            commands::cmd_insights(&db, &assistant, &owner, &locale, json).await
        }
        Commands::Serve {
            port,
            host,
            allowed_origins,
        } => commands::cmd_serve(&cli.db, config, &host, port, allowed_origins).await,
    }
}
