//! Server command implementation

use std::path::Path;

use anyhow::Result;
use tally_core::assistant::ExpenseAssistant;
use tally_core::config::TallyConfig;
use tally_server::{AppState, ServerConfig};

use super::open_db;

pub async fn cmd_serve(
    db_path: &Path,
    config: TallyConfig,
    host: &str,
    port: u16,
    allowed_origins: Vec<String>,
) -> Result<()> {
    println!("🚀 Starting Tally web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    println!(
        "   Rate limits: summary {}/{}s, ai {}/{}s",
        config.rate_limits.summary.max_requests,
        config.rate_limits.summary.window_seconds,
        config.rate_limits.ai.max_requests,
        config.rate_limits.ai.window_seconds
    );
    if !allowed_origins.is_empty() {
        println!("   CORS origins: {}", allowed_origins.join(", "));
    }
    println!();

    let db = open_db(db_path)?;
    let assistant = ExpenseAssistant::from_env(&config);
    let state = AppState::new(db, assistant, config);

    tally_server::serve(state, host, port, ServerConfig { allowed_origins }).await
}
