//! Tally Core Library
//!
//! Shared functionality for the Tally ledger service:
//! - Period resolution and ledger aggregation (totals, breakdowns, trends)
//! - Fixed-window rate governance keyed by identity and endpoint
//! - Pluggable text-generation backends (OpenAI-compatible, Ollama)
//! - Expense categorization, free-text parsing, and insights with local fallbacks
//! - Prompt library for customizable prompts
//! - SQLite ledger store with connection pooling

pub mod aggregate;
pub mod ai;
pub mod assistant;
pub mod config;
pub mod db;
pub mod error;
pub mod insights;
pub mod ledger;
pub mod locale;
pub mod models;
pub mod period;
pub mod prompts;
pub mod rate_governor;
pub mod reports;

/// Test utilities including a mock provider server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    InsightMetrics, InsightReport, MockProvider, OllamaBackend, OpenAICompatibleBackend,
    ParsedExpense, ProviderClient, ProviderError, TextProvider, TopCategory,
};
pub use assistant::{AssistantSettings, ExpenseAssistant};
pub use config::TallyConfig;
pub use db::Database;
pub use error::{Error, Result};
pub use ledger::{EntryFilter, LedgerStore};
pub use locale::Locale;
pub use models::{
    EntryKind, ExpenseCategory, InvoiceStatus, LedgerEntry, NewLedgerEntry, SummaryReport, Totals,
};
pub use period::{DateRange, Period, PeriodKind};
pub use prompts::{Prompt, PromptId, PromptLibrary};
pub use rate_governor::{RateDecision, RateGovernor, RateLimitConfig};
