//! Result types produced by the assistant operations

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::money;

/// Structured expense extracted from free text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedExpense {
    #[serde(serialize_with = "money::serialize_option")]
    pub amount: Option<Decimal>,
    pub description: String,
    /// Category key, or `None` when the text could not be understood
    pub category: Option<String>,
    /// `YYYY-MM-DD`
    pub date: String,
}

/// A category and its spend, as fed into insight prompts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCategory {
    pub category: String,
    #[serde(serialize_with = "money::serialize")]
    pub amount: Decimal,
}

/// Numeric inputs for insight generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightMetrics {
    #[serde(serialize_with = "money::serialize")]
    pub total_income: Decimal,
    #[serde(serialize_with = "money::serialize")]
    pub total_expenses: Decimal,
    #[serde(serialize_with = "money::serialize")]
    pub net_income: Decimal,
    pub top_categories: Vec<TopCategory>,
    #[serde(serialize_with = "money::serialize")]
    pub current_month_expenses: Decimal,
    #[serde(serialize_with = "money::serialize")]
    pub previous_month_expenses: Decimal,
    /// Percentage change from the previous month to the current one
    pub month_over_month_pct: f64,
}

/// Narrative insight summary
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InsightReport {
    pub summary: String,
    pub trends: Vec<String>,
    pub recommendations: Vec<String>,
    pub alerts: Vec<String>,
}
