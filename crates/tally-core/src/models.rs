//! Domain models for Tally

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::period::PeriodKind;

/// Kind of ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Expense,
    Income,
    Invoice,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
            Self::Invoice => "invoice",
        }
    }

    pub fn all() -> &'static [EntryKind] {
        &[Self::Expense, Self::Income, Self::Invoice]
    }
}

impl std::str::FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            "invoice" => Ok(Self::Invoice),
            _ => Err(format!("Unknown entry kind: {}", s)),
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Invoice lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "overdue" => Ok(Self::Overdue),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown invoice status: {}", s)),
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The fixed expense category table.
///
/// Order matters: prompts number the categories 1-10 in this order and the
/// provider's answer is mapped back through [`ExpenseCategory::from_number`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpenseCategory {
    FoodDining,
    Transportation,
    Shopping,
    Entertainment,
    BillsUtilities,
    Healthcare,
    Education,
    Travel,
    PersonalCare,
    Other,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FoodDining => "foodDining",
            Self::Transportation => "transportation",
            Self::Shopping => "shopping",
            Self::Entertainment => "entertainment",
            Self::BillsUtilities => "billsUtilities",
            Self::Healthcare => "healthcare",
            Self::Education => "education",
            Self::Travel => "travel",
            Self::PersonalCare => "personalCare",
            Self::Other => "other",
        }
    }

    pub fn all() -> &'static [ExpenseCategory] {
        &[
            Self::FoodDining,
            Self::Transportation,
            Self::Shopping,
            Self::Entertainment,
            Self::BillsUtilities,
            Self::Healthcare,
            Self::Education,
            Self::Travel,
            Self::PersonalCare,
            Self::Other,
        ]
    }

    /// Map a 1-based prompt number to a category
    pub fn from_number(n: i64) -> Option<Self> {
        if n < 1 {
            return None;
        }
        Self::all().get((n - 1) as usize).copied()
    }

    /// 1-based position in the table
    pub fn number(&self) -> usize {
        Self::all()
            .iter()
            .position(|c| c == self)
            .map(|i| i + 1)
            .unwrap_or(Self::all().len())
    }
}

impl std::str::FromStr for ExpenseCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .iter()
            .find(|c| c.as_str().to_lowercase() == wanted)
            .copied()
            .ok_or_else(|| format!("Unknown expense category: {}", s))
    }
}

impl std::fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded expense, income, or invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub owner_id: String,
    pub kind: EntryKind,
    #[serde(serialize_with = "money::serialize")]
    pub amount: Decimal,
    /// Category key for expenses and income
    pub category: Option<String>,
    /// Status for invoices
    pub status: Option<InvoiceStatus>,
    pub description: Option<String>,
    /// `None` when the stored date could not be read
    pub occurred_at: Option<NaiveDate>,
}

impl LedgerEntry {
    /// Entries must carry a positive amount and a readable date to be aggregated
    pub fn is_valid(&self) -> bool {
        self.amount > Decimal::ZERO && self.occurred_at.is_some()
    }

    /// Grouping key for breakdowns: status for invoices, category otherwise
    pub fn group_key(&self) -> &str {
        match self.kind {
            EntryKind::Invoice => self.status.map(|s| s.as_str()).unwrap_or("other"),
            EntryKind::Expense | EntryKind::Income => self
                .category
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or("other"),
        }
    }

    pub fn is_paid_invoice(&self) -> bool {
        self.kind == EntryKind::Invoice && self.status == Some(InvoiceStatus::Paid)
    }
}

/// Fields needed to record a new entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLedgerEntry {
    pub owner_id: String,
    pub kind: EntryKind,
    pub amount: Decimal,
    pub category: Option<String>,
    pub status: Option<InvoiceStatus>,
    pub description: Option<String>,
    pub occurred_at: NaiveDate,
}

/// Amount and count for one entry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct KindTotal {
    #[serde(serialize_with = "money::serialize")]
    pub amount: Decimal,
    pub count: u64,
}

/// Per-kind totals plus the paid-invoice subtotal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub by_kind: BTreeMap<EntryKind, KindTotal>,
    #[serde(serialize_with = "money::serialize")]
    pub paid_invoices: Decimal,
}

impl Totals {
    pub fn get(&self, kind: EntryKind) -> KindTotal {
        self.by_kind.get(&kind).copied().unwrap_or_default()
    }

    pub fn amount(&self, kind: EntryKind) -> Decimal {
        self.get(kind).amount
    }
}

impl Default for Totals {
    fn default() -> Self {
        let by_kind = EntryKind::all()
            .iter()
            .map(|k| (*k, KindTotal::default()))
            .collect();
        Self {
            by_kind,
            paid_invoices: Decimal::ZERO,
        }
    }
}

/// One group of a category (or invoice status) breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryAmount {
    pub category: String,
    #[serde(serialize_with = "money::serialize")]
    pub amount: Decimal,
    pub count: u64,
}

/// One non-empty month of a trend series
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendBucket {
    /// `YYYY-MM`
    pub month_key: String,
    #[serde(serialize_with = "money::serialize")]
    pub amount: Decimal,
    pub count: u64,
}

/// The period a report covers, with its resolved bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportPeriod {
    pub kind: PeriodKind,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Aggregated output for one period
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub period: ReportPeriod,
    pub totals: Totals,
    #[serde(serialize_with = "money::serialize")]
    pub net_income: Decimal,
    pub category_breakdown: BTreeMap<EntryKind, Vec<CategoryAmount>>,
    /// Most recent month first; months without entries are omitted
    pub monthly_trend: BTreeMap<EntryKind, Vec<TrendBucket>>,
}

/// Money serialization: exact internally, rounded to cents on the wire
pub mod money {
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal::{Decimal, RoundingStrategy};
    use serde::Serializer;

    pub fn round(value: Decimal) -> Decimal {
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(round(*value).to_f64().unwrap_or(0.0))
    }

    pub fn serialize_option<S: Serializer>(
        value: &Option<Decimal>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serialize(v, serializer),
            None => serializer.serialize_none(),
        }
    }
}
