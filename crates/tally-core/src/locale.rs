//! Supported locales, localized category labels, and fallback texts

use serde::{Deserialize, Serialize};

use crate::models::ExpenseCategory;

/// Reply language for assistant operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    /// Parse a locale code such as `es`, `es-MX` or `en_US`; unknown codes give English
    pub fn from_code(code: &str) -> Self {
        let lang = code
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        match lang.as_str() {
            "es" => Self::Es,
            _ => Self::En,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }

    /// Language name as written into prompts
    pub fn language_name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Es => "Spanish",
        }
    }

    pub fn category_label(&self, category: ExpenseCategory) -> &'static str {
        use ExpenseCategory::*;
        match (self, category) {
            (Self::En, FoodDining) => "Food & Dining",
            (Self::En, Transportation) => "Transportation",
            (Self::En, Shopping) => "Shopping",
            (Self::En, Entertainment) => "Entertainment",
            (Self::En, BillsUtilities) => "Bills & Utilities",
            (Self::En, Healthcare) => "Healthcare",
            (Self::En, Education) => "Education",
            (Self::En, Travel) => "Travel",
            (Self::En, PersonalCare) => "Personal Care",
            (Self::En, Other) => "Other",
            (Self::Es, FoodDining) => "Comida y restaurantes",
            (Self::Es, Transportation) => "Transporte",
            (Self::Es, Shopping) => "Compras",
            (Self::Es, Entertainment) => "Entretenimiento",
            (Self::Es, BillsUtilities) => "Facturas y servicios",
            (Self::Es, Healthcare) => "Salud",
            (Self::Es, Education) => "Educación",
            (Self::Es, Travel) => "Viajes",
            (Self::Es, PersonalCare) => "Cuidado personal",
            (Self::Es, Other) => "Otros",
        }
    }

    /// Label for a category key, or the key itself when it is not in the table
    pub fn label_for_key(&self, key: &str) -> String {
        key.parse::<ExpenseCategory>()
            .map(|c| self.category_label(c).to_string())
            .unwrap_or_else(|_| key.to_string())
    }

    /// Numbered category list for prompts, one per line
    pub fn numbered_categories(&self) -> String {
        ExpenseCategory::all()
            .iter()
            .map(|c| format!("{}. {}", c.number(), self.category_label(*c)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn fallback_summary(&self, total_expenses: &str, month_over_month_pct: f64) -> String {
        match self {
            Self::En => format!(
                "You have spent ${} in total. Spending changed {:+.1}% compared to last month.",
                total_expenses, month_over_month_pct
            ),
            Self::Es => format!(
                "Has gastado ${} en total. El gasto cambió {:+.1}% respecto al mes anterior.",
                total_expenses, month_over_month_pct
            ),
        }
    }

    pub fn trend_top_category(&self, label: &str) -> String {
        match self {
            Self::En => format!("Your top spending category is {}.", label),
            Self::Es => format!("Tu categoría con más gasto es {}.", label),
        }
    }

    pub fn trend_no_expenses(&self) -> String {
        match self {
            Self::En => "No expenses have been recorded yet.".to_string(),
            Self::Es => "Todavía no se han registrado gastos.".to_string(),
        }
    }

    pub fn trend_stable(&self, month_over_month_pct: f64) -> String {
        match self {
            Self::En => format!(
                "Your monthly spending is stable ({:+.1}% vs last month).",
                month_over_month_pct
            ),
            Self::Es => format!(
                "Tu gasto mensual es estable ({:+.1}% frente al mes anterior).",
                month_over_month_pct
            ),
        }
    }

    pub fn trend_volatile(&self, month_over_month_pct: f64) -> String {
        match self {
            Self::En => format!(
                "Your monthly spending is volatile ({:+.1}% vs last month).",
                month_over_month_pct
            ),
            Self::Es => format!(
                "Tu gasto mensual es variable ({:+.1}% frente al mes anterior).",
                month_over_month_pct
            ),
        }
    }

    pub fn generic_recommendations(&self) -> Vec<String> {
        let recs: [&str; 3] = match self {
            Self::En => [
                "Set a monthly budget for your top spending category.",
                "Review recurring charges and cancel the ones you no longer use.",
                "Move part of your income into savings at the start of each month.",
            ],
            Self::Es => [
                "Define un presupuesto mensual para tu categoría con más gasto.",
                "Revisa los cargos recurrentes y cancela los que ya no uses.",
                "Aparta una parte de tus ingresos para ahorrar al inicio de cada mes.",
            ],
        };
        recs.iter().map(|s| s.to_string()).collect()
    }

    pub fn alert_spending_spike(&self, month_over_month_pct: f64) -> String {
        match self {
            Self::En => format!(
                "Spending rose {:.1}% compared to last month.",
                month_over_month_pct
            ),
            Self::Es => format!(
                "El gasto aumentó {:.1}% respecto al mes anterior.",
                month_over_month_pct
            ),
        }
    }
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_code(s))
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
