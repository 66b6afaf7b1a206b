//! Text-understanding operations backed by a provider, with local fallbacks
//!
//! `ExpenseAssistant` never returns an error. Every provider call is bounded
//! by a timeout; a timeout, transport failure, error status, or unusable
//! reply is logged and replaced by a deterministic local result. There is no
//! retry: a failed call goes straight to the fallback.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::ai::parsing::{
    amount_from_value, extract_json_object, first_amount, first_integer, integer_from_value,
    truncate,
};
use crate::ai::{
    InsightMetrics, InsightReport, ParsedExpense, ProviderClient, ProviderError, TextProvider,
};
use crate::config::TallyConfig;
use crate::locale::Locale;
use crate::models::{money, ExpenseCategory};
use crate::prompts::{PromptId, PromptLibrary};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Tunables for the assistant
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantSettings {
    /// Upper bound on one provider call
    pub timeout: Duration,
    /// Month-over-month increase (percent) above which the fallback raises an alert
    pub alert_threshold_pct: f64,
    /// Month-over-month change (percent) the fallback still calls stable
    pub stability_threshold_pct: f64,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self::from(&TallyConfig::default())
    }
}

impl From<&TallyConfig> for AssistantSettings {
    fn from(config: &TallyConfig) -> Self {
        Self {
            timeout: config.provider.timeout,
            alert_threshold_pct: config.insights.alert_threshold_pct,
            stability_threshold_pct: config.insights.stability_threshold_pct,
        }
    }
}

/// Categorization, free-text parsing, and insight generation
#[derive(Clone)]
pub struct ExpenseAssistant {
    provider: Option<ProviderClient>,
    prompts: Arc<PromptLibrary>,
    settings: AssistantSettings,
}

impl ExpenseAssistant {
    pub fn new(
        provider: Option<ProviderClient>,
        prompts: PromptLibrary,
        settings: AssistantSettings,
    ) -> Self {
        Self {
            provider,
            prompts: Arc::new(prompts),
            settings,
        }
    }

    /// Provider from `AI_BACKEND` and friends, prompts with on-disk overrides
    pub fn from_env(config: &TallyConfig) -> Self {
        Self::from_config(ProviderClient::from_env(), PromptLibrary::new(), config)
    }

    /// Build from runtime configuration.
    ///
    /// A missing provider is warned about once here; the per-call fallbacks
    /// that follow are logged at debug level.
    pub fn from_config(
        provider: Option<ProviderClient>,
        prompts: PromptLibrary,
        config: &TallyConfig,
    ) -> Self {
        if provider.is_none() {
            warn!(
                "No AI provider configured (set OPENAI_COMPATIBLE_HOST or OLLAMA_HOST); \
                 assistant operations will use local fallbacks"
            );
        }
        Self::new(provider, prompts, AssistantSettings::from(config))
    }

    /// No provider: every operation uses its fallback
    pub fn offline() -> Self {
        Self::new(
            None,
            PromptLibrary::embedded_only(),
            AssistantSettings::default(),
        )
    }

    pub fn provider(&self) -> Option<&ProviderClient> {
        self.provider.as_ref()
    }

    pub fn settings(&self) -> &AssistantSettings {
        &self.settings
    }

    /// Suggest a category for an expense description.
    ///
    /// Always returns one of the ten table entries; `Other` on any failure.
    pub async fn categorize(&self, description: &str, locale: Locale) -> ExpenseCategory {
        let mut vars = HashMap::new();
        vars.insert("description", description.to_string());
        vars.insert("categories", locale.numbered_categories());
        vars.insert("language", locale.language_name().to_string());

        let Some(reply) = self
            .complete("categorize", PromptId::CategorizeExpense, &vars)
            .await
        else {
            return ExpenseCategory::Other;
        };

        match first_integer(&reply).and_then(ExpenseCategory::from_number) {
            Some(category) => category,
            None => {
                warn!(
                    operation = "categorize",
                    reply = %truncate(&reply, 80),
                    "No category number in provider reply, using fallback"
                );
                ExpenseCategory::Other
            }
        }
    }

    /// Turn free text like "$12 lunch yesterday" into a structured expense
    pub async fn parse_from_text(&self, text: &str, locale: Locale) -> ParsedExpense {
        self.parse_from_text_on(text, locale, Local::now().date_naive())
            .await
    }

    /// [`Self::parse_from_text`] with an explicit "today"
    pub async fn parse_from_text_on(
        &self,
        text: &str,
        locale: Locale,
        today: NaiveDate,
    ) -> ParsedExpense {
        let mut vars = HashMap::new();
        vars.insert("text", text.to_string());
        vars.insert("today", today.format(DATE_FORMAT).to_string());
        vars.insert("categories", locale.numbered_categories());
        vars.insert("language", locale.language_name().to_string());

        let Some(reply) = self.complete("parse", PromptId::ParseExpense, &vars).await else {
            return fallback_parse(text, today);
        };

        match extract_json_object(&reply) {
            Ok(map) => parsed_from_json(&map, text, today),
            Err(e) => {
                warn!(operation = "parse", error = %e, "Unusable provider reply, using fallback");
                fallback_parse(text, today)
            }
        }
    }

    /// Narrative insights for a set of metrics
    pub async fn generate_insights(
        &self,
        metrics: &InsightMetrics,
        locale: Locale,
    ) -> InsightReport {
        let mut vars = HashMap::new();
        vars.insert("language", locale.language_name().to_string());
        vars.insert("total_income", format_money(metrics.total_income));
        vars.insert("total_expenses", format_money(metrics.total_expenses));
        vars.insert("net_income", format_money(metrics.net_income));
        vars.insert(
            "current_month_expenses",
            format_money(metrics.current_month_expenses),
        );
        vars.insert(
            "previous_month_expenses",
            format_money(metrics.previous_month_expenses),
        );
        vars.insert(
            "month_over_month_pct",
            format!("{:.1}", metrics.month_over_month_pct),
        );
        vars.insert(
            "top_categories",
            metrics
                .top_categories
                .iter()
                .map(|c| {
                    format!(
                        "- {}: {}",
                        locale.label_for_key(&c.category),
                        format_money(c.amount)
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
        );

        let Some(reply) = self
            .complete("insights", PromptId::GenerateInsights, &vars)
            .await
        else {
            return self.fallback_insights(metrics, locale);
        };

        match insights_from_reply(&reply) {
            Ok(report) => report,
            Err(e) => {
                warn!(operation = "insights", error = %e, "Unusable provider reply, using fallback");
                self.fallback_insights(metrics, locale)
            }
        }
    }

    /// Templated insights used whenever the provider cannot help
    pub fn fallback_insights(&self, metrics: &InsightMetrics, locale: Locale) -> InsightReport {
        let pct = metrics.month_over_month_pct;

        let top = metrics
            .top_categories
            .first()
            .map(|c| locale.trend_top_category(&locale.label_for_key(&c.category)))
            .unwrap_or_else(|| locale.trend_no_expenses());
        let stability = if pct.abs() <= self.settings.stability_threshold_pct {
            locale.trend_stable(pct)
        } else {
            locale.trend_volatile(pct)
        };

        let alerts = if pct > self.settings.alert_threshold_pct {
            vec![locale.alert_spending_spike(pct)]
        } else {
            Vec::new()
        };

        InsightReport {
            summary: locale.fallback_summary(&format_money(metrics.total_expenses), pct),
            trends: vec![top, stability],
            recommendations: locale.generic_recommendations(),
            alerts,
        }
    }

    /// Render and send one prompt. `None` means "use the fallback"; the reason
    /// has already been logged.
    async fn complete(
        &self,
        operation: &'static str,
        id: PromptId,
        vars: &HashMap<&str, String>,
    ) -> Option<String> {
        let Some(provider) = &self.provider else {
            debug!(operation, "No provider configured, using fallback");
            return None;
        };

        let prompt = self.prompts.get(id);
        let rendered = prompt.render(vars);

        let result = match tokio::time::timeout(
            self.settings.timeout,
            provider.complete(&rendered, prompt.temperature, prompt.max_tokens),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout),
        };

        match result {
            Ok(reply) => Some(reply),
            Err(e) => {
                warn!(
                    operation,
                    backend = provider.backend_name(),
                    model = provider.model(),
                    error = %e,
                    "Provider call failed, using fallback"
                );
                None
            }
        }
    }
}

fn format_money(value: rust_decimal::Decimal) -> String {
    format!("{:.2}", money::round(value))
}

fn fallback_parse(text: &str, today: NaiveDate) -> ParsedExpense {
    ParsedExpense {
        amount: first_amount(text),
        description: text.to_string(),
        category: None,
        date: today.format(DATE_FORMAT).to_string(),
    }
}

fn parsed_from_json(map: &Map<String, Value>, text: &str, today: NaiveDate) -> ParsedExpense {
    let amount = map.get("amount").and_then(amount_from_value);

    let description = map
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(text)
        .to_string();

    let category = map
        .get("categoryNumber")
        .and_then(integer_from_value)
        .and_then(ExpenseCategory::from_number)
        .unwrap_or(ExpenseCategory::Other);

    let date = map
        .get("date")
        .and_then(Value::as_str)
        .and_then(|d| NaiveDate::parse_from_str(d.trim(), DATE_FORMAT).ok())
        .unwrap_or(today);

    ParsedExpense {
        amount,
        description,
        category: Some(category.as_str().to_string()),
        date: date.format(DATE_FORMAT).to_string(),
    }
}

fn insights_from_reply(reply: &str) -> Result<InsightReport, ProviderError> {
    let map = extract_json_object(reply)?;

    let summary = map
        .get("summary")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProviderError::InvalidResponse("missing summary".into()))?
        .to_string();

    Ok(InsightReport {
        summary,
        trends: string_list(map.get("trends")),
        recommendations: string_list(map.get("recommendations")),
        alerts: string_list(map.get("alerts")),
    })
}

/// Strings of a JSON array; anything else is an empty list
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
