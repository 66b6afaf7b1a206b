//! AI-assisted handlers: categorize, parse, insights
//!
//! These never surface provider failures; the assistant substitutes its
//! fallback and the response is still 200. Bodies are decoded after the rate
//! check so malformed requests count against the caller's window too.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState, Endpoint, Governed};
use tally_core::ai::{InsightReport, ParsedExpense};
use tally_core::locale::Locale;
use tally_core::models::ExpenseCategory;
use tally_core::reports::build_insight_metrics;

fn locale_of(code: Option<&str>) -> Locale {
    code.map(Locale::from_code).unwrap_or_default()
}

type JsonBody<T> = Result<Json<T>, JsonRejection>;

fn rejected(rejection: JsonRejection) -> AppError {
    AppError::bad_request(&rejection.body_text())
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::bad_request(&format!("{} is required", field)));
    }
    Ok(value)
}

#[derive(Debug, Deserialize)]
pub struct CategorizeRequest {
    pub description: String,
    pub locale: Option<String>,
    pub owner_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategorizeResponse {
    pub category: ExpenseCategory,
}

/// POST /api/ai/categorize - Suggest an expense category for a description
pub async fn categorize(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: JsonBody<CategorizeRequest>,
) -> Governed<Json<CategorizeResponse>> {
    let owner_id = body.as_ref().ok().and_then(|Json(b)| b.owner_id.as_deref());
    let decision = state.check_rate(&headers, owner_id, Endpoint::Categorize);
    if !decision.allowed {
        return Governed::denied(decision);
    }

    let result = match body {
        Ok(Json(body)) => categorize_body(&state, &body).await,
        Err(rejection) => Err(rejected(rejection)),
    };
    Governed::new(decision, result)
}

async fn categorize_body(
    state: &AppState,
    body: &CategorizeRequest,
) -> Result<Json<CategorizeResponse>, AppError> {
    let description = required(&body.description, "description")?;
    let category = state
        .assistant
        .categorize(description, locale_of(body.locale.as_deref()))
        .await;
    Ok(Json(CategorizeResponse { category }))
}

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub text: String,
    pub locale: Option<String>,
    pub owner_id: Option<String>,
}

/// POST /api/ai/parse - Turn free text into a structured expense
pub async fn parse_expense(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: JsonBody<ParseRequest>,
) -> Governed<Json<ParsedExpense>> {
    let owner_id = body.as_ref().ok().and_then(|Json(b)| b.owner_id.as_deref());
    let decision = state.check_rate(&headers, owner_id, Endpoint::Parse);
    if !decision.allowed {
        return Governed::denied(decision);
    }

    let result = match body {
        Ok(Json(body)) => parse_body(&state, &body).await,
        Err(rejection) => Err(rejected(rejection)),
    };
    Governed::new(decision, result)
}

async fn parse_body(state: &AppState, body: &ParseRequest) -> Result<Json<ParsedExpense>, AppError> {
    let text = required(&body.text, "text")?;
    let parsed = state
        .assistant
        .parse_from_text(text, locale_of(body.locale.as_deref()))
        .await;
    Ok(Json(parsed))
}

#[derive(Debug, Deserialize)]
pub struct InsightsRequest {
    pub owner_id: String,
    pub locale: Option<String>,
}

/// POST /api/ai/insights - Narrative insights over the owner's ledger
pub async fn generate_insights(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: JsonBody<InsightsRequest>,
) -> Governed<Json<InsightReport>> {
    let owner_id = body.as_ref().ok().map(|Json(b)| b.owner_id.as_str());
    let decision = state.check_rate(&headers, owner_id, Endpoint::Insights);
    if !decision.allowed {
        return Governed::denied(decision);
    }

    let result = match body {
        Ok(Json(body)) => insights_body(&state, &body).await,
        Err(rejection) => Err(rejected(rejection)),
    };
    Governed::new(decision, result)
}

async fn insights_body(state: &AppState, body: &InsightsRequest) -> Result<Json<InsightReport>, AppError> {
    let owner_id = required(&body.owner_id, "owner_id")?;
    let metrics = build_insight_metrics(&state.db, owner_id, Local::now().date_naive())?;

    let report = state
        .assistant
        .generate_insights(&metrics, locale_of(body.locale.as_deref()))
        .await;

    Ok(Json(report))
}
