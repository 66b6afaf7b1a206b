//! Report handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use chrono::Local;
use serde::Deserialize;

use crate::{AppError, AppState, Endpoint, Governed};
use tally_core::models::SummaryReport;
use tally_core::period::{Period, PeriodKind};
use tally_core::reports::build_summary;

/// Query parameters for the summary report.
///
/// Everything is read leniently: an unknown period kind means all-time and an
/// unparseable year or month is replaced by the current one.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub owner_id: Option<String>,
    /// all, month, or year
    pub period: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
}

impl SummaryQuery {
    pub fn period(&self) -> Period {
        Period {
            kind: self
                .period
                .as_deref()
                .map(PeriodKind::parse_or_all)
                .unwrap_or_default(),
            year: self.year.as_deref().and_then(|y| y.trim().parse().ok()),
            month: self.month.as_deref().and_then(|m| m.trim().parse().ok()),
        }
    }
}

/// GET /api/summary - Totals, breakdowns, and monthly trend for one period
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<SummaryQuery>,
) -> Governed<Json<SummaryReport>> {
    let decision = state.check_rate(&headers, params.owner_id.as_deref(), Endpoint::Summary);
    if !decision.allowed {
        return Governed::denied(decision);
    }

    Governed::new(decision, summary(&state, &params))
}

fn summary(state: &AppState, params: &SummaryQuery) -> Result<Json<SummaryReport>, AppError> {
    let owner_id = params
        .owner_id
        .as_deref()
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .ok_or_else(|| AppError::bad_request("owner_id is required"))?;

    let report = build_summary(
        &state.db,
        owner_id,
        &params.period(),
        Local::now().naive_local(),
        state.config.insights.trend_lookback_months,
    )?;

    Ok(Json(report))
}
