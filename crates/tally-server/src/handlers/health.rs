//! Health check handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use tally_core::TextProvider;

#[derive(Debug, Serialize)]
pub struct ProviderStatus {
    pub configured: bool,
    pub backend: Option<&'static str>,
    pub model: Option<String>,
    pub host: Option<String>,
    pub healthy: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub provider: ProviderStatus,
}

/// GET /api/health - Server and provider status (not rate limited)
///
/// An unreachable provider does not make the server unhealthy; AI routes
/// keep answering with fallbacks.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let provider = match state.assistant.provider() {
        Some(p) => ProviderStatus {
            configured: true,
            backend: Some(p.backend_name()),
            model: Some(p.model().to_string()),
            host: Some(p.host().to_string()),
            healthy: p.health_check().await,
        },
        None => ProviderStatus {
            configured: false,
            backend: None,
            model: None,
            host: None,
            healthy: false,
        },
    };

    Json(HealthResponse {
        status: "ok",
        provider,
    })
}
