//! Tally Web Server
//!
//! Axum-based REST API for Tally.
//!
//! - Summary reports over the ledger store
//! - AI-assisted categorization, parsing, and insights (always answers, with fallbacks)
//! - Per-identity fixed-window rate governance on every report and AI route
//! - Sanitized error responses
//!
//! The server performs no authentication. The caller identity used for rate
//! governance comes from the `x-tally-identity` header set by the upstream
//! auth proxy.

use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use tally_core::config::RateLimits;
use tally_core::{
    Database, ExpenseAssistant, RateDecision, RateGovernor, RateLimitConfig, TallyConfig,
    TextProvider,
};

mod handlers;

/// Header carrying the caller identity, set by the upstream auth proxy
pub const IDENTITY_HEADER: &str = "x-tally-identity";

/// Identity used when neither the header nor an owner id is present
pub const ANONYMOUS_IDENTITY: &str = "anonymous";

const RATE_LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const RATE_REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RATE_RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub assistant: ExpenseAssistant,
    pub governor: RateGovernor,
    pub config: TallyConfig,
}

impl AppState {
    pub fn new(db: Database, assistant: ExpenseAssistant, config: TallyConfig) -> Self {
        Self {
            db,
            assistant,
            governor: RateGovernor::with_cleanup_interval(config.rate_limits.cleanup_interval),
            config,
        }
    }

    /// Count one request against the caller's window for `endpoint`
    pub fn check_rate(
        &self,
        headers: &HeaderMap,
        owner_id: Option<&str>,
        endpoint: Endpoint,
    ) -> RateDecision {
        let identity = caller_identity(headers, owner_id);
        let decision = self.governor.check(
            &identity,
            endpoint.as_str(),
            endpoint.limit(&self.config.rate_limits),
        );
        if !decision.allowed {
            warn!(
                identity = %identity,
                endpoint = endpoint.as_str(),
                reset_in_seconds = decision.reset_in_seconds,
                "Rate limit exceeded"
            );
        }
        decision
    }
}

/// Governed routes; each has its own window per identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Summary,
    Categorize,
    Parse,
    Insights,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Categorize => "ai_categorize",
            Self::Parse => "ai_parse",
            Self::Insights => "ai_insights",
        }
    }

    pub fn limit(&self, limits: &RateLimits) -> RateLimitConfig {
        match self {
            Self::Summary => limits.summary,
            Self::Categorize | Self::Parse | Self::Insights => limits.ai,
        }
    }
}

/// Identity header, else the request's owner id, else anonymous
pub fn caller_identity(headers: &HeaderMap, owner_id: Option<&str>) -> String {
    headers
        .get(IDENTITY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| owner_id.map(str::trim).filter(|s| !s.is_empty()))
        .unwrap_or(ANONYMOUS_IDENTITY)
        .to_string()
}

/// Create the application router
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let state = Arc::new(state);

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/summary", get(handlers::get_summary))
        .route("/ai/categorize", post(handlers::categorize))
        .route("/ai/parse", post(handlers::parse_expense))
        .route("/ai/insights", post(handlers::generate_insights));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(IDENTITY_HEADER)])
        .expose_headers([RATE_LIMIT_HEADER, RATE_REMAINING_HEADER, RATE_RESET_HEADER]);
    let cors = if config.allowed_origins.is_empty() {
        cors
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

pub async fn serve(
    state: AppState,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    check_provider_connection(&state.assistant).await;

    let app = create_router(state, &config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn check_provider_connection(assistant: &ExpenseAssistant) {
    // An unconfigured provider was already reported when the assistant was built.
    let Some(provider) = assistant.provider() else {
        return;
    };

    if provider.health_check().await {
        info!(
            backend = provider.backend_name(),
            model = provider.model(),
            "AI provider connected: {}",
            provider.host()
        );
    } else {
        warn!(
            backend = provider.backend_name(),
            "AI provider configured but not responding: {} (fallbacks will be used)",
            provider.host()
        );
    }
}

// ============================================================================
// Rate-limited responses
// ============================================================================

/// A handler result plus the rate decision that admitted (or refused) it.
///
/// Carries the `x-ratelimit-*` headers on success, on errors, and on denial.
pub struct Governed<T> {
    decision: RateDecision,
    result: Result<T, AppError>,
}

impl<T> Governed<T> {
    pub fn new(decision: RateDecision, result: Result<T, AppError>) -> Self {
        Self { decision, result }
    }

    pub fn denied(decision: RateDecision) -> Self {
        let error = AppError::too_many_requests(&decision);
        Self::new(decision, Err(error))
    }
}

impl<T: IntoResponse> IntoResponse for Governed<T> {
    fn into_response(self) -> Response {
        let mut response = match self.result {
            Ok(body) => body.into_response(),
            Err(err) => err.into_response(),
        };

        let headers = response.headers_mut();
        headers.insert(RATE_LIMIT_HEADER, HeaderValue::from(self.decision.limit));
        headers.insert(
            RATE_REMAINING_HEADER,
            HeaderValue::from(self.decision.remaining),
        );
        headers.insert(
            RATE_RESET_HEADER,
            HeaderValue::from(self.decision.reset_in_seconds),
        );
        if !self.decision.allowed {
            headers.insert(
                header::RETRY_AFTER,
                HeaderValue::from(self.decision.reset_in_seconds),
            );
        }

        response
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    /// Denial details for 429 responses
    reset_in_seconds: Option<u64>,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            reset_in_seconds: None,
            internal: None,
        }
    }

    pub fn too_many_requests(decision: &RateDecision) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: "Rate limit exceeded".to_string(),
            reset_in_seconds: Some(decision.reset_in_seconds),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = match self.reset_in_seconds {
            Some(reset) => Json(serde_json::json!({
                "allowed": false,
                "reset_in_seconds": reset,
                "error": self.message,
            })),
            None => Json(serde_json::json!({
                "error": self.message
            })),
        };

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            reset_in_seconds: None,
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
