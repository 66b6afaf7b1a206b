//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use tally_core::models::{EntryKind, NewLedgerEntry};
use tally_core::test_utils::MockProviderServer;
use tally_core::{
    AssistantSettings, MockProvider, OpenAICompatibleBackend, PromptLibrary, ProviderClient,
    ProviderError,
};
use tower::ServiceExt;

fn test_config() -> TallyConfig {
    let mut config = TallyConfig::default();
    config.rate_limits.summary = RateLimitConfig::new(3, 60);
    config.rate_limits.ai = RateLimitConfig::new(2, 60);
    config
}

fn seeded_db() -> Database {
    let db = Database::in_memory().unwrap();
    let on = |d| NaiveDate::from_ymd_opt(2025, 11, d).unwrap();
    for (kind, amount, category, day) in [
        (EntryKind::Expense, 50, "foodDining", 1),
        (EntryKind::Expense, 30, "transportation", 5),
        (EntryKind::Income, 1000, "salary", 1),
    ] {
        db.insert_entry(&NewLedgerEntry {
            owner_id: "u1".into(),
            kind,
            amount: Decimal::from(amount),
            category: Some(category.into()),
            status: None,
            description: None,
            occurred_at: on(day),
        })
        .unwrap();
    }
    db
}

fn app_with_provider(provider: Option<ProviderClient>) -> Router {
    let config = test_config();
    let assistant = ExpenseAssistant::new(
        provider,
        PromptLibrary::embedded_only(),
        AssistantSettings::from(&config),
    );
    create_router(
        AppState::new(seeded_db(), assistant, config),
        &ServerConfig::default(),
    )
}

fn setup_test_app() -> Router {
    app_with_provider(Some(ProviderClient::mock(MockProvider::replying("2"))))
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn header<'a>(response: &'a axum::response::Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

fn summary_request(query: &str, identity: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(format!("/api/summary?{}", query));
    if let Some(identity) = identity {
        builder = builder.header(IDENTITY_HEADER, identity);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

// ========== Health ==========

#[tokio::test]
async fn test_health_reports_provider_and_is_not_governed() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(header(&response, "x-ratelimit-limit").is_none());

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["provider"]["configured"], true);
    assert_eq!(json["provider"]["backend"], "mock");
    assert_eq!(json["provider"]["healthy"], true);
}

#[tokio::test]
async fn test_health_without_provider() {
    let app = app_with_provider(None);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["provider"]["configured"], false);
    assert!(json["provider"]["backend"].is_null());
}

// ========== Summary ==========

#[tokio::test]
async fn test_month_summary() {
    let app = setup_test_app();

    let response = app
        .oneshot(summary_request(
            "owner_id=u1&period=month&year=2025&month=11",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "x-ratelimit-limit"), Some("3"));
    assert_eq!(header(&response, "x-ratelimit-remaining"), Some("2"));
    assert_eq!(header(&response, "x-ratelimit-reset"), Some("60"));

    let json = get_body_json(response).await;
    assert_eq!(json["period"]["kind"], "month");
    assert_eq!(json["period"]["start"], "2025-11-01T00:00:00");
    assert_eq!(json["period"]["end"], "2025-11-30T23:59:59");
    assert_eq!(json["totals"]["by_kind"]["expense"]["amount"], 80.0);
    assert_eq!(json["totals"]["by_kind"]["expense"]["count"], 2);
    assert_eq!(json["totals"]["by_kind"]["income"]["amount"], 1000.0);
    assert_eq!(json["net_income"], 920.0);

    let breakdown = json["category_breakdown"]["expense"].as_array().unwrap();
    assert_eq!(breakdown[0]["category"], "foodDining");
    assert_eq!(breakdown[0]["amount"], 50.0);
    assert_eq!(breakdown[1]["category"], "transportation");
}

#[tokio::test]
async fn test_summary_bad_period_input_is_defaulted() {
    let app = setup_test_app();

    let response = app
        .oneshot(summary_request(
            "owner_id=u1&period=fortnight&year=abc&month=13",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["period"]["kind"], "all");
    assert_eq!(json["totals"]["by_kind"]["expense"]["count"], 2);
}

#[tokio::test]
async fn test_summary_requires_owner_and_still_reports_rate() {
    let app = setup_test_app();

    let response = app.oneshot(summary_request("period=all", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(header(&response, "x-ratelimit-remaining"), Some("2"));
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "owner_id is required");
}

#[tokio::test]
async fn test_summary_rate_limit_denies_fourth_call() {
    let app = setup_test_app();

    for expected_remaining in ["2", "1", "0"] {
        let response = app
            .clone()
            .oneshot(summary_request("owner_id=u1", Some("alice")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            header(&response, "x-ratelimit-remaining"),
            Some(expected_remaining)
        );
    }

    let response = app
        .clone()
        .oneshot(summary_request("owner_id=u1", Some("alice")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(header(&response, "x-ratelimit-limit"), Some("3"));
    assert_eq!(header(&response, "x-ratelimit-remaining"), Some("0"));
    assert!(header(&response, "retry-after").is_some());

    let json = get_body_json(response).await;
    assert_eq!(json["allowed"], false);
    assert!(json["reset_in_seconds"].as_u64().unwrap() <= 60);

    // Another identity has its own window
    let response = app
        .oneshot(summary_request("owner_id=u1", Some("bob")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_owner_id_is_identity_without_header() {
    let app = setup_test_app();

    for _ in 0..3 {
        app.clone()
            .oneshot(summary_request("owner_id=u1", None))
            .await
            .unwrap();
    }
    let denied = app
        .clone()
        .oneshot(summary_request("owner_id=u1", None))
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::TOO_MANY_REQUESTS);

    let other = app
        .oneshot(summary_request("owner_id=u2", None))
        .await
        .unwrap();
    assert_eq!(other.status(), StatusCode::OK);
}

// ========== AI ==========

#[tokio::test]
async fn test_categorize() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/ai/categorize",
            serde_json::json!({ "description": "Uber to airport", "locale": "en" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "x-ratelimit-limit"), Some("2"));
    let json = get_body_json(response).await;
    assert_eq!(json["category"], "transportation");
}

#[tokio::test]
async fn test_categorize_provider_failure_still_answers() {
    let app = app_with_provider(Some(ProviderClient::mock(MockProvider::failing(
        ProviderError::Timeout,
    ))));

    let response = app
        .oneshot(post_json(
            "/api/ai/categorize",
            serde_json::json!({ "description": "mystery" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["category"], "other");
}

#[tokio::test]
async fn test_categorize_empty_description() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/ai/categorize",
            serde_json::json!({ "description": "   " }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

fn raw_post(uri: &str, body: &'static str, identity: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header(IDENTITY_HEADER, identity)
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_malformed_body_is_governed() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(raw_post("/api/ai/categorize", r#"{"locale":"en"}"#, "dave"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(header(&response, "x-ratelimit-limit"), Some("2"));
    assert_eq!(header(&response, "x-ratelimit-remaining"), Some("1"));
    let json = get_body_json(response).await;
    assert!(json["error"].is_string());

    let response = app
        .clone()
        .oneshot(raw_post("/api/ai/categorize", "not json", "dave"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(header(&response, "x-ratelimit-remaining"), Some("0"));

    let response = app
        .oneshot(raw_post("/api/ai/categorize", "not json", "dave"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(header(&response, "retry-after").is_some());
}

#[tokio::test]
async fn test_malformed_parse_and_insights_bodies() {
    let app = setup_test_app();

    for uri in ["/api/ai/parse", "/api/ai/insights"] {
        let response = app
            .clone()
            .oneshot(raw_post(uri, "{}", "erin"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(header(&response, "x-ratelimit-remaining"), Some("1"), "{}", uri);
    }
}

#[tokio::test]
async fn test_ai_routes_have_separate_windows() {
    let app = setup_test_app();
    let categorize = || {
        let mut request = post_json(
            "/api/ai/categorize",
            serde_json::json!({ "description": "taxi" }),
        );
        request
            .headers_mut()
            .insert(IDENTITY_HEADER, HeaderValue::from_static("carol"));
        request
    };

    for _ in 0..2 {
        let response = app.clone().oneshot(categorize()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = app.clone().oneshot(categorize()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let mut parse = post_json("/api/ai/parse", serde_json::json!({ "text": "$5 coffee" }));
    parse
        .headers_mut()
        .insert(IDENTITY_HEADER, HeaderValue::from_static("carol"));
    let response = app.oneshot(parse).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_parse_structured_reply() {
    let app = app_with_provider(Some(ProviderClient::mock(MockProvider::replying(
        r#"{"amount": 12.5, "description": "Lunch", "categoryNumber": 1, "date": "2025-11-03"}"#,
    ))));

    let response = app
        .oneshot(post_json(
            "/api/ai/parse",
            serde_json::json!({ "text": "12.50 lunch on the 3rd", "locale": "es" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["amount"], 12.5);
    assert_eq!(json["description"], "Lunch");
    assert_eq!(json["category"], "foodDining");
    assert_eq!(json["date"], "2025-11-03");
}

#[tokio::test]
async fn test_parse_fallback() {
    let app = app_with_provider(None);

    let response = app
        .oneshot(post_json(
            "/api/ai/parse",
            serde_json::json!({ "text": "$25 coffee" }),
        ))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["amount"], 25.0);
    assert_eq!(json["description"], "$25 coffee");
    assert!(json["category"].is_null());
    assert_eq!(json["date"].as_str().unwrap().len(), 10);
}

#[tokio::test]
async fn test_insights_fallback_uses_ledger_totals() {
    let app = app_with_provider(Some(ProviderClient::mock(MockProvider::failing(
        ProviderError::RateLimited,
    ))));

    let response = app
        .oneshot(post_json(
            "/api/ai/insights",
            serde_json::json!({ "owner_id": "u1", "locale": "en" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert!(json["summary"].as_str().unwrap().contains("80.00"));
    assert!(!json["trends"].as_array().unwrap().is_empty());
    assert!(!json["recommendations"].as_array().unwrap().is_empty());
    assert!(json["alerts"].is_array());
}

#[tokio::test]
async fn test_categorize_against_http_provider() {
    let server = MockProviderServer::start_with_reply("8").await;
    let backend = OpenAICompatibleBackend::new(&server.url(), "test-model");
    let app = app_with_provider(Some(ProviderClient::OpenAICompatible(backend)));

    let response = app
        .oneshot(post_json(
            "/api/ai/categorize",
            serde_json::json!({ "description": "Flight to Lisbon" }),
        ))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["category"], "travel");

    let prompts = server.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Flight to Lisbon"));
}
