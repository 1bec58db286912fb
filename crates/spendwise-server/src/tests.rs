//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use spendwise_core::{
    AiConfig, MockProvider, MockReply, ProviderClient, ProviderErrorKind, ProviderId,
};
use tower::ServiceExt;

const INSIGHTS: &str = r#"```json
[{"type": "tip", "title": "Cook at home", "message": "Food is your largest category", "category": "Food"}]
```"#;

fn app_with(groq: MockProvider, gemini: MockProvider) -> Router {
    let orchestrator = AiOrchestrator::with_providers(
        AiConfig::default(),
        vec![ProviderClient::mock(groq), ProviderClient::mock(gemini)],
    );
    let config = ServerConfig {
        require_auth: false,
        ..Default::default()
    };
    create_router(orchestrator, config)
}

fn setup_test_app() -> Router {
    app_with(
        MockProvider::replying(ProviderId::Groq, INSIGHTS),
        MockProvider::new(ProviderId::Gemini),
    )
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn expenses_body() -> serde_json::Value {
    serde_json::json!([
        {"id": "1", "amount": 450.0, "category": "Food", "description": "lunch", "date": "2024-06-03T09:00:00Z"},
        {"id": "2", "amount": 1200.0, "category": "Bills", "description": "electricity", "date": "2024-06-05T09:00:00Z"}
    ])
}

// ========== Health & Status ==========

#[tokio::test]
async fn test_health() {
    let app = setup_test_app();

    let response = app.oneshot(get("/api/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_ai_status() {
    let app = app_with(
        MockProvider::new(ProviderId::Groq),
        MockProvider::unconfigured(ProviderId::Gemini),
    );

    let response = app.oneshot(get("/api/ai/status")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["configured"], true);
    let providers = json["providers"].as_array().unwrap();
    assert_eq!(providers.len(), 2);
    assert_eq!(providers[0]["id"], "groq");
    assert_eq!(providers[0]["configured"], true);
    assert_eq!(providers[1]["id"], "gemini");
    assert_eq!(providers[1]["configured"], false);
}

#[tokio::test]
async fn test_ai_health() {
    let app = app_with(
        MockProvider::new(ProviderId::Groq),
        MockProvider::unconfigured(ProviderId::Gemini),
    );

    let response = app.oneshot(get("/api/ai/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let results = json.as_array().unwrap();
    assert_eq!(results[0]["provider"], "groq");
    assert_eq!(results[0]["status"], "healthy");
    assert_eq!(results[1]["provider"], "gemini");
    assert_eq!(results[1]["status"], "unconfigured");
}

// ========== Insights ==========

#[tokio::test]
async fn test_insights_from_provider() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/insights",
            serde_json::json!({ "expenses": expenses_body() }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let insights = json["insights"].as_array().unwrap();
    assert_eq!(insights.len(), 1);
    assert_eq!(insights[0]["title"], "Cook at home");
    assert_eq!(insights[0]["type"], "tip");
    assert_eq!(json["source"]["kind"], "provider");
    assert_eq!(json["source"]["provider"], "groq");
    assert!(json.get("notice").is_none());
    assert!(json.get("budget").is_none());
}

#[tokio::test]
async fn test_insights_preferred_provider() {
    let gemini = MockProvider::replying(ProviderId::Gemini, INSIGHTS);
    let app = app_with(MockProvider::replying(ProviderId::Groq, INSIGHTS), gemini.clone());

    let response = app
        .oneshot(post_json(
            "/api/insights",
            serde_json::json!({ "expenses": expenses_body(), "preferred_provider": "gemini" }),
        ))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["source"]["provider"], "gemini");
    assert_eq!(gemini.calls(), 1);
}

#[tokio::test]
async fn test_insights_with_budget() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/insights",
            serde_json::json!({
                "expenses": expenses_body(),
                "budget": {"monthly_budget": 2000.0, "current_spending": 1650.0}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["budget"]["status"], "nearing_limit");
    assert_eq!(json["budget"]["remaining"], 350.0);
    let insights = json["insights"].as_array().unwrap();
    assert!(insights.iter().any(|i| i["id"] == "budget-analysis"));
}

#[tokio::test]
async fn test_insights_degrade_to_rules() {
    let app = app_with(
        MockProvider::failing(ProviderId::Groq, ProviderErrorKind::ServiceUnavailable, "HTTP 503"),
        MockProvider::failing(ProviderId::Gemini, ProviderErrorKind::Timeout, "timed out"),
    );

    let response = app
        .oneshot(post_json(
            "/api/insights",
            serde_json::json!({ "expenses": expenses_body() }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["source"]["kind"], "rule_based");
    assert_eq!(json["notice"], "temporarily_unavailable");
    assert!(!json["insights"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_insights_without_credentials() {
    let groq = MockProvider::unconfigured(ProviderId::Groq);
    let gemini = MockProvider::unconfigured(ProviderId::Gemini);
    let app = app_with(groq.clone(), gemini.clone());

    let response = app
        .oneshot(post_json(
            "/api/insights",
            serde_json::json!({ "expenses": expenses_body() }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let insights = json["insights"].as_array().unwrap();
    assert_eq!(insights.len(), 1);
    assert_eq!(insights[0]["id"], "api-key-missing");
    assert_eq!(insights[0]["title"], "API Configuration Required");
    assert_eq!(json["notice"], "configuration_missing");
    assert_eq!(json["source"]["kind"], "unconfigured");
    assert_eq!(groq.calls(), 0);
    assert_eq!(gemini.calls(), 0);
}

#[tokio::test]
async fn test_insights_empty_expenses_without_credentials() {
    let app = app_with(
        MockProvider::unconfigured(ProviderId::Groq),
        MockProvider::unconfigured(ProviderId::Gemini),
    );

    let response = app
        .oneshot(post_json("/api/insights", serde_json::json!({ "expenses": [] })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["source"]["kind"], "welcome");
    assert_eq!(json["insights"].as_array().unwrap().len(), 2);
    assert!(json.get("notice").is_none());
}

#[tokio::test]
async fn test_insights_empty_expenses_welcome() {
    let groq = MockProvider::replying(ProviderId::Groq, INSIGHTS);
    let app = app_with(groq.clone(), MockProvider::new(ProviderId::Gemini));

    let response = app
        .oneshot(post_json("/api/insights", serde_json::json!({ "expenses": [] })))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["source"]["kind"], "welcome");
    assert_eq!(json["insights"].as_array().unwrap().len(), 2);
    assert_eq!(groq.calls(), 0);
}

// ========== Answers ==========

#[tokio::test]
async fn test_answer_question() {
    let app = app_with(
        MockProvider::replying(ProviderId::Groq, "Answer: Spend less on takeout.\n\n\n\nCook twice a week."),
        MockProvider::new(ProviderId::Gemini),
    );

    let response = app
        .oneshot(post_json(
            "/api/insights/answer",
            serde_json::json!({ "question": "How can I save on food?" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["provider"], "groq");
    let answer = json["answer"].as_str().unwrap();
    assert!(answer.starts_with("Spend less on takeout."));
    assert!(!answer.contains("\n\n\n"));
}

#[tokio::test]
async fn test_answer_empty_question() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/insights/answer",
            serde_json::json!({ "question": "   " }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_answer_all_rate_limited() {
    let app = app_with(
        MockProvider::failing(ProviderId::Groq, ProviderErrorKind::RateLimited, "Rate limit reached"),
        MockProvider::failing(ProviderId::Gemini, ProviderErrorKind::RateLimited, "Quota exceeded"),
    );

    let response = app
        .oneshot(post_json(
            "/api/insights/answer",
            serde_json::json!({ "question": "Am I overspending?" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = get_body_json(response).await;
    assert_eq!(json["notice"], "rate_limited");
    let details = json["details"].as_array().unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(details[0]["provider"], "groq");
    assert_eq!(details[0]["kind"], "rate_limited");
    assert_eq!(details[1]["message"], "Quota exceeded");
}

#[tokio::test]
async fn test_answer_providers_unavailable() {
    let app = app_with(
        MockProvider::unconfigured(ProviderId::Groq),
        MockProvider::new(ProviderId::Gemini).with_script([MockReply::error(
            ProviderErrorKind::ServiceUnavailable,
            "HTTP 503",
        )]),
    );

    let response = app
        .oneshot(post_json(
            "/api/insights/answer",
            serde_json::json!({ "question": "Am I overspending?" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = get_body_json(response).await;
    assert_eq!(json["notice"], "temporarily_unavailable");
    assert!(json["error"].is_string());
}

// ========== Categories ==========

#[tokio::test]
async fn test_suggest_category_from_provider() {
    let app = app_with(
        MockProvider::replying(ProviderId::Groq, "Category: Entertainment"),
        MockProvider::new(ProviderId::Gemini),
    );

    let response = app
        .oneshot(post_json(
            "/api/categories/suggest",
            serde_json::json!({ "description": "movie tickets" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["category"], "Entertainment");
    assert_eq!(json["source"]["kind"], "provider");
}

#[tokio::test]
async fn test_suggest_category_keyword_fallback() {
    let app = app_with(
        MockProvider::failing(ProviderId::Groq, ProviderErrorKind::ServiceUnavailable, "down"),
        MockProvider::failing(ProviderId::Gemini, ProviderErrorKind::ServiceUnavailable, "down"),
    );

    let response = app
        .oneshot(post_json(
            "/api/categories/suggest",
            serde_json::json!({ "description": "uber ride to airport" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["category"], "Transportation");
    assert_eq!(json["source"]["kind"], "keywords");
}

#[tokio::test]
async fn test_suggest_category_validation() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/categories/suggest",
            serde_json::json!({ "description": "" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(post_json(
            "/api/categories/suggest",
            serde_json::json!({ "description": "x".repeat(201) }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Auth ==========

fn authed_app() -> Router {
    let orchestrator = AiOrchestrator::with_providers(
        AiConfig::default(),
        vec![
            ProviderClient::mock(MockProvider::new(ProviderId::Groq)),
            ProviderClient::mock(MockProvider::new(ProviderId::Gemini)),
        ],
    );
    let config = ServerConfig {
        require_auth: true,
        api_keys: vec!["test-key-123".to_string()],
        ..Default::default()
    };
    create_router(orchestrator, config)
}

#[tokio::test]
async fn test_auth_rejects_missing_key() {
    let response = authed_app().oneshot(get("/api/ai/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_rejects_wrong_key() {
    let response = authed_app()
        .oneshot(
            Request::builder()
                .uri("/api/ai/status")
                .header("authorization", "Bearer test-key-124")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_accepts_valid_key() {
    let response = authed_app()
        .oneshot(
            Request::builder()
                .uri("/api/ai/status")
                .header("authorization", "Bearer test-key-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_skips_auth() {
    let response = authed_app().oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_security_headers() {
    let response = setup_test_app().oneshot(get("/api/health")).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
}

#[test]
fn test_validate_api_key() {
    let keys = vec!["alpha".to_string(), "beta-key".to_string()];
    assert!(validate_api_key("alpha", &keys));
    assert!(validate_api_key("beta-key", &keys));
    assert!(!validate_api_key("alph", &keys));
    assert!(!validate_api_key("", &keys));
    assert!(!validate_api_key("alpha", &[]));
}

#[test]
fn test_parse_list() {
    assert_eq!(parse_list("a, b,,c "), vec!["a", "b", "c"]);
    assert!(parse_list("  ").is_empty());
}
