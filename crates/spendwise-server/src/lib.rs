//! Spendwise Web Server
//!
//! Axum-based JSON API over the Spendwise AI orchestrator. The server is
//! stateless: expenses and budget figures arrive in each request body.
//!
//! Security features:
//! - Bearer API-key authentication (secure by default, use --no-auth for local dev)
//! - Restrictive CORS policy
//! - Input validation (description length, empty questions)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use spendwise_core::{AggregateError, AiOrchestrator, FailureNotice, ProviderError};

mod handlers;

/// Authorization header for API key auth
const AUTHORIZATION_HEADER: &str = "authorization";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// Accepted API keys, sent as "Bearer <key>" in the Authorization header
    pub api_keys: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            api_keys: vec![],
        }
    }
}

impl ServerConfig {
    /// Read `SPENDWISE_API_KEYS` and `SPENDWISE_ALLOWED_ORIGINS`
    pub fn from_env(require_auth: bool) -> Self {
        Self {
            require_auth,
            allowed_origins: std::env::var("SPENDWISE_ALLOWED_ORIGINS")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            api_keys: std::env::var("SPENDWISE_API_KEYS")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
        }
    }
}

/// Split a comma-separated setting, dropping blank entries
pub fn parse_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Shared application state
pub struct AppState {
    pub orchestrator: AiOrchestrator,
    pub config: ServerConfig,
}

/// Authentication middleware - validates bearer API keys
///
/// Keys are compared in constant time to prevent timing attacks.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        return next.run(request).await;
    }

    let api_key_valid = request
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|key| validate_api_key(key, &state.config.api_keys))
        .unwrap_or(false);

    if api_key_valid {
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Unauthorized request - no valid API key");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// Validate an API key against the configured keys using constant-time comparison
fn validate_api_key(provided: &str, valid_keys: &[String]) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();
    valid_keys.iter().any(|key| {
        let key_bytes = key.as_bytes();
        // Only compare if lengths match (constant-time for same-length keys)
        provided_bytes.len() == key_bytes.len() && bool::from(provided_bytes.ct_eq(key_bytes))
    })
}

/// Create the application router
pub fn create_router(orchestrator: AiOrchestrator, config: ServerConfig) -> Router {
    for provider in orchestrator.provider_info() {
        if provider.configured {
            info!(
                "AI provider configured: {} (models: {})",
                provider.name,
                provider.models.join(", ")
            );
        } else {
            info!(
                "ℹ️  AI provider {} not configured (set {})",
                provider.name,
                provider.id.credential_env()
            );
        }
    }

    let state = Arc::new(AppState {
        orchestrator,
        config: config.clone(),
    });

    let api_routes = Router::new()
        // Providers
        .route("/ai/status", get(handlers::ai_status))
        .route("/ai/health", get(handlers::ai_health))
        // Insights
        .route("/insights", post(handlers::generate_insights))
        .route("/insights/answer", post(handlers::answer_question))
        // Categories
        .route("/categories/suggest", post(handlers::suggest_category))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        // Liveness check stays outside auth
        .route("/health", get(handlers::health));

    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        ))
}

/// Start the server
pub async fn serve(
    orchestrator: AiOrchestrator,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("⚠️  Authentication disabled - do not expose to network!");
    } else if config.api_keys.is_empty() {
        warn!("⚠️  No API keys configured (set SPENDWISE_API_KEYS); every request will be rejected");
    }

    if !orchestrator.has_credentials() {
        warn!("⚠️  No AI provider credentials; insights will report the configuration notice");
    }

    let app = create_router(orchestrator, config);

    let addr = format!("{}:{}", host, port);
    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    /// Set when every AI provider failed
    failure: Option<(FailureNotice, Vec<ProviderError>)>,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            failure: None,
            internal: None,
        }
    }

    /// 429 when every called provider throttled us, 503 otherwise
    pub fn providers_failed(err: AggregateError) -> Self {
        let notice = FailureNotice::from_aggregate(&err);
        let status = match notice {
            FailureNotice::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self {
            status,
            message: notice.message().to_string(),
            failure: Some((notice, err.attempts)),
            internal: None,
        }
    }
}

impl From<spendwise_core::Error> for AppError {
    fn from(err: spendwise_core::Error) -> Self {
        match err {
            spendwise_core::Error::InvalidInput(msg) => Self::bad_request(&msg),
            spendwise_core::Error::AllProvidersFailed(aggregate) => {
                Self::providers_failed(aggregate)
            }
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                // Return generic message to client
                message: "An internal error occurred".to_string(),
                failure: None,
                // Keep full error for logging
                internal: Some(other.into()),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = match self.failure {
            Some((notice, details)) => {
                warn!(notice = %notice, attempts = details.len(), "AI request failed on every provider");
                serde_json::json!({
                    "error": self.message,
                    "notice": notice,
                    "details": details,
                })
            }
            None => serde_json::json!({ "error": self.message }),
        };

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests;
