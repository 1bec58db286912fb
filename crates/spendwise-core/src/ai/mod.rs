//! Hosted text-generation providers
//!
//! This module provides a provider-agnostic interface for one prompt/response
//! cycle. Fallback across providers lives in the orchestrator; each provider
//! only negotiates its own model identifiers and API versions.
//!
//! # Architecture
//!
//! - `Provider` trait: one completion against one provider
//! - `ProviderClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Implementations: `GroqProvider`, `GeminiProvider`, `MockProvider`
//! - `AiOrchestrator`: ordered fallback across providers
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = AiConfig::from_env();
//! let groq = ProviderClient::from_config(config.provider(ProviderId::Groq).unwrap(), http);
//!
//! let request = CompletionRequest::new("You are a classifier.", "coffee at starbucks", 50, 0.3);
//! let text = groq.complete(&request).await?;
//! ```

mod gemini;
mod groq;
mod mock;
pub mod orchestrator;
pub mod parsing;

pub use gemini::GeminiProvider;
pub use groq::GroqProvider;
pub use mock::{MockProvider, MockReply};
pub use orchestrator::{AiOrchestrator, HealthStatus, ProviderHealth, ProviderInfo};

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderErrorKind};

/// Identity of a hosted provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Groq,
    Gemini,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Groq => "groq",
            ProviderId::Gemini => "gemini",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::Groq => "Groq",
            ProviderId::Gemini => "Gemini",
        }
    }

    /// Environment variable holding the credential
    pub fn credential_env(&self) -> &'static str {
        match self {
            ProviderId::Groq => "GROQ_API_KEY",
            ProviderId::Gemini => "GEMINI_API_KEY",
        }
    }

    /// Environment variable overriding the base URL
    pub fn base_url_env(&self) -> &'static str {
        match self {
            ProviderId::Groq => "GROQ_BASE_URL",
            ProviderId::Gemini => "GEMINI_BASE_URL",
        }
    }

    /// Confidence assigned to insights that omit one
    pub fn default_confidence(&self) -> f64 {
        match self {
            ProviderId::Groq => 0.9,
            ProviderId::Gemini => 0.85,
        }
    }

    pub fn all() -> &'static [ProviderId] {
        &[ProviderId::Groq, ProviderId::Gemini]
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "groq" => Ok(ProviderId::Groq),
            "gemini" => Ok(ProviderId::Gemini),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// One prompt plus its shaping parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(
        system: impl Into<String>,
        prompt: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            max_tokens,
            temperature,
        }
    }
}

/// Trait implemented by every text-generation provider
///
/// Implementations must not retry across providers and must not mutate
/// shared state. Not-found/bad-request answers advance to the next model
/// identifier inside `complete`; any other failure returns immediately.
#[async_trait]
pub trait Provider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Whether a credential is available (no network I/O)
    fn is_configured(&self) -> bool;

    /// Model identifiers in preference order
    fn models(&self) -> &[String];

    /// Run one completion and return the raw text from the response envelope
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}

/// Concrete provider enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum ProviderClient {
    Groq(GroqProvider),
    Gemini(GeminiProvider),
    /// Scripted provider for tests
    Mock(MockProvider),
}

impl ProviderClient {
    /// Build the live client for one configured provider
    pub fn from_config(config: &ProviderConfig, http: reqwest::Client) -> Self {
        match config.id {
            ProviderId::Groq => ProviderClient::Groq(GroqProvider::new(config, http)),
            ProviderId::Gemini => ProviderClient::Gemini(GeminiProvider::new(config, http)),
        }
    }

    pub fn mock(mock: MockProvider) -> Self {
        ProviderClient::Mock(mock)
    }
}

#[async_trait]
impl Provider for ProviderClient {
    fn id(&self) -> ProviderId {
        match self {
            ProviderClient::Groq(p) => p.id(),
            ProviderClient::Gemini(p) => p.id(),
            ProviderClient::Mock(p) => p.id(),
        }
    }

    fn is_configured(&self) -> bool {
        match self {
            ProviderClient::Groq(p) => p.is_configured(),
            ProviderClient::Gemini(p) => p.is_configured(),
            ProviderClient::Mock(p) => p.is_configured(),
        }
    }

    fn models(&self) -> &[String] {
        match self {
            ProviderClient::Groq(p) => p.models(),
            ProviderClient::Gemini(p) => p.models(),
            ProviderClient::Mock(p) => p.models(),
        }
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        match self {
            ProviderClient::Groq(p) => p.complete(request).await,
            ProviderClient::Gemini(p) => p.complete(request).await,
            ProviderClient::Mock(p) => p.complete(request).await,
        }
    }
}

/// Shape shared by both providers' error bodies: `{"error": {"message": ...}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// Provider's own error text, falling back to `HTTP <status>`
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error)
        .and_then(|d| d.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

/// Whether a failed status should advance to the next model identifier
pub(crate) fn is_model_miss(status: StatusCode) -> bool {
    matches!(status, StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST)
}

/// Map a non-success status onto the taxonomy
pub(crate) fn classify_status(provider: ProviderId, status: StatusCode, body: &str) -> ProviderError {
    let kind = match status.as_u16() {
        429 => ProviderErrorKind::RateLimited,
        401 | 403 => ProviderErrorKind::Unauthorized,
        500..=599 => ProviderErrorKind::ServiceUnavailable,
        404 | 400 => ProviderErrorKind::ModelNotFound,
        _ => ProviderErrorKind::RequestFailed,
    };
    ProviderError::new(provider, kind, error_message(status, body))
}

/// Error for a provider whose every model identifier was rejected
pub(crate) fn models_exhausted(provider: ProviderId, last_message: Option<String>) -> ProviderError {
    let message = match last_message {
        Some(m) => format!("No available model ({})", m),
        None => "No models configured".to_string(),
    };
    ProviderError::new(provider, ProviderErrorKind::ModelNotFound, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_id_round_trip() {
        for id in ProviderId::all() {
            assert_eq!(id.as_str().parse::<ProviderId>().unwrap(), *id);
        }
        assert_eq!("GEMINI".parse::<ProviderId>().unwrap(), ProviderId::Gemini);
        assert!("openai".parse::<ProviderId>().is_err());
    }

    #[test]
    fn test_default_confidence() {
        assert_eq!(ProviderId::Groq.default_confidence(), 0.9);
        assert_eq!(ProviderId::Gemini.default_confidence(), 0.85);
    }

    #[test]
    fn test_error_message_prefers_body() {
        let body = r#"{"error": {"message": "Rate limit reached for model", "type": "tokens"}}"#;
        assert_eq!(
            error_message(StatusCode::TOO_MANY_REQUESTS, body),
            "Rate limit reached for model"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "<html>"), "HTTP 502");
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, r#"{"error": {}}"#), "HTTP 502");
    }

    #[test]
    fn test_classify_status() {
        let classify = |code: u16| {
            classify_status(ProviderId::Groq, StatusCode::from_u16(code).unwrap(), "").kind
        };
        assert_eq!(classify(429), ProviderErrorKind::RateLimited);
        assert_eq!(classify(401), ProviderErrorKind::Unauthorized);
        assert_eq!(classify(403), ProviderErrorKind::Unauthorized);
        assert_eq!(classify(500), ProviderErrorKind::ServiceUnavailable);
        assert_eq!(classify(503), ProviderErrorKind::ServiceUnavailable);
        assert_eq!(classify(404), ProviderErrorKind::ModelNotFound);
        assert_eq!(classify(418), ProviderErrorKind::RequestFailed);
    }

    #[test]
    fn test_model_miss() {
        assert!(is_model_miss(StatusCode::NOT_FOUND));
        assert!(is_model_miss(StatusCode::BAD_REQUEST));
        assert!(!is_model_miss(StatusCode::TOO_MANY_REQUESTS));
    }
}
