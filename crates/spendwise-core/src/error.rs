//! Error types for Spendwise
//!
//! `Error` is the library-wide error. Provider failures are modelled separately
//! as `ProviderError` (one attempt against one provider) and `AggregateError`
//! (every provider in a fallback sequence failed), so callers can switch on a
//! closed `ProviderErrorKind` instead of inspecting messages.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::ai::ProviderId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    AllProvidersFailed(#[from] AggregateError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Classification of a single provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// No credential available for the provider
    Unconfigured,
    /// Provider rejected the request rate (HTTP 429)
    RateLimited,
    /// Credential rejected (HTTP 401/403)
    Unauthorized,
    /// Provider-side fault (HTTP 5xx) or connection failure
    ServiceUnavailable,
    /// Every configured model identifier answered not-found/bad-request
    ModelNotFound,
    /// Successful response with no extractable text
    MalformedResponse,
    /// Attempt exceeded its allotted duration
    Timeout,
    /// Provider text could not be turned into usable output
    NormalizationFailure,
    /// Any other non-success response
    RequestFailed,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::RateLimited => "rate_limited",
            Self::Unauthorized => "unauthorized",
            Self::ServiceUnavailable => "service_unavailable",
            Self::ModelNotFound => "model_not_found",
            Self::MalformedResponse => "malformed_response",
            Self::Timeout => "timeout",
            Self::NormalizationFailure => "normalization_failure",
            Self::RequestFailed => "request_failed",
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One failed attempt against one provider
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{message}")]
pub struct ProviderError {
    pub provider: ProviderId,
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(provider: ProviderId, kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            provider,
            kind,
            message: message.into(),
        }
    }

    pub fn unconfigured(provider: ProviderId) -> Self {
        Self::new(
            provider,
            ProviderErrorKind::Unconfigured,
            format!("{} not configured", provider.credential_env()),
        )
    }

    pub fn timeout(provider: ProviderId, after: std::time::Duration) -> Self {
        Self::new(
            provider,
            ProviderErrorKind::Timeout,
            format!("request timed out after {}s", after.as_secs_f32()),
        )
    }

    pub fn normalization(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::NormalizationFailure, message)
    }

    /// Map a transport-level reqwest failure onto the taxonomy
    ///
    /// The URL is stripped from the message so request details never reach
    /// logs or API bodies.
    pub fn from_transport(provider: ProviderId, err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ProviderErrorKind::Timeout
        } else if err.is_connect() || err.is_request() {
            ProviderErrorKind::ServiceUnavailable
        } else if err.is_decode() {
            ProviderErrorKind::MalformedResponse
        } else {
            ProviderErrorKind::RequestFailed
        };
        Self::new(provider, kind, err.without_url().to_string())
    }
}

/// Every provider in a fallback sequence failed
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("All AI providers failed: {}", summarize(.attempts))]
pub struct AggregateError {
    pub attempts: Vec<ProviderError>,
}

fn summarize(attempts: &[ProviderError]) -> String {
    if attempts.is_empty() {
        return "no providers available".to_string();
    }
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.provider.display_name(), a.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl AggregateError {
    pub fn new(attempts: Vec<ProviderError>) -> Self {
        Self { attempts }
    }

    /// Kinds of every failed attempt, in attempt order
    pub fn kinds(&self) -> Vec<ProviderErrorKind> {
        self.attempts.iter().map(|a| a.kind).collect()
    }

    /// True when no provider had a credential
    pub fn all_unconfigured(&self) -> bool {
        self.attempts
            .iter()
            .all(|a| a.kind == ProviderErrorKind::Unconfigured)
    }

    /// True when every provider that was actually called rate-limited us
    pub fn all_rate_limited(&self) -> bool {
        let called: Vec<_> = self
            .attempts
            .iter()
            .filter(|a| a.kind != ProviderErrorKind::Unconfigured)
            .collect();
        !called.is_empty()
            && called
                .iter()
                .all(|a| a.kind == ProviderErrorKind::RateLimited)
    }
}

/// User-facing classification of an aggregate failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureNotice {
    /// No provider credentials (or all rejected)
    ConfigurationMissing,
    /// Providers are throttling requests
    RateLimited,
    /// Anything else: outages, timeouts, unusable responses
    TemporarilyUnavailable,
}

impl FailureNotice {
    pub fn from_aggregate(err: &AggregateError) -> Self {
        if err.all_unconfigured()
            || err.attempts.iter().all(|a| {
                matches!(
                    a.kind,
                    ProviderErrorKind::Unconfigured | ProviderErrorKind::Unauthorized
                )
            })
        {
            Self::ConfigurationMissing
        } else if err.all_rate_limited() {
            Self::RateLimited
        } else {
            Self::TemporarilyUnavailable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing => "configuration_missing",
            Self::RateLimited => "rate_limited",
            Self::TemporarilyUnavailable => "temporarily_unavailable",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing => "API Configuration Required",
            Self::RateLimited => "AI Providers Are Busy",
            Self::TemporarilyUnavailable => "AI Temporarily Unavailable",
        }
    }

    /// Human-readable message for surfaces to display
    pub fn message(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing => {
                "AI features need an API key. Set GROQ_API_KEY or GEMINI_API_KEY and restart."
            }
            Self::RateLimited => {
                "The AI providers are receiving too many requests right now. Please wait a minute and try again."
            }
            Self::TemporarilyUnavailable => {
                "We couldn't reach the AI providers right now. Please try again in a few minutes."
            }
        }
    }
}

impl fmt::Display for FailureNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
