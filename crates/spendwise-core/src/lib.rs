//! Spendwise Core Library
//!
//! AI-assisted expense insights with multi-provider fallback:
//! - Hosted providers (Groq, Gemini) behind one `Provider` trait
//! - Fallback orchestrator with per-attempt timeouts
//! - Prompt rendering and response normalization
//! - Deterministic rule-based insights when every provider fails
//! - Keyword category classifier for offline suggestions
//! - Layered provider configuration (embedded defaults, file, environment)

pub mod ai;
pub mod categorize;
pub mod config;
pub mod error;
pub mod models;
pub mod prompts;
pub mod rules;
pub mod stats;

/// Test utilities including mock Groq/Gemini server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    AiOrchestrator, CompletionRequest, HealthStatus, MockProvider, MockReply, Provider,
    ProviderClient, ProviderHealth, ProviderId, ProviderInfo,
};
pub use config::{default_config_path, AiConfig, Operation, OperationConfig, ProviderConfig};
pub use error::{
    AggregateError, Error, FailureNotice, ProviderError, ProviderErrorKind, Result,
};
pub use models::{
    Answer, BudgetContext, BudgetStatus, Category, CategorySuggestion, ExpenseRecord, Insight,
    InsightReport, InsightSource, InsightType, SuggestionSource,
};
