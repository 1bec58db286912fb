//! Provider fallback orchestration
//!
//! Runs one operation against the configured providers in order until one
//! produces usable output.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Fallback Sequence                             │
//! │                                                                  │
//! │   1. Order providers (caller preference moves one to the front)  │
//! │   2. For each provider:                                          │
//! │      a. No credential → record Unconfigured, no request          │
//! │      b. complete() under the operation timeout                   │
//! │      c. Normalize the text; empty output counts as a failure     │
//! │      d. Success → stop; failure → record and continue            │
//! │   3. All failed:                                                 │
//! │      insights → rule-based, answers → AggregateError,            │
//! │      category → keyword classifier                               │
//! │                                                                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Attempts are sequential; each provider is tried at most once per call.
//! The orchestrator holds no mutable state and is shared behind an `Arc`.
//!
//! # Example
//!
//! ```rust,ignore
//! let orchestrator = AiOrchestrator::new(AiConfig::load(None)?);
//!
//! let report = orchestrator.generate_expense_insights(&expenses, Some(&budget), None).await;
//! for insight in &report.insights {
//!     println!("{}: {}", insight.title, insight.message);
//! }
//! ```

use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::categorize::{classify_by_keywords, validate_description};
use crate::config::{AiConfig, Operation};
use crate::error::{AggregateError, Error, ProviderError, ProviderErrorKind, Result};
use crate::models::{
    Answer, BudgetContext, CategorySuggestion, ExpenseRecord, Insight, InsightReport,
    InsightSource, SuggestionSource,
};
use crate::prompts::{self, HEALTH_CHECK_PROMPT};
use crate::rules::{rule_based_insights, welcome_insights, with_budget_insight};

use super::parsing::{clean_answer, parse_category, parse_insights};
use super::{CompletionRequest, Provider, ProviderClient, ProviderId};

/// Token budget for health checks
const HEALTH_CHECK_MAX_TOKENS: u32 = 10;

/// Static description of one provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    pub id: ProviderId,
    pub name: &'static str,
    pub models: Vec<String>,
    pub configured: bool,
}

/// Result of probing one provider
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    RateLimited,
    Unconfigured,
    Error(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderHealth {
    pub provider: ProviderId,
    #[serde(flatten)]
    pub status: HealthStatus,
    /// Check duration; absent when no request was made
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Multi-provider orchestrator for the three AI operations
#[derive(Clone)]
pub struct AiOrchestrator {
    config: AiConfig,
    providers: Vec<ProviderClient>,
}

impl AiOrchestrator {
    /// Build live Groq/Gemini clients from config
    pub fn new(config: AiConfig) -> Self {
        let http = reqwest::Client::new();
        let providers = config
            .providers
            .iter()
            .map(|p| ProviderClient::from_config(p, http.clone()))
            .collect();
        Self { config, providers }
    }

    /// Use explicit provider clients (mocks in tests), in attempt order
    pub fn with_providers(config: AiConfig, providers: Vec<ProviderClient>) -> Self {
        Self { config, providers }
    }

    /// Embedded defaults plus environment credentials
    pub fn from_env() -> Self {
        Self::new(AiConfig::from_env())
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// True if any provider has a credential (no network I/O)
    pub fn has_credentials(&self) -> bool {
        self.providers.iter().any(|p| p.is_configured())
    }

    pub fn provider_info(&self) -> Vec<ProviderInfo> {
        self.providers
            .iter()
            .map(|p| ProviderInfo {
                id: p.id(),
                name: p.id().display_name(),
                models: p.models().to_vec(),
                configured: p.is_configured(),
            })
            .collect()
    }

    /// Providers in attempt order; the preferred one (request, then config) goes first
    fn attempt_order(&self, preferred: Option<ProviderId>) -> Vec<&ProviderClient> {
        let mut ordered: Vec<&ProviderClient> = self.providers.iter().collect();
        if let Some(preferred) = preferred.or(self.config.preferred) {
            // Stable: the remaining providers keep their configured order
            ordered.sort_by_key(|p| p.id() != preferred);
        }
        ordered
    }

    /// Run one operation through the fallback sequence
    async fn run<T, F>(
        &self,
        op: Operation,
        request: CompletionRequest,
        preferred: Option<ProviderId>,
        normalize: F,
    ) -> std::result::Result<(T, ProviderId, Vec<ProviderError>), AggregateError>
    where
        F: Fn(&str, ProviderId) -> std::result::Result<T, ProviderError>,
    {
        let timeout = self.config.operation(op).timeout;
        let mut attempts = Vec::new();

        for provider in self.attempt_order(preferred) {
            let id = provider.id();

            if !provider.is_configured() {
                debug!(provider = %id, operation = op.as_str(), "Skipping unconfigured provider");
                attempts.push(ProviderError::unconfigured(id));
                continue;
            }

            debug!(
                provider = %id,
                operation = op.as_str(),
                prompt_len = request.prompt.len(),
                "Attempting provider"
            );
            let started = Instant::now();

            let outcome = match tokio::time::timeout(timeout, provider.complete(&request)).await {
                Ok(Ok(text)) => normalize(&text, id),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(ProviderError::timeout(id, timeout)),
            };

            match outcome {
                Ok(value) => {
                    info!(
                        provider = %id,
                        operation = op.as_str(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Provider succeeded"
                    );
                    return Ok((value, id, attempts));
                }
                Err(e) => {
                    warn!(
                        provider = %id,
                        operation = op.as_str(),
                        kind = ?e.kind,
                        "Provider attempt failed: {}",
                        e.message
                    );
                    attempts.push(e);
                }
            }
        }

        Err(AggregateError::new(attempts))
    }

    fn request_for(&self, op: Operation, system: &str, prompt: String) -> CompletionRequest {
        let shaping = self.config.operation(op);
        CompletionRequest::new(system, prompt, shaping.max_tokens, shaping.temperature)
    }

    /// Generate insights for an expense list (never fails, never empty)
    pub async fn generate_expense_insights(
        &self,
        expenses: &[ExpenseRecord],
        budget: Option<&BudgetContext>,
        preferred: Option<ProviderId>,
    ) -> InsightReport {
        self.generate_expense_insights_on(expenses, budget, preferred, Utc::now().date_naive())
            .await
    }

    /// Same as `generate_expense_insights`, with an explicit date for the budget projection
    pub async fn generate_expense_insights_on(
        &self,
        expenses: &[ExpenseRecord],
        budget: Option<&BudgetContext>,
        preferred: Option<ProviderId>,
        today: NaiveDate,
    ) -> InsightReport {
        if expenses.is_empty() {
            return InsightReport {
                insights: welcome_insights(),
                source: InsightSource::Welcome,
                attempts: Vec::new(),
            };
        }

        let request = self.request_for(
            Operation::Insights,
            prompts::INSIGHTS_SYSTEM_PROMPT,
            prompts::insights_prompt(expenses, budget),
        );

        let (insights, source, attempts) = match self
            .run(Operation::Insights, request, preferred, normalize_insights)
            .await
        {
            Ok((insights, id, attempts)) => (insights, InsightSource::Provider(id), attempts),
            Err(aggregate) => {
                info!(
                    expenses = expenses.len(),
                    "All providers failed, using rule-based insights: {}", aggregate
                );
                (
                    rule_based_insights(expenses),
                    InsightSource::RuleBased,
                    aggregate.attempts,
                )
            }
        };

        InsightReport {
            insights: with_budget_insight(insights, budget, today),
            source,
            attempts,
        }
    }

    /// Answer a free-text financial question
    ///
    /// Fails with `Error::AllProvidersFailed` when no provider produced a usable answer.
    pub async fn generate_financial_answer(
        &self,
        question: &str,
        budget: Option<&BudgetContext>,
        preferred: Option<ProviderId>,
    ) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidInput("Question is required".into()));
        }

        let request = self.request_for(
            Operation::Answer,
            prompts::ANSWER_SYSTEM_PROMPT,
            prompts::answer_prompt(question, budget),
        );

        let (text, provider, _) = self
            .run(Operation::Answer, request, preferred, normalize_answer)
            .await?;

        Ok(Answer { text, provider })
    }

    /// Suggest a category; falls back to keyword matching instead of failing
    pub async fn suggest_category(&self, description: &str) -> Result<CategorySuggestion> {
        let description = validate_description(description)?;

        let request = self.request_for(
            Operation::Category,
            prompts::CATEGORY_SYSTEM_PROMPT,
            prompts::category_prompt(description),
        );

        let suggestion = match self
            .run(Operation::Category, request, None, |text, _| {
                Ok(parse_category(text))
            })
            .await
        {
            Ok((category, id, _)) => CategorySuggestion {
                category,
                source: SuggestionSource::Provider(id),
            },
            Err(aggregate) => {
                debug!("Category providers failed, using keywords: {}", aggregate);
                CategorySuggestion {
                    category: classify_by_keywords(description),
                    source: SuggestionSource::Keywords,
                }
            }
        };

        Ok(suggestion)
    }

    /// Check every provider concurrently with a tiny prompt
    pub async fn check_health(&self) -> Vec<ProviderHealth> {
        self.check_health_within(self.config.health_timeout).await
    }

    pub async fn check_health_within(&self, timeout: Duration) -> Vec<ProviderHealth> {
        let request = CompletionRequest::new(
            prompts::ANSWER_SYSTEM_PROMPT,
            HEALTH_CHECK_PROMPT,
            HEALTH_CHECK_MAX_TOKENS,
            self.config.answer.temperature,
        );

        let checks = self.providers.iter().map(|provider| {
            let request = &request;
            async move {
                let id = provider.id();
                if !provider.is_configured() {
                    return ProviderHealth {
                        provider: id,
                        status: HealthStatus::Unconfigured,
                        latency_ms: None,
                    };
                }

                let started = Instant::now();
                let status = match tokio::time::timeout(timeout, provider.complete(request)).await
                {
                    Ok(Ok(_)) => HealthStatus::Healthy,
                    Ok(Err(e)) if e.kind == ProviderErrorKind::RateLimited => {
                        HealthStatus::RateLimited
                    }
                    Ok(Err(e)) => HealthStatus::Error(e.message),
                    Err(_) => HealthStatus::Error(ProviderError::timeout(id, timeout).message),
                };
                debug!(provider = %id, status = ?status, "Health check finished");

                ProviderHealth {
                    provider: id,
                    status,
                    latency_ms: Some(started.elapsed().as_millis() as u64),
                }
            }
        });

        join_all(checks).await
    }
}

fn normalize_insights(
    text: &str,
    provider: ProviderId,
) -> std::result::Result<Vec<Insight>, ProviderError> {
    let insights = parse_insights(text, provider);
    if insights.is_empty() {
        return Err(ProviderError::normalization(
            provider,
            "Response contained no usable insights",
        ));
    }
    Ok(insights)
}

fn normalize_answer(text: &str, provider: ProviderId) -> std::result::Result<String, ProviderError> {
    clean_answer(text)
        .ok_or_else(|| ProviderError::normalization(provider, "Response contained no answer text"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockProvider, MockReply};
    use chrono::TimeZone;

    const INSIGHTS: &str = r#"[{"id": "ai-1", "type": "tip", "title": "Cook more", "message": "Meal prep saves money"}]"#;

    fn orchestrator(groq: MockProvider, gemini: MockProvider) -> AiOrchestrator {
        AiOrchestrator::with_providers(
            AiConfig::default(),
            vec![ProviderClient::mock(groq), ProviderClient::mock(gemini)],
        )
    }

    fn expenses() -> Vec<ExpenseRecord> {
        let date = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
        vec![ExpenseRecord::new("1", 450.0, "Food", Some("lunch"), date)]
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    #[tokio::test]
    async fn test_first_provider_wins() {
        let groq = MockProvider::replying(ProviderId::Groq, INSIGHTS);
        let gemini = MockProvider::replying(ProviderId::Gemini, INSIGHTS);
        let orch = orchestrator(groq.clone(), gemini.clone());

        let report = orch.generate_expense_insights_on(&expenses(), None, None, today()).await;
        assert_eq!(report.source, InsightSource::Provider(ProviderId::Groq));
        assert_eq!(report.insights[0].id, "ai-1");
        assert!(report.attempts.is_empty());
        assert_eq!(groq.calls(), 1);
        assert_eq!(gemini.calls(), 0);
    }

    #[tokio::test]
    async fn test_preference_reorders_attempts() {
        let groq = MockProvider::replying(ProviderId::Groq, INSIGHTS);
        let gemini = MockProvider::replying(ProviderId::Gemini, INSIGHTS);
        let orch = orchestrator(groq.clone(), gemini.clone());

        let report = orch
            .generate_expense_insights_on(&expenses(), None, Some(ProviderId::Gemini), today())
            .await;
        assert_eq!(report.source, InsightSource::Provider(ProviderId::Gemini));
        assert_eq!(groq.calls(), 0);
    }

    #[tokio::test]
    async fn test_preferred_failure_still_tries_other() {
        let groq = MockProvider::replying(ProviderId::Groq, INSIGHTS);
        let gemini =
            MockProvider::failing(ProviderId::Gemini, ProviderErrorKind::ServiceUnavailable, "503");
        let orch = orchestrator(groq.clone(), gemini.clone());

        let report = orch
            .generate_expense_insights_on(&expenses(), None, Some(ProviderId::Gemini), today())
            .await;
        assert_eq!(report.source, InsightSource::Provider(ProviderId::Groq));
        assert_eq!(report.attempts.len(), 1);
        assert_eq!(gemini.calls(), 1);
        assert_eq!(groq.calls(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_insights_fall_through() {
        let groq = MockProvider::replying(ProviderId::Groq, "I think you spend too much.");
        let gemini = MockProvider::replying(ProviderId::Gemini, INSIGHTS);
        let orch = orchestrator(groq, gemini);

        let report = orch.generate_expense_insights_on(&expenses(), None, None, today()).await;
        assert_eq!(report.source, InsightSource::Provider(ProviderId::Gemini));
        assert_eq!(report.attempts[0].kind, ProviderErrorKind::NormalizationFailure);
    }

    #[tokio::test]
    async fn test_empty_expenses_skip_providers() {
        let groq = MockProvider::replying(ProviderId::Groq, INSIGHTS);
        let orch = orchestrator(groq.clone(), MockProvider::new(ProviderId::Gemini));

        let budget = BudgetContext::new(10_000.0, 500.0);
        let report = orch
            .generate_expense_insights_on(&[], Some(&budget), None, today())
            .await;
        assert_eq!(report.source, InsightSource::Welcome);
        assert_eq!(report.insights, welcome_insights());
        assert_eq!(groq.calls(), 0);
    }

    #[tokio::test]
    async fn test_budget_insight_added_to_provider_batch() {
        let orch = orchestrator(
            MockProvider::replying(ProviderId::Groq, INSIGHTS),
            MockProvider::new(ProviderId::Gemini),
        );
        let budget = BudgetContext::new(10_000.0, 9_000.0);
        let report = orch
            .generate_expense_insights_on(&expenses(), Some(&budget), None, today())
            .await;
        assert_eq!(report.insights[0].id, "budget-analysis");
        assert_eq!(report.insights.len(), 2);
    }

    #[tokio::test]
    async fn test_timeout_advances_to_next_provider() {
        let mut config = AiConfig::default();
        config.answer.timeout = Duration::from_millis(50);
        let slow = MockProvider::replying(ProviderId::Groq, "late").with_delay(Duration::from_secs(5));
        let fast = MockProvider::replying(ProviderId::Gemini, "Save 20% of your income.");
        let orch = AiOrchestrator::with_providers(
            config,
            vec![ProviderClient::mock(slow), ProviderClient::mock(fast)],
        );

        let answer = orch.generate_financial_answer("How do I save?", None, None).await.unwrap();
        assert_eq!(answer.provider, ProviderId::Gemini);
        assert_eq!(answer.text, "Save 20% of your income.");
    }

    #[tokio::test]
    async fn test_answer_empty_question() {
        let orch = orchestrator(MockProvider::new(ProviderId::Groq), MockProvider::new(ProviderId::Gemini));
        let err = orch.generate_financial_answer("  ", None, None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_answer_all_unconfigured() {
        let orch = orchestrator(
            MockProvider::unconfigured(ProviderId::Groq),
            MockProvider::unconfigured(ProviderId::Gemini),
        );
        assert!(!orch.has_credentials());

        match orch.generate_financial_answer("Tips?", None, None).await {
            Err(Error::AllProvidersFailed(agg)) => assert!(agg.all_unconfigured()),
            other => panic!("expected aggregate error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_category_from_provider_and_keywords() {
        let orch = orchestrator(
            MockProvider::replying(ProviderId::Groq, "Transportation"),
            MockProvider::new(ProviderId::Gemini),
        );
        let suggestion = orch.suggest_category("cab to office").await.unwrap();
        assert_eq!(suggestion.category, crate::models::Category::Transportation);
        assert_eq!(suggestion.source, SuggestionSource::Provider(ProviderId::Groq));

        let offline = orchestrator(
            MockProvider::unconfigured(ProviderId::Groq),
            MockProvider::failing(ProviderId::Gemini, ProviderErrorKind::RateLimited, "429"),
        );
        let suggestion = offline.suggest_category("pharmacy run").await.unwrap();
        assert_eq!(suggestion.category, crate::models::Category::Healthcare);
        assert_eq!(suggestion.source, SuggestionSource::Keywords);
    }

    #[tokio::test]
    async fn test_category_uses_low_temperature() {
        let groq = MockProvider::replying(ProviderId::Groq, "Food");
        let orch = orchestrator(groq.clone(), MockProvider::new(ProviderId::Gemini));
        orch.suggest_category("samosa").await.unwrap();

        let request = &groq.requests()[0];
        assert_eq!(request.max_tokens, 50);
        assert!((request.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_health_check() {
        let orch = orchestrator(
            MockProvider::new(ProviderId::Groq).with_script([MockReply::error(
                ProviderErrorKind::RateLimited,
                "429",
            )]),
            MockProvider::unconfigured(ProviderId::Gemini),
        );
        let health = orch.check_health().await;
        assert_eq!(health.len(), 2);
        assert_eq!(health[0].status, HealthStatus::RateLimited);
        assert_eq!(health[1].status, HealthStatus::Unconfigured);
        assert!(health[1].latency_ms.is_none());
    }

    #[test]
    fn test_provider_info() {
        let orch = orchestrator(
            MockProvider::new(ProviderId::Groq),
            MockProvider::unconfigured(ProviderId::Gemini),
        );
        let info = orch.provider_info();
        assert_eq!(info[0].name, "Groq");
        assert!(info[0].configured);
        assert!(!info[1].configured);
        assert!(orch.has_credentials());
    }
}
