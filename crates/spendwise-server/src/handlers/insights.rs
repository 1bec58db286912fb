//! Insight and financial-question handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppError, AppState};
use spendwise_core::rules::configuration_required_insight;
use spendwise_core::{
    AggregateError, BudgetContext, BudgetStatus, ExpenseRecord, FailureNotice, Insight,
    InsightSource, ProviderId,
};

#[derive(Debug, Deserialize)]
pub struct InsightsRequest {
    #[serde(default)]
    pub expenses: Vec<ExpenseRecord>,
    pub budget: Option<BudgetContext>,
    pub preferred_provider: Option<ProviderId>,
}

/// Budget figures echoed back with derived status
#[derive(Debug, Serialize)]
pub struct BudgetSummary {
    pub monthly_budget: f64,
    pub current_spending: f64,
    pub percentage_used: f64,
    pub remaining: f64,
    pub status: BudgetStatus,
}

impl BudgetSummary {
    fn from_context(budget: &BudgetContext) -> Option<Self> {
        (budget.monthly_budget > 0.0).then(|| Self {
            monthly_budget: budget.monthly_budget,
            current_spending: budget.current_spending,
            percentage_used: budget.percentage_used(),
            remaining: budget.remaining(),
            status: budget.status(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: Vec<Insight>,
    pub source: InsightSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetSummary>,
    /// Present when the insights are a fallback for failed providers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<FailureNotice>,
}

/// POST /api/insights - Generate insights for the supplied expenses
///
/// Never fails: an empty expense list always gets the welcome set and
/// provider outages degrade to rule-based insights.
pub async fn generate_insights(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InsightsRequest>,
) -> Json<InsightsResponse> {
    let budget = req.budget.as_ref().and_then(BudgetSummary::from_context);

    if !req.expenses.is_empty() && !state.orchestrator.has_credentials() {
        info!("No AI credentials configured, returning configuration notice");
        return Json(InsightsResponse {
            insights: vec![configuration_required_insight()],
            source: InsightSource::Unconfigured,
            budget,
            notice: Some(FailureNotice::ConfigurationMissing),
        });
    }

    let report = state
        .orchestrator
        .generate_expense_insights(&req.expenses, req.budget.as_ref(), req.preferred_provider)
        .await;

    let notice = report
        .source
        .is_degraded()
        .then(|| FailureNotice::from_aggregate(&AggregateError::new(report.attempts.clone())));

    Json(InsightsResponse {
        insights: report.insights,
        source: report.source,
        budget,
        notice,
    })
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    #[serde(default)]
    pub question: String,
    pub budget: Option<BudgetContext>,
    pub preferred_provider: Option<ProviderId>,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub provider: ProviderId,
}

/// POST /api/insights/answer - Answer a free-text financial question
pub async fn answer_question(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let answer = state
        .orchestrator
        .generate_financial_answer(&req.question, req.budget.as_ref(), req.preferred_provider)
        .await?;

    Ok(Json(AnswerResponse {
        answer: answer.text,
        provider: answer.provider,
    }))
}
