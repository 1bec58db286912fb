//! Category suggestion handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::{AppError, AppState};
use spendwise_core::CategorySuggestion;

#[derive(Debug, Deserialize)]
pub struct SuggestCategoryRequest {
    pub description: String,
}

/// POST /api/categories/suggest - Suggest a category for an expense description
///
/// Falls back to keyword matching when no provider answers, so the only
/// failure is input validation.
pub async fn suggest_category(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SuggestCategoryRequest>,
) -> Result<Json<CategorySuggestion>, AppError> {
    let suggestion = state.orchestrator.suggest_category(&req.description).await?;
    Ok(Json(suggestion))
}
