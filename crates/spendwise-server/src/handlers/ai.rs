//! AI provider status and health handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use spendwise_core::{ProviderHealth, ProviderInfo};

/// Provider configuration overview
#[derive(Debug, Serialize)]
pub struct AiStatusResponse {
    /// True if any provider has a credential
    pub configured: bool,
    pub providers: Vec<ProviderInfo>,
}

/// GET /api/ai/status - Which providers are configured (no network I/O)
pub async fn ai_status(State(state): State<Arc<AppState>>) -> Json<AiStatusResponse> {
    Json(AiStatusResponse {
        configured: state.orchestrator.has_credentials(),
        providers: state.orchestrator.provider_info(),
    })
}

/// GET /api/ai/health - Check every provider with a tiny prompt
pub async fn ai_health(State(state): State<Arc<AppState>>) -> Json<Vec<ProviderHealth>> {
    Json(state.orchestrator.check_health().await)
}
