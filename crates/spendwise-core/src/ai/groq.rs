//! Groq provider
//!
//! Groq serves an OpenAI-compatible chat completions API under
//! `{base}/openai/v1/chat/completions` with bearer authentication.
//! Models are tried in configured order; a 404/400 moves to the next one.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderErrorKind};

use super::{
    classify_status, error_message, is_model_miss, models_exhausted, CompletionRequest, Provider,
    ProviderId,
};

#[derive(Clone)]
pub struct GroqProvider {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
    models: Vec<String>,
}

impl GroqProvider {
    pub fn new(config: &ProviderConfig, http_client: Client) -> Self {
        Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            models: config.models.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/openai/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl Provider for GroqProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Groq
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn models(&self) -> &[String] {
        &self.models
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ProviderError::unconfigured(ProviderId::Groq));
        };

        let mut last_miss = None;

        for model in &self.models {
            let body = ChatCompletionRequest {
                model,
                messages: vec![
                    ChatMessage {
                        role: "system",
                        content: &request.system,
                    },
                    ChatMessage {
                        role: "user",
                        content: &request.prompt,
                    },
                ],
                temperature: request.temperature,
                max_tokens: request.max_tokens,
            };

            debug!(model = %model, prompt_len = request.prompt.len(), "Groq request");

            let response = self
                .http_client
                .post(self.endpoint())
                .bearer_auth(api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| ProviderError::from_transport(ProviderId::Groq, e))?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                if is_model_miss(status) {
                    debug!(model = %model, status = status.as_u16(), "Groq model unavailable, trying next");
                    last_miss = Some(error_message(status, &text));
                    continue;
                }
                return Err(classify_status(ProviderId::Groq, status, &text));
            }

            let envelope: ChatCompletionResponse = response
                .json()
                .await
                .map_err(|e| ProviderError::from_transport(ProviderId::Groq, e))?;

            return extract_text(envelope).ok_or_else(|| {
                ProviderError::new(
                    ProviderId::Groq,
                    ProviderErrorKind::MalformedResponse,
                    format!("No content in response from {}", model),
                )
            });
        }

        Err(models_exhausted(ProviderId::Groq, last_miss))
    }
}

/// First non-empty message content in the envelope
fn extract_text(envelope: ChatCompletionResponse) -> Option<String> {
    envelope
        .choices
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|c| !c.trim().is_empty())
}

/// OpenAI-style chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// OpenAI-style chat completion response (every field optional)
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}
