//! Gemini provider
//!
//! Calls `{base}/{version}/models/{model}:generateContent` with the credential
//! in the `x-goog-api-key` header, never in the URL.
//! Gemini has no separate system role on every API version, so the system
//! prompt is prepended to the user text. Each (model, version) pair is tried
//! in order; a 404/400 moves to the next pair.

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

/// Credential header accepted by every Gemini API version
const API_KEY_HEADER: &str = "x-goog-api-key";

const DEFAULT_API_VERSION: &str = "v1";

#[derive(Clone)]
pub struct GeminiProvider {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
    models: Vec<String>,
    api_versions: Vec<String>,
}

impl GeminiProvider {
    pub fn new(config: &ProviderConfig, http_client: Client) -> Self {
        let api_versions = if config.api_versions.is_empty() {
            vec![DEFAULT_API_VERSION.to_string()]
        } else {
            config.api_versions.clone()
        };
        Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            models: config.models.clone(),
            api_versions,
        }
    }

    fn endpoint(&self, version: &str, model: &str) -> String {
        format!("{}/{}/models/{}:generateContent", self.base_url, version, model)
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn models(&self) -> &[String] {
        &self.models
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ProviderError::unconfigured(ProviderId::Gemini));
        };

        let text = format!("{}\n\n{}", request.system, request.prompt);
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: &text }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        };

        let mut last_miss = None;

        for model in &self.models {
            for version in &self.api_versions {
                debug!(model = %model, version = %version, prompt_len = text.len(), "Gemini request");

                let response = self
                    .http_client
                    .post(self.endpoint(version, model))
                    .header(API_KEY_HEADER, api_key)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| ProviderError::from_transport(ProviderId::Gemini, e))?;

                let status = response.status();
                if !status.is_success() {
                    let text = response.text().await.unwrap_or_default();
                    if is_model_miss(status) {
                        debug!(
                            model = %model,
                            version = %version,
                            status = status.as_u16(),
                            "Gemini model unavailable, trying next"
                        );
                        last_miss = Some(error_message(status, &text));
                        continue;
                    }
                    return Err(classify_status(ProviderId::Gemini, status, &text));
                }

                let envelope: GenerateContentResponse = response
                    .json()
                    .await
                    .map_err(|e| ProviderError::from_transport(ProviderId::Gemini, e))?;

                return extract_text(envelope).ok_or_else(|| {
                    ProviderError::new(
                        ProviderId::Gemini,
                        ProviderErrorKind::MalformedResponse,
                        format!("No content in response from {}/{}", version, model),
                    )
                });
            }
        }

        Err(models_exhausted(ProviderId::Gemini, last_miss))
    }
}

/// Text of the first part of the first candidate
fn extract_text(envelope: GenerateContentResponse) -> Option<String> {
    envelope
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts)
        .and_then(|parts| parts.into_iter().find_map(|p| p.text))
        .filter(|t| !t.trim().is_empty())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

/// generateContent response (every field optional)
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Option<String> {
        extract_text(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_extract_text() {
        let json = r#"{"candidates": [{"content": {"parts": [{"text": "Namaste"}], "role": "model"}, "finishReason": "STOP"}]}"#;
        assert_eq!(parse(json).as_deref(), Some("Namaste"));
    }

    #[test]
    fn test_extract_text_missing_pieces() {
        assert!(parse(r#"{}"#).is_none());
        assert!(parse(r#"{"candidates": []}"#).is_none());
        assert!(parse(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).is_none());
        assert!(parse(r#"{"candidates": [{"content": {"parts": []}}]}"#).is_none());
    }

    #[test]
    fn test_request_uses_camel_case() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: "hello" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                max_output_tokens: 400,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 400);
    }

    #[test]
    fn test_empty_versions_default_to_v1() {
        let config = ProviderConfig {
            id: ProviderId::Gemini,
            api_key: Some("k".to_string()),
            base_url: "https://example.test/".to_string(),
            models: vec!["gemini-pro".to_string()],
            api_versions: vec![],
        };
        let provider = GeminiProvider::new(&config, Client::new());
        assert!(provider.is_configured());
        assert_eq!(
            provider.endpoint(&provider.api_versions[0], "gemini-pro"),
            "https://example.test/v1/models/gemini-pro:generateContent"
        );
    }
}
