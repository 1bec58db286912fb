//! Test utilities for spendwise-core
//!
//! This module provides a mock provider server that speaks both the Groq
//! (OpenAI-compatible) and Gemini wire formats, so the real HTTP clients can
//! be exercised against scripted statuses and bodies.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::ai::ProviderId;

/// One scripted HTTP reply
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: Value,
}

impl MockResponse {
    /// Successful Groq chat completion carrying `text`
    pub fn groq_text(text: &str) -> Self {
        Self {
            status: 200,
            body: json!({
                "id": "chatcmpl-mock",
                "object": "chat.completion",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": text},
                    "finish_reason": "stop"
                }]
            }),
        }
    }

    /// Successful Gemini generateContent carrying `text`
    pub fn gemini_text(text: &str) -> Self {
        Self {
            status: 200,
            body: json!({
                "candidates": [{
                    "content": {"parts": [{"text": text}], "role": "model"},
                    "finishReason": "STOP"
                }]
            }),
        }
    }

    /// Error status with a provider-style `{"error": {"message": ...}}` body
    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({"error": {"message": message, "code": status}}),
        }
    }

    /// Arbitrary status and JSON body
    pub fn raw(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

/// Request observed by the mock server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub provider: ProviderId,
    pub path: String,
    pub body: Value,
    /// `Authorization` header (Groq)
    pub authorization: Option<String>,
    /// `x-goog-api-key` header (Gemini)
    pub key: Option<String>,
    /// Raw query string, if any
    pub query: Option<String>,
}

#[derive(Default)]
struct MockState {
    groq: VecDeque<MockResponse>,
    gemini: VecDeque<MockResponse>,
    groq_default: Option<MockResponse>,
    gemini_default: Option<MockResponse>,
    requests: Vec<RecordedRequest>,
}

type SharedState = Arc<Mutex<MockState>>;

/// Mock Groq + Gemini server for integration tests
pub struct MockProviderServer {
    addr: SocketAddr,
    state: SharedState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockProviderServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let state: SharedState = Arc::default();

        let app = Router::new()
            .route("/openai/v1/chat/completions", post(handle_groq))
            .route("/:version/models/:model", post(handle_gemini))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Queue Groq replies (consumed in order, then the default applies)
    pub fn script_groq(&self, responses: impl IntoIterator<Item = MockResponse>) {
        self.state.lock().unwrap().groq.extend(responses);
    }

    /// Queue Gemini replies (consumed in order, then the default applies)
    pub fn script_gemini(&self, responses: impl IntoIterator<Item = MockResponse>) {
        self.state.lock().unwrap().gemini.extend(responses);
    }

    /// Reply used for every Groq request once the script is empty
    pub fn set_groq_default(&self, response: MockResponse) {
        self.state.lock().unwrap().groq_default = Some(response);
    }

    /// Reply used for every Gemini request once the script is empty
    pub fn set_gemini_default(&self, response: MockResponse) {
        self.state.lock().unwrap().gemini_default = Some(response);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Number of requests that reached one provider's endpoint
    pub fn calls(&self, provider: ProviderId) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.provider == provider)
            .count()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockProviderServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn reply(response: MockResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body)).into_response()
}

/// Groq chat completions endpoint
async fn handle_groq(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let response = {
        let mut state = state.lock().unwrap();
        state.requests.push(RecordedRequest {
            provider: ProviderId::Groq,
            path: "/openai/v1/chat/completions".to_string(),
            body,
            authorization: headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            key: None,
            query: None,
        });
        state
            .groq
            .pop_front()
            .or_else(|| state.groq_default.clone())
            .unwrap_or_else(|| MockResponse::groq_text("OK"))
    };
    reply(response)
}

/// Gemini generateContent endpoint (`/{version}/models/{model}:generateContent`)
async fn handle_gemini(
    State(state): State<SharedState>,
    Path((version, model)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let response = {
        let mut state = state.lock().unwrap();
        state.requests.push(RecordedRequest {
            provider: ProviderId::Gemini,
            path: format!("/{}/models/{}", version, model),
            body,
            authorization: None,
            key: headers
                .get("x-goog-api-key")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            query,
        });
        state
            .gemini
            .pop_front()
            .or_else(|| state.gemini_default.clone())
            .unwrap_or_else(|| MockResponse::gemini_text("OK"))
    };
    reply(response)
}
