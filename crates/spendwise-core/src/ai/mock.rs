//! Mock provider for testing
//!
//! Replays scripted replies in order and counts calls, so fallback behavior
//! can be exercised without a network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ProviderError, ProviderErrorKind};

use super::{CompletionRequest, Provider, ProviderId};

/// One scripted outcome
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Error(ProviderErrorKind, String),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        MockReply::Text(text.into())
    }

    pub fn error(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        MockReply::Error(kind, message.into())
    }
}

/// Mock provider impersonating a real provider id
///
/// Scripted replies are consumed in order; once the script runs out the
/// fallback reply is used for every further call. Clones share the script
/// and the call counter.
#[derive(Clone)]
pub struct MockProvider {
    id: ProviderId,
    configured: bool,
    models: Vec<String>,
    delay: Option<Duration>,
    script: Arc<Mutex<VecDeque<MockReply>>>,
    fallback: MockReply,
    calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    /// Create a configured mock that answers "OK" to everything
    pub fn new(id: ProviderId) -> Self {
        Self {
            id,
            configured: true,
            models: vec![format!("{}-mock", id.as_str())],
            delay: None,
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: MockReply::text("OK"),
            calls: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Mock without a credential
    pub fn unconfigured(id: ProviderId) -> Self {
        Self {
            configured: false,
            ..Self::new(id)
        }
    }

    /// Answer every call with this text
    pub fn replying(id: ProviderId, text: impl Into<String>) -> Self {
        Self::new(id).with_fallback(MockReply::text(text))
    }

    /// Fail every call with this kind
    pub fn failing(id: ProviderId, kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self::new(id).with_fallback(MockReply::error(kind, message))
    }

    pub fn with_fallback(mut self, reply: MockReply) -> Self {
        self.fallback = reply;
        self
    }

    /// Queue replies consumed before the fallback
    pub fn with_script(self, replies: impl IntoIterator<Item = MockReply>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.extend(replies);
        }
        self
    }

    /// Sleep before answering (for timeout tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `complete` calls that reached this provider
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn next_reply(&self) -> MockReply {
        self.script
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    fn models(&self) -> &[String] {
        &self.models
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        if !self.configured {
            return Err(ProviderError::unconfigured(self.id));
        }

        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.next_reply() {
            MockReply::Text(text) => Ok(text),
            MockReply::Error(kind, message) => Err(ProviderError::new(self.id, kind, message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest::new("system", "prompt", 10, 0.7)
    }

    #[tokio::test]
    async fn test_script_then_fallback() {
        let mock = MockProvider::replying(ProviderId::Groq, "later").with_script([
            MockReply::error(ProviderErrorKind::RateLimited, "slow down"),
            MockReply::text("first"),
        ]);

        let err = mock.complete(&request()).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::RateLimited);
        assert_eq!(mock.complete(&request()).await.unwrap(), "first");
        assert_eq!(mock.complete(&request()).await.unwrap(), "later");
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn test_clones_share_counter() {
        let mock = MockProvider::new(ProviderId::Gemini);
        let clone = mock.clone();
        clone.complete(&request()).await.unwrap();
        assert_eq!(mock.calls(), 1);
        assert_eq!(mock.requests()[0].prompt, "prompt");
    }

    #[tokio::test]
    async fn test_unconfigured_is_not_counted() {
        let mock = MockProvider::unconfigured(ProviderId::Gemini);
        let err = mock.complete(&request()).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Unconfigured);
        assert_eq!(mock.calls(), 0);
    }
}
