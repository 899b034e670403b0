//! Feedback provider client
//!
//! The provider is an opaque text-generation service: it receives a prompt and
//! answers with text that should contain a JSON array of issues. Two
//! implementations:
//! - `GeminiProvider`: calls the Gemini `generateContent` HTTP API (production)
//! - `MockProvider`: returns queued responses (testing)

mod gemini;

pub use gemini::{GeminiConfig, GeminiProvider, API_KEY_ENV, API_KEY_FALLBACK_ENV};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Errors from provider operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider credential not configured: {0}")]
    MissingCredential(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("provider returned no text")]
    EmptyResponse,
    #[error("could not decode provider envelope: {0}")]
    Decode(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Client trait for the text-generation provider.
///
/// Abstracts over transport so synthesis doesn't depend on how the provider
/// is reached.
#[async_trait]
pub trait FeedbackProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Send a prompt and return the raw response text.
    async fn generate(&self, prompt: &str) -> ProviderResult<String>;
}

/// Mock provider for testing. Returns queued responses in order.
///
/// When the queue is empty the `repeat` response (if any) is returned, else a
/// network error. An optional gate holds every call until a permit is added,
/// which lets tests observe state while a call is in flight.
#[derive(Default)]
pub struct MockProvider {
    queue: Mutex<VecDeque<ProviderResult<String>>>,
    repeat: Option<String>,
    prompts: Mutex<Vec<String>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    /// Queue a failure.
    pub fn with_failure(self, error: ProviderError) -> Self {
        self.push(Err(error));
        self
    }

    /// Response returned whenever the queue is empty.
    pub fn repeating(mut self, text: impl Into<String>) -> Self {
        self.repeat = Some(text.into());
        self
    }

    /// Hold each call until the semaphore yields a permit.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Every prompt received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    fn push(&self, item: ProviderResult<String>) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(item);
        }
    }
}

#[async_trait]
impl FeedbackProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, prompt: &str) -> ProviderResult<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|_| ProviderError::Network("mock gate closed".to_string()))?;
            permit.forget();
        }

        let next = self.queue.lock().ok().and_then(|mut q| q.pop_front());
        match (next, &self.repeat) {
            (Some(item), _) => item,
            (None, Some(text)) => Ok(text.clone()),
            (None, None) => Err(ProviderError::Network(
                "no mock response queued".to_string(),
            )),
        }
    }
}
