//! Mock Model Provider for testing.
//!
//! Provides a configurable mock implementation of the ModelProvider port,
//! allowing tests to run without calling real model APIs.
//!
//! # Features
//!
//! - Pre-configured responses, globally or per model
//! - Simulated delays for timeout and concurrency testing
//! - Error injection for failure-path testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockModelProvider::new()
//!     .with_response(r#"{"prompt": "Plan a trip"}"#)
//!     .with_model_response("kimi", r#"{"min_budget": 1, "max_budget": 2}"#)
//!     .with_delay(Duration::from_millis(100));
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, FinishReason, ModelProvider, ModelRequest, ModelResponse, ProviderInfo, TokenUsage,
};

/// Mock model provider for testing.
///
/// Responses are taken when the call starts, before any simulated delay, so
/// concurrent callers see them in call order.
#[derive(Debug, Clone)]
pub struct MockModelProvider {
    /// Responses consumed in order by any model without its own queue.
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Responses consumed in order by a specific model.
    model_responses: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
    info: ProviderInfo,
    /// Simulated latency per request.
    delay: Duration,
    /// Latency overrides per model.
    model_delays: HashMap<String, Duration>,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<ModelRequest>>>,
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a successful completion.
    Success {
        text: String,
        finish_reason: FinishReason,
    },
    /// Return an error.
    Error(MockError),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    RateLimited { retry_after_secs: u32 },
    ContentFiltered { reason: String },
    Unavailable { message: String },
    AuthenticationFailed,
    Network { message: String },
    Parse { message: String },
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::ContentFiltered { reason } => AIError::content_filtered(reason),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::Network { message } => AIError::network(message),
            MockError::Parse { message } => AIError::parse(message),
            MockError::Timeout { timeout_secs } => AIError::Timeout { timeout_secs },
        }
    }
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for MockModelProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockModelProvider {
    /// Creates a new mock provider with default settings.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            model_responses: Arc::new(Mutex::new(HashMap::new())),
            info: ProviderInfo::new("mock").with_response_schema(true),
            delay: Duration::ZERO,
            model_delays: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a successful response to the shared queue.
    pub fn with_response(self, text: impl Into<String>) -> Self {
        locked(&self.responses).push_back(MockResponse::Success {
            text: text.into(),
            finish_reason: FinishReason::Stop,
        });
        self
    }

    /// Adds an error response to the shared queue.
    pub fn with_error(self, error: MockError) -> Self {
        locked(&self.responses).push_back(MockResponse::Error(error));
        self
    }

    /// Adds a successful response served only to `model`.
    pub fn with_model_response(self, model: impl Into<String>, text: impl Into<String>) -> Self {
        self.push_model_response(
            model.into(),
            MockResponse::Success {
                text: text.into(),
                finish_reason: FinishReason::Stop,
            },
        )
    }

    /// Adds a response served only to `model` that ends with `finish_reason`.
    pub fn with_model_finish_reason(
        self,
        model: impl Into<String>,
        text: impl Into<String>,
        finish_reason: FinishReason,
    ) -> Self {
        self.push_model_response(
            model.into(),
            MockResponse::Success {
                text: text.into(),
                finish_reason,
            },
        )
    }

    /// Adds an error response served only to `model`.
    pub fn with_model_error(self, model: impl Into<String>, error: MockError) -> Self {
        self.push_model_response(model.into(), MockResponse::Error(error))
    }

    fn push_model_response(self, model: String, response: MockResponse) -> Self {
        locked(&self.model_responses)
            .entry(model)
            .or_default()
            .push_back(response);
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets simulated latency for one model.
    pub fn with_model_delay(mut self, model: impl Into<String>, delay: Duration) -> Self {
        self.model_delays.insert(model.into(), delay);
        self
    }

    /// Sets the provider info.
    pub fn with_provider_info(mut self, info: ProviderInfo) -> Self {
        self.info = info;
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        locked(&self.calls).len()
    }

    /// Returns the number of calls made for `model`.
    pub fn calls_for(&self, model: &str) -> usize {
        locked(&self.calls).iter().filter(|c| c.model == model).count()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<ModelRequest> {
        locked(&self.calls).clone()
    }

    /// Clears the call history.
    pub fn clear_calls(&self) {
        locked(&self.calls).clear();
    }

    /// Gets the next response for `model`, falling back to the shared queue, then a default.
    fn next_response(&self, model: &str) -> MockResponse {
        if let Some(response) = locked(&self.model_responses)
            .get_mut(model)
            .and_then(VecDeque::pop_front)
        {
            return response;
        }
        locked(&self.responses)
            .pop_front()
            .unwrap_or_else(|| MockResponse::Success {
                text: "Mock response".to_string(),
                finish_reason: FinishReason::Stop,
            })
    }
}

#[async_trait]
impl ModelProvider for MockModelProvider {
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, AIError> {
        let model = request.model.clone();
        let response = self.next_response(&model);
        locked(&self.calls).push(request);

        let delay = self.model_delays.get(&model).copied().unwrap_or(self.delay);
        if !delay.is_zero() {
            sleep(delay).await;
        }

        match response {
            MockResponse::Success {
                text,
                finish_reason,
            } => Ok(ModelResponse::new(text, model)
                .with_usage(TokenUsage::new(10, 20))
                .with_finish_reason(finish_reason)),
            MockResponse::Error(err) => Err(err.into()),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(model: &str) -> ModelRequest {
        ModelRequest::new(model, "Hello")
    }

    #[tokio::test]
    async fn mock_provider_returns_configured_response() {
        let provider = MockModelProvider::new().with_response("Hello from mock!");

        let response = provider.generate(request("m")).await.unwrap();

        assert_eq!(response.text, "Hello from mock!");
        assert_eq!(response.model, "m");
        assert_eq!(response.finish_reason, FinishReason::Stop);
    }

    #[tokio::test]
    async fn mock_provider_returns_responses_in_order() {
        let provider = MockModelProvider::new()
            .with_response("First")
            .with_response("Second");

        let r1 = provider.generate(request("m")).await.unwrap();
        let r2 = provider.generate(request("m")).await.unwrap();

        assert_eq!(r1.text, "First");
        assert_eq!(r2.text, "Second");
    }

    #[tokio::test]
    async fn mock_provider_returns_default_after_exhausted() {
        let provider = MockModelProvider::new().with_response("Only one");

        provider.generate(request("m")).await.unwrap();
        let r2 = provider.generate(request("m")).await.unwrap();

        assert_eq!(r2.text, "Mock response");
    }

    #[tokio::test]
    async fn model_specific_responses_take_precedence() {
        let provider = MockModelProvider::new()
            .with_response("shared")
            .with_model_response("special", "just for you");

        let special = provider.generate(request("special")).await.unwrap();
        let other = provider.generate(request("other")).await.unwrap();

        assert_eq!(special.text, "just for you");
        assert_eq!(other.text, "shared");
    }

    #[tokio::test]
    async fn mock_provider_returns_configured_error() {
        let provider =
            MockModelProvider::new().with_error(MockError::RateLimited { retry_after_secs: 30 });

        let err = provider.generate(request("m")).await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(err, AIError::RateLimited { retry_after_secs: 30 });
    }

    #[tokio::test]
    async fn mock_provider_tracks_calls() {
        let provider = MockModelProvider::new();
        assert_eq!(provider.call_count(), 0);

        provider.generate(request("a")).await.unwrap();
        provider.generate(request("b")).await.unwrap();
        provider.generate(request("a")).await.unwrap();

        assert_eq!(provider.call_count(), 3);
        assert_eq!(provider.calls_for("a"), 2);
        assert_eq!(provider.get_calls()[1].model, "b");

        provider.clear_calls();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn mock_provider_respects_model_delay() {
        let provider = MockModelProvider::new()
            .with_model_delay("slow", Duration::from_millis(50));

        let start = std::time::Instant::now();
        provider.generate(request("fast")).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(50));

        let start = std::time::Instant::now();
        provider.generate(request("slow")).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn mock_error_converts_to_ai_error() {
        let err: AIError = MockError::Parse { message: "x".into() }.into();
        assert_eq!(err, AIError::parse("x"));

        let err: AIError = MockError::AuthenticationFailed.into();
        assert_eq!(err, AIError::AuthenticationFailed);

        let err: AIError = MockError::Timeout { timeout_secs: 30 }.into();
        assert_eq!(err, AIError::Timeout { timeout_secs: 30 });
    }
}
