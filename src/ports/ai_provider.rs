//! Model Provider Port - Interface for hosted language model APIs.
//!
//! Each adapter translates a provider-neutral [`ModelRequest`] into one vendor
//! API call. Output validation against a schema happens above this port, in the
//! structured model client.
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct EchoProvider;
//!
//! #[async_trait]
//! impl ModelProvider for EchoProvider {
//!     async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, AIError> {
//!         Ok(ModelResponse::new(request.content, request.model))
//!     }
//!
//!     fn provider_info(&self) -> ProviderInfo {
//!         ProviderInfo::new("echo")
//!     }
//! }
//! ```

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for a hosted model provider.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Performs one completion call and returns the raw output text.
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, AIError>;

    /// Get provider information (name, capabilities).
    fn provider_info(&self) -> ProviderInfo;
}

/// Identifier under which a provider is registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    pub const GEMINI: &'static str = "gemini";
    pub const GROQ: &'static str = "groq";

    /// Creates an identifier, normalized to trimmed lowercase.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_lowercase())
    }

    pub fn gemini() -> Self {
        Self::new(Self::GEMINI)
    }

    pub fn groq() -> Self {
        Self::new(Self::GROQ)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A model reachable through a registered provider, written `provider:model`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelRef {
    pub provider: ProviderId,
    pub model: String,
}

impl ModelRef {
    pub fn new(provider: impl Into<ProviderId>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }

    /// Parses a comma-separated list, skipping empty entries.
    pub fn parse_list(list: &str) -> Result<Vec<Self>, String> {
        list.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}

impl FromStr for ModelRef {
    type Err = String;

    /// Splits on the first `:` so model names may themselves contain colons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (provider, model) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("'{}' is not in provider:model form", s.trim()))?;
        let (provider, model) = (provider.trim(), model.trim());
        if provider.is_empty() || model.is_empty() {
            return Err(format!("'{}' is not in provider:model form", s.trim()));
        }
        Ok(Self::new(provider, model))
    }
}

/// Requested shape of the model output.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResponseFormat {
    /// Free text.
    #[default]
    Text,
    /// A JSON document, optionally constrained by a JSON schema.
    Json { schema: Option<serde_json::Value> },
}

impl ResponseFormat {
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json { .. })
    }
}

/// Provider-neutral request for a single completion.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// Model identifier as the provider knows it.
    pub model: String,
    /// Instruction governing the model's behavior.
    pub system_instruction: Option<String>,
    /// The single user turn.
    pub content: String,
    pub response_format: ResponseFormat,
}

impl ModelRequest {
    pub fn new(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_instruction: None,
            content: content.into(),
            response_format: ResponseFormat::Text,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }
}

/// Raw output of one completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    /// Generated text, unparsed.
    pub text: String,
    /// Model that produced the response.
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: FinishReason,
}

impl ModelResponse {
    pub fn new(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
            usage: TokenUsage::zero(),
            finish_reason: FinishReason::Stop,
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
        self.finish_reason = reason;
        self
    }
}

/// Token usage reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop (end of response).
    Stop,
    /// Hit the output token limit.
    Length,
    /// Content was filtered for safety.
    ContentFilter,
    /// Anything else the provider reported.
    Other,
}

/// Provider information and capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (e.g., "gemini", "groq").
    pub name: String,
    /// Whether the API accepts a JSON schema for structured output.
    pub supports_response_schema: bool,
}

impl ProviderInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supports_response_schema: false,
        }
    }

    pub fn with_response_schema(mut self, supports: bool) -> Self {
        self.supports_response_schema = supports;
        self
    }
}

/// Model provider errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AIError {
    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// Content was filtered for safety.
    #[error("content filtered: {reason}")]
    ContentFiltered { reason: String },

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },
}

impl AIError {
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    pub fn content_filtered(reason: impl Into<String>) -> Self {
        Self::ContentFiltered {
            reason: reason.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AIError::RateLimited { .. }
                | AIError::Unavailable { .. }
                | AIError::Network(_)
                | AIError::Timeout { .. }
        )
    }
}
