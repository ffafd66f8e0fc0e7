//! Gemini Provider - Implementation of ModelProvider for Google's Gemini API.
//!
//! Drives both stages of the chained generator. When a JSON response is
//! requested the schema is sent as `generationConfig.responseSchema`, which
//! uses the OpenAPI subset with upper-case type names.
//!
//! # Configuration
//!
//! ```ignore
//! let config = GeminiConfig::new(api_key).with_timeout(Duration::from_secs(30));
//! let provider = GeminiProvider::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, FinishReason, ModelProvider, ModelRequest, ModelResponse, ProviderInfo,
    ResponseFormat, TokenUsage,
};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for the Gemini provider.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    api_key: Secret<String>,
    /// Base URL for the API (default: https://generativelanguage.googleapis.com/v1beta).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 0,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Gemini API provider implementation.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::invalid_request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.config.base_url, model)
    }

    fn to_gemini_request(request: &ModelRequest) -> GenerateContentRequest {
        let system_instruction = request.system_instruction.as_ref().map(|text| Content {
            role: None,
            parts: vec![Part { text: text.clone() }],
        });

        let (response_mime_type, response_schema) = match &request.response_format {
            ResponseFormat::Json { schema } => (
                Some("application/json".to_string()),
                schema.as_ref().map(to_openapi_schema),
            ),
            ResponseFormat::Text => (None, None),
        };

        let generation_config = response_mime_type.map(|mime_type| GenerationConfig {
            response_mime_type: mime_type,
            response_schema,
        });

        GenerateContentRequest {
            system_instruction,
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: request.content.clone(),
                }],
            }],
            generation_config,
        }
    }

    async fn send_request(&self, request: &ModelRequest) -> Result<Response, AIError> {
        self.client
            .post(self.generate_url(&request.model))
            .header("x-goog-api-key", self.config.api_key())
            .header("Content-Type", "application/json")
            .json(&Self::to_gemini_request(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })
    }

    async fn handle_response_status(response: Response) -> Result<Response, AIError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 | 403 => Err(AIError::AuthenticationFailed),
            429 => Err(AIError::rate_limited(Self::parse_retry_delay(&error_body))),
            400 | 404 => Err(AIError::InvalidRequest(error_body)),
            500..=599 => Err(AIError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(AIError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    /// Reads the `RetryInfo.retryDelay` detail (e.g. `"17s"`), defaulting to 30 seconds.
    fn parse_retry_delay(error_body: &str) -> u32 {
        serde_json::from_str::<Value>(error_body)
            .ok()
            .and_then(|parsed| {
                parsed
                    .get("error")?
                    .get("details")?
                    .as_array()?
                    .iter()
                    .find_map(|d| d.get("retryDelay")?.as_str().map(str::to_string))
            })
            .and_then(|delay| delay.trim_end_matches('s').parse::<f64>().ok())
            .map(|secs| secs.ceil().max(1.0) as u32)
            .unwrap_or(30)
    }

    fn parse_body(body: GenerateContentResponse, model: &str) -> Result<ModelResponse, AIError> {
        if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(AIError::content_filtered(reason));
        }

        let candidate = body
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AIError::parse("No candidates in response"))?;

        let finish_reason = match candidate.finish_reason.as_deref() {
            Some("STOP") | None => FinishReason::Stop,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("PROHIBITED_CONTENT") | Some("BLOCKLIST") => {
                return Err(AIError::content_filtered("candidate blocked for safety"));
            }
            Some(_) => FinishReason::Other,
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        let usage = body
            .usage_metadata
            .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        Ok(ModelResponse::new(text, body.model_version.unwrap_or_else(|| model.to_string()))
            .with_usage(usage)
            .with_finish_reason(finish_reason))
    }

    async fn parse_response(response: Response, model: &str) -> Result<ModelResponse, AIError> {
        let response = Self::handle_response_status(response).await?;

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        Self::parse_body(body, model)
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, AIError> {
        let mut retry_count = 0;

        loop {
            let result = match self.send_request(&request).await {
                Ok(response) => Self::parse_response(response, &request.model).await,
                Err(err) => Err(err),
            };

            match result {
                Ok(response) => return Ok(response),
                Err(err) if !err.is_retryable() || retry_count >= self.config.max_retries => {
                    tracing::warn!(model = %request.model, error = %err, "Gemini request failed");
                    return Err(err);
                }
                Err(err) => {
                    tracing::debug!(model = %request.model, error = %err, retry_count, "Retrying Gemini request");
                }
            }

            // Exponential backoff: 1s, 2s, 4s, ...
            sleep(Duration::from_secs(2u64.saturating_pow(retry_count))).await;
            retry_count += 1;
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("gemini").with_response_schema(true)
    }
}

/// Rewrites JSON-schema `type` names into the upper-case form Gemini expects.
fn to_openapi_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let converted = match (key.as_str(), value) {
                        ("type", Value::String(t)) => Value::String(t.to_uppercase()),
                        ("properties", Value::Object(props)) => Value::Object(
                            props
                                .iter()
                                .map(|(name, prop)| (name.clone(), to_openapi_schema(prop)))
                                .collect(),
                        ),
                        ("items", item) => to_openapi_schema(item),
                        _ => value.clone(),
                    };
                    (key.clone(), converted)
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

// ----- Gemini API Types -----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_builder_works() {
        let config = GeminiConfig::new("test-key")
            .with_base_url("https://proxy.local/v1beta/")
            .with_timeout(Duration::from_secs(20))
            .with_max_retries(1);

        assert_eq!(config.base_url, "https://proxy.local/v1beta");
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn generate_url_embeds_model() {
        let provider = GeminiProvider::new(GeminiConfig::new("k")).unwrap();
        assert_eq!(
            provider.generate_url("gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn json_request_carries_mime_type_and_schema() {
        let schema = json!({
            "type": "object",
            "properties": { "prompt": { "type": "string" } },
            "required": ["prompt"]
        });
        let request = ModelRequest::new("gemini-2.5-flash", "[Destination] Busan")
            .with_system_instruction("Write a prompt")
            .with_response_format(ResponseFormat::Json {
                schema: Some(schema),
            });

        let body = serde_json::to_value(GeminiProvider::to_gemini_request(&request)).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Write a prompt");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "[Destination] Busan");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
        assert_eq!(
            body["generationConfig"]["responseSchema"]["properties"]["prompt"]["type"],
            "STRING"
        );
        assert_eq!(body["generationConfig"]["responseSchema"]["required"][0], "prompt");
    }

    #[test]
    fn text_request_has_no_generation_config() {
        let request = ModelRequest::new("gemini-2.5-flash-lite", "Plan it");
        let body = serde_json::to_value(GeminiProvider::to_gemini_request(&request)).unwrap();

        assert!(body.get("generationConfig").is_none());
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn schema_conversion_recurses_into_items() {
        let converted = to_openapi_schema(&json!({
            "type": "array",
            "items": { "type": "number" }
        }));
        assert_eq!(converted, json!({ "type": "ARRAY", "items": { "type": "NUMBER" } }));
    }

    #[test]
    fn parse_body_joins_parts() {
        let body: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Day 1: " }, { "text": "Haeundae" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 7, "candidatesTokenCount": 5 },
            "modelVersion": "gemini-2.5-flash-lite"
        }))
        .unwrap();

        let response = GeminiProvider::parse_body(body, "requested").unwrap();

        assert_eq!(response.text, "Day 1: Haeundae");
        assert_eq!(response.model, "gemini-2.5-flash-lite");
        assert_eq!(response.usage.total_tokens, 12);
    }

    #[test]
    fn parse_body_without_candidates_is_parse_error() {
        let body: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            GeminiProvider::parse_body(body, "m"),
            Err(AIError::Parse(_))
        ));
    }

    #[test]
    fn blocked_prompt_is_content_filtered() {
        let body: GenerateContentResponse =
            serde_json::from_value(json!({ "promptFeedback": { "blockReason": "SAFETY" } })).unwrap();
        assert!(matches!(
            GeminiProvider::parse_body(body, "m"),
            Err(AIError::ContentFiltered { .. })
        ));
    }

    #[test]
    fn parse_retry_delay_reads_details() {
        let error = r#"{"error":{"code":429,"details":[{"@type":"type.googleapis.com/google.rpc.RetryInfo","retryDelay":"17s"}]}}"#;
        assert_eq!(GeminiProvider::parse_retry_delay(error), 17);
        assert_eq!(GeminiProvider::parse_retry_delay("{}"), 30);
    }
}
