//! StructuredModelClient - one model call, optionally validated against a schema.
//!
//! Routes a call to the provider registered under the requested identifier,
//! then either returns the raw text or parses it as a JSON object and checks
//! the schema's `required` properties.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::domain::planning::PlanningError;
use crate::ports::{
    AIError, FinishReason, ModelProvider, ModelRequest, ProviderId, ResponseFormat,
};

/// JSON schema describing an object output, plus its required property names.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    schema: Value,
    required: Vec<String>,
}

impl OutputSchema {
    /// Wraps a JSON schema, reading `required` from its top level.
    pub fn new(schema: Value) -> Self {
        let required = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self { schema, required }
    }

    /// Object schema whose listed properties are all required.
    pub fn object(properties: &[(&str, &str)]) -> Self {
        let props: serde_json::Map<String, Value> = properties
            .iter()
            .map(|(name, kind)| (name.to_string(), serde_json::json!({ "type": kind })))
            .collect();
        let required: Vec<&str> = properties.iter().map(|(name, _)| *name).collect();
        Self::new(serde_json::json!({
            "type": "object",
            "properties": props,
            "required": required,
        }))
    }

    pub fn as_value(&self) -> &Value {
        &self.schema
    }

    pub fn required_fields(&self) -> &[String] {
        &self.required
    }
}

/// Output of a structured call.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredResult {
    /// Parsed JSON object, present when a schema was supplied.
    Json(Value),
    /// Raw text, when no schema was supplied.
    Text(String),
}

impl StructuredResult {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// The text form; JSON results are re-serialized.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Json(value) => value.to_string(),
        }
    }
}

/// Uniform entry point for every model call in the pipeline.
#[derive(Clone, Default)]
pub struct StructuredModelClient {
    providers: HashMap<ProviderId, Arc<dyn ModelProvider>>,
}

impl StructuredModelClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` under `id`, replacing any earlier registration.
    pub fn with_provider(mut self, id: ProviderId, provider: Arc<dyn ModelProvider>) -> Self {
        self.providers.insert(id, provider);
        self
    }

    pub fn has_provider(&self, id: &ProviderId) -> bool {
        self.providers.contains_key(id)
    }

    /// Performs exactly one provider call (adapter retries aside).
    ///
    /// # Errors
    ///
    /// - `ProviderUnavailable` if `provider` is not registered or the call fails
    /// - `MalformedResponse` if a schema was supplied and the output is not a
    ///   JSON object carrying every required property
    pub async fn invoke(
        &self,
        provider: &ProviderId,
        model: &str,
        system_instruction: &str,
        content: &str,
        output_schema: Option<&OutputSchema>,
    ) -> Result<StructuredResult, PlanningError> {
        let backend = self.providers.get(provider).ok_or_else(|| {
            PlanningError::provider_rejected(
                provider.as_str(),
                model,
                "no provider registered under this id",
            )
        })?;

        // Providers without schema support still get JSON mode; required
        // fields are checked here either way.
        let info = backend.provider_info();
        let format = match output_schema {
            Some(schema) if info.supports_response_schema => ResponseFormat::Json {
                schema: Some(schema.as_value().clone()),
            },
            Some(_) => ResponseFormat::Json { schema: None },
            None => ResponseFormat::Text,
        };
        let request = ModelRequest::new(model, content)
            .with_system_instruction(system_instruction)
            .with_response_format(format);

        let started = Instant::now();
        let response = backend
            .generate(request)
            .await
            .map_err(|err| map_provider_error(provider, model, err))?;

        tracing::debug!(
            provider = %provider,
            backend = %info.name,
            model = model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            total_tokens = response.usage.total_tokens,
            "Model call completed"
        );

        match response.finish_reason {
            FinishReason::Length => {
                return Err(PlanningError::malformed(model, "output cut off at the token limit"));
            }
            FinishReason::ContentFilter => {
                return Err(PlanningError::malformed(model, "output stopped by the content filter"));
            }
            FinishReason::Stop | FinishReason::Other => {}
        }

        match output_schema {
            Some(schema) => parse_structured(model, &response.text, schema).map(StructuredResult::Json),
            None => Ok(StructuredResult::Text(response.text)),
        }
    }
}

/// Keeps the adapter's own retry verdict on the mapped error.
fn map_provider_error(provider: &ProviderId, model: &str, err: AIError) -> PlanningError {
    match err {
        AIError::Parse(reason) => PlanningError::malformed(model, reason),
        other if other.is_retryable() => {
            PlanningError::provider_unavailable(provider.as_str(), model, other.to_string())
        }
        other => PlanningError::provider_rejected(provider.as_str(), model, other.to_string()),
    }
}

/// Parses `raw` as a JSON object and checks the schema's required properties.
fn parse_structured(model: &str, raw: &str, schema: &OutputSchema) -> Result<Value, PlanningError> {
    let body = strip_code_fence(raw);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| PlanningError::malformed(model, format!("output is not valid JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| PlanningError::malformed(model, "output is not a JSON object"))?;

    if let Some(missing) = schema
        .required_fields()
        .iter()
        .find(|field| object.get(field.as_str()).map_or(true, Value::is_null))
    {
        return Err(PlanningError::malformed(
            model,
            format!("missing required field '{}'", missing),
        ));
    }

    Ok(value)
}

/// Unwraps a single Markdown code fence such as ```` ```json ... ``` ````.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return trimmed;
    };
    match rest.split_once('\n') {
        Some((lang, body)) if lang.trim().chars().all(|c| c.is_ascii_alphanumeric()) => body.trim(),
        _ => rest.trim(),
    }
}
