//! ChainedPlanGenerator - two sequential model calls turning trip attributes
//! into a short plain-text plan.
//!
//! Stage 1 asks a stronger model to write an instruction tailored to the trip.
//! Stage 2 hands that instruction to a lighter model, which writes the plan.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::planning::{
    GeneratedPrompt, PlanSuggestion, PlanTextPolicy, PlanningError, TripAttributes,
    MAX_SUGGESTION_CHARS,
};
use crate::ports::ProviderId;

use super::structured_client::{OutputSchema, StructuredModelClient};

pub const DEFAULT_PLANNING_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-2.5-flash-lite";

const PLANNING_INSTRUCTION: &str = "Using the trip details provided, write a prompt that \
    will produce the best possible travel plan for this trip. Respond in JSON as \
    {\"prompt\": \"<prompt text>\"}.";

/// Models and policy used by the generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorSettings {
    pub provider: ProviderId,
    pub planning_model: String,
    pub generation_model: String,
    pub text_policy: PlanTextPolicy,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            provider: ProviderId::gemini(),
            planning_model: DEFAULT_PLANNING_MODEL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            text_policy: PlanTextPolicy::default(),
        }
    }
}

pub struct ChainedPlanGenerator {
    client: Arc<StructuredModelClient>,
    settings: GeneratorSettings,
    prompt_schema: OutputSchema,
}

impl ChainedPlanGenerator {
    pub fn new(client: Arc<StructuredModelClient>, settings: GeneratorSettings) -> Self {
        Self {
            client,
            settings,
            prompt_schema: OutputSchema::object(&[("prompt", "string")]),
        }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Runs both stages in order. Stage 2 never runs if stage 1 fails.
    pub async fn generate(&self, trip: &TripAttributes) -> Result<PlanSuggestion, PlanningError> {
        let prompt = self.synthesize_prompt(trip).await?;
        self.generate_suggestion(&prompt).await
    }

    /// Stage 1: structured call returning the tailored instruction.
    pub async fn synthesize_prompt(
        &self,
        trip: &TripAttributes,
    ) -> Result<GeneratedPrompt, PlanningError> {
        let model = &self.settings.planning_model;
        let result = self
            .client
            .invoke(
                &self.settings.provider,
                model,
                PLANNING_INSTRUCTION,
                &trip.planning_content(),
                Some(&self.prompt_schema),
            )
            .await?;

        let prompt = result
            .as_json()
            .and_then(|v| v.get("prompt"))
            .and_then(Value::as_str)
            .ok_or_else(|| PlanningError::malformed(model.as_str(), "'prompt' is not a string"))?;

        GeneratedPrompt::new(prompt)
            .map_err(|_| PlanningError::malformed(model.as_str(), "'prompt' is blank"))
    }

    /// Stage 2: free-text call producing the plan, shaped by the text policy.
    pub async fn generate_suggestion(
        &self,
        prompt: &GeneratedPrompt,
    ) -> Result<PlanSuggestion, PlanningError> {
        let model = &self.settings.generation_model;
        let raw = self
            .client
            .invoke(
                &self.settings.provider,
                model,
                &generation_instruction(),
                prompt.as_str(),
                None,
            )
            .await?
            .into_text();

        PlanSuggestion::from_model_output(&raw, self.settings.text_policy)
            .map_err(|violation| PlanningError::malformed(model.as_str(), violation.to_string()))
    }
}

fn generation_instruction() -> String {
    format!(
        "Follow the prompt and write the plan in at most {} characters of plain text \
         (no Markdown or rich text).",
        MAX_SUGGESTION_CHARS
    )
}
