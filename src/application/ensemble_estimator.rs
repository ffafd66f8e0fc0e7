//! EnsembleBudgetEstimator - concurrent budget estimates from several models,
//! combined into one envelope.
//!
//! Every member is asked the same question at the same time. The call waits
//! for all members before aggregating, so a slow member delays the result but
//! an early failure does not cancel the others.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::Value;

use crate::domain::planning::{BudgetEstimate, ConsensusBudget, PlanningError, QuorumPolicy};
use crate::ports::{ModelRef, ProviderId};

use super::structured_client::{OutputSchema, StructuredModelClient};

pub const DEFAULT_CURRENCY: &str = "KRW";

pub const DEFAULT_ENSEMBLE_MODELS: [&str; 3] = [
    "moonshotai/kimi-k2-instruct-0905",
    "openai/gpt-oss-120b",
    "meta-llama/llama-4-maverick-17b-128e-instruct",
];

/// The default three Groq-hosted members.
pub fn default_members() -> Vec<ModelRef> {
    DEFAULT_ENSEMBLE_MODELS
        .iter()
        .map(|model| ModelRef::new(ProviderId::groq(), *model))
        .collect()
}

pub struct EnsembleBudgetEstimator {
    client: Arc<StructuredModelClient>,
    members: Vec<ModelRef>,
    currency: String,
    quorum: QuorumPolicy,
    member_timeout: Option<Duration>,
    budget_schema: OutputSchema,
}

impl EnsembleBudgetEstimator {
    pub fn new(client: Arc<StructuredModelClient>, members: Vec<ModelRef>) -> Self {
        Self {
            client,
            members,
            currency: DEFAULT_CURRENCY.to_string(),
            quorum: QuorumPolicy::All,
            member_timeout: None,
            budget_schema: OutputSchema::object(&[("min_budget", "number"), ("max_budget", "number")]),
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_quorum(mut self, quorum: QuorumPolicy) -> Self {
        self.quorum = quorum;
        self
    }

    /// Bounds each member call; a member that overruns counts as failed.
    pub fn with_member_timeout(mut self, timeout: Duration) -> Self {
        self.member_timeout = Some(timeout);
        self
    }

    pub fn members(&self) -> &[ModelRef] {
        &self.members
    }

    /// Queries every member concurrently and aggregates the results.
    ///
    /// # Errors
    ///
    /// - Under `QuorumPolicy::All`, the first member failure in configured order
    /// - Otherwise `InsufficientQuorum` when too few members succeed
    pub async fn estimate(&self, plan_description: &str) -> Result<ConsensusBudget, PlanningError> {
        let instruction = self.instruction();
        let outcomes = join_all(
            self.members
                .iter()
                .map(|member| self.estimate_member(member, &instruction, plan_description)),
        )
        .await;

        self.aggregate(outcomes)
    }

    async fn estimate_member(
        &self,
        member: &ModelRef,
        instruction: &str,
        plan_description: &str,
    ) -> Result<BudgetEstimate, PlanningError> {
        let call = self.client.invoke(
            &member.provider,
            &member.model,
            instruction,
            plan_description,
            Some(&self.budget_schema),
        );

        let result = match self.member_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                PlanningError::provider_unavailable(
                    member.provider.as_str(),
                    member.model.as_str(),
                    format!("no response within {}ms", limit.as_millis()),
                )
            })??,
            None => call.await?,
        };

        let value = result.as_json().ok_or_else(|| {
            PlanningError::malformed(member.model.as_str(), "expected a JSON object")
        })?;
        budget_from_json(&member.model, value)
    }

    fn aggregate(
        &self,
        outcomes: Vec<Result<BudgetEstimate, PlanningError>>,
    ) -> Result<ConsensusBudget, PlanningError> {
        let total = outcomes.len();
        let mut estimates = Vec::with_capacity(total);
        let mut first_failure = None;

        for (member, outcome) in self.members.iter().zip(outcomes) {
            match outcome {
                Ok(estimate) => estimates.push(estimate),
                Err(err) => {
                    tracing::warn!(member = %member, error = %err, "Ensemble member failed");
                    if first_failure.is_none() {
                        first_failure = Some(err);
                    }
                }
            }
        }

        if self.quorum == QuorumPolicy::All {
            if let Some(err) = first_failure {
                return Err(err);
            }
        }

        let required = self.quorum.required(total).max(1);
        if estimates.len() < required {
            return Err(PlanningError::InsufficientQuorum {
                required,
                succeeded: estimates.len(),
                total,
            });
        }

        let consensus = ConsensusBudget::envelope(&estimates).ok_or(
            PlanningError::InsufficientQuorum {
                required,
                succeeded: 0,
                total,
            },
        )?;

        tracing::info!(
            succeeded = estimates.len(),
            total,
            min_budget = consensus.min_budget(),
            max_budget = consensus.max_budget(),
            currency = %self.currency,
            "Ensemble budget computed"
        );
        Ok(consensus)
    }

    fn instruction(&self) -> String {
        format!(
            "You are a travel cost expert. Based on the given travel plan, estimate the total \
             budget in {} using numbers only. Respond in JSON as \
             {{\"min_budget\": <minimum budget>, \"max_budget\": <maximum budget>}}.",
            self.currency
        )
    }
}

/// Reads and validates `min_budget`/`max_budget` from a member's JSON output.
fn budget_from_json(model: &str, value: &Value) -> Result<BudgetEstimate, PlanningError> {
    let min = coerce_amount(model, value, "min_budget")?;
    let max = coerce_amount(model, value, "max_budget")?;
    BudgetEstimate::new(min, max).map_err(|violation| PlanningError::malformed(model, violation.to_string()))
}

/// Accepts a JSON number or a numeric string; `,` and `_` separators are ignored.
fn coerce_amount(model: &str, value: &Value, field: &str) -> Result<f64, PlanningError> {
    let amount = match value.get(field) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',' && *c != '_').collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    };
    amount.ok_or_else(|| PlanningError::malformed(model, format!("'{}' is not numeric", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockError, MockModelProvider};
    use serde_json::json;
    use std::time::Instant;

    const A: &str = "model-a";
    const B: &str = "model-b";
    const C: &str = "model-c";

    fn members() -> Vec<ModelRef> {
        [A, B, C].iter().map(|m| ModelRef::new(ProviderId::groq(), *m)).collect()
    }

    fn estimator(mock: &MockModelProvider) -> EnsembleBudgetEstimator {
        let client = StructuredModelClient::new()
            .with_provider(ProviderId::groq(), Arc::new(mock.clone()));
        EnsembleBudgetEstimator::new(Arc::new(client), members())
    }

    fn budget(min: &str, max: &str) -> String {
        format!(r#"{{"min_budget": {}, "max_budget": {}}}"#, min, max)
    }

    fn happy_mock() -> MockModelProvider {
        MockModelProvider::new()
            .with_model_response(A, budget("300000", "600000"))
            .with_model_response(B, budget("250000", "550000"))
            .with_model_response(C, budget("400000", "700000"))
    }

    #[test]
    fn default_members_are_groq_hosted() {
        let defaults = default_members();
        assert_eq!(defaults.len(), 3);
        assert!(defaults.iter().all(|m| m.provider == ProviderId::groq()));
        assert_eq!(defaults[1].model, "openai/gpt-oss-120b");
    }

    #[test]
    fn coerce_accepts_numbers_and_numeric_strings() {
        let v = json!({ "a": 1500, "b": "250000", "c": " 1,200,000 ", "d": "3_000", "e": 12.5 });
        assert_eq!(coerce_amount("m", &v, "a").unwrap(), 1500.0);
        assert_eq!(coerce_amount("m", &v, "b").unwrap(), 250000.0);
        assert_eq!(coerce_amount("m", &v, "c").unwrap(), 1_200_000.0);
        assert_eq!(coerce_amount("m", &v, "d").unwrap(), 3000.0);
        assert_eq!(coerce_amount("m", &v, "e").unwrap(), 12.5);
    }

    #[test]
    fn coerce_rejects_non_numeric_values() {
        let v = json!({ "a": "about 300k", "b": true, "c": null, "d": "" });
        for field in ["a", "b", "c", "d", "missing"] {
            assert!(
                matches!(coerce_amount("m", &v, field), Err(PlanningError::MalformedResponse { .. })),
                "field {field}"
            );
        }
    }

    #[test]
    fn budget_rejects_inverted_and_negative_ranges() {
        assert!(budget_from_json("m", &json!({ "min_budget": 9, "max_budget": 1 })).is_err());
        assert!(budget_from_json("m", &json!({ "min_budget": -5, "max_budget": 1 })).is_err());
        assert!(budget_from_json("m", &json!({ "min_budget": "NaN", "max_budget": 1 })).is_err());
    }

    #[tokio::test]
    async fn envelope_spans_all_members() {
        let mock = happy_mock();

        let consensus = estimator(&mock).estimate("Day 1 beach").await.unwrap();

        assert_eq!(consensus.min_budget(), 250_000.0);
        assert_eq!(consensus.max_budget(), 700_000.0);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn every_member_gets_the_same_request() {
        let mock = happy_mock();

        estimator(&mock).estimate("Day 1 beach").await.unwrap();

        let calls = mock.get_calls();
        assert!(calls.iter().all(|c| c.content == "Day 1 beach"));
        assert!(calls.iter().all(|c| c.response_format.is_json()));
        assert!(calls
            .iter()
            .all(|c| c.system_instruction.as_deref().unwrap().contains("KRW")));
    }

    #[tokio::test]
    async fn string_amounts_are_coerced() {
        let mock = MockModelProvider::new()
            .with_model_response(A, r#"{"min_budget": "300000", "max_budget": "600,000"}"#)
            .with_model_response(B, budget("250000", "550000"))
            .with_model_response(C, budget("400000", "700000"));

        let consensus = estimator(&mock).estimate("plan").await.unwrap();

        assert_eq!(consensus.min_budget(), 250_000.0);
    }

    #[tokio::test]
    async fn one_non_numeric_member_fails_the_ensemble_by_default() {
        let mock = MockModelProvider::new()
            .with_model_response(A, budget("300000", "600000"))
            .with_model_response(B, r#"{"min_budget": "about 300k", "max_budget": 1}"#)
            .with_model_response(C, budget("400000", "700000"));

        let err = estimator(&mock).estimate("plan").await.unwrap_err();

        assert!(matches!(err, PlanningError::MalformedResponse { ref model, .. } if model == B));
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn first_failure_in_member_order_is_reported() {
        let mock = MockModelProvider::new()
            .with_model_response(A, budget("1", "2"))
            .with_model_error(B, MockError::Unavailable { message: "503".into() })
            .with_model_response(C, "garbage");

        let err = estimator(&mock).estimate("plan").await.unwrap_err();

        assert!(matches!(err, PlanningError::ProviderUnavailable { ref model, .. } if model == B));
    }

    #[tokio::test]
    async fn majority_quorum_tolerates_one_failure() {
        let mock = MockModelProvider::new()
            .with_model_response(A, budget("300000", "600000"))
            .with_model_error(B, MockError::Network { message: "reset".into() })
            .with_model_response(C, budget("400000", "700000"));

        let consensus = estimator(&mock)
            .with_quorum(QuorumPolicy::Majority)
            .estimate("plan")
            .await
            .unwrap();

        assert_eq!(consensus.min_budget(), 300_000.0);
        assert_eq!(consensus.max_budget(), 700_000.0);
    }

    #[tokio::test]
    async fn majority_quorum_reports_insufficient_successes() {
        let mock = MockModelProvider::new()
            .with_model_response(A, budget("300000", "600000"))
            .with_model_error(B, MockError::Network { message: "reset".into() })
            .with_model_response(C, "not json");

        let err = estimator(&mock)
            .with_quorum(QuorumPolicy::Majority)
            .estimate("plan")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PlanningError::InsufficientQuorum {
                required: 2,
                succeeded: 1,
                total: 3
            }
        );
    }

    #[tokio::test]
    async fn members_run_concurrently() {
        let mock = happy_mock().with_delay(Duration::from_millis(100));

        let start = Instant::now();
        estimator(&mock).estimate("plan").await.unwrap();

        assert!(start.elapsed() < Duration::from_millis(250));
    }

    #[tokio::test]
    async fn slow_member_times_out() {
        let mock = happy_mock().with_model_delay(C, Duration::from_millis(500));

        let err = estimator(&mock)
            .with_member_timeout(Duration::from_millis(50))
            .estimate("plan")
            .await
            .unwrap_err();

        assert!(matches!(err, PlanningError::ProviderUnavailable { ref model, .. } if model == C));
    }

    #[tokio::test]
    async fn at_least_one_survives_a_timeout() {
        let mock = happy_mock().with_model_delay(C, Duration::from_millis(500));

        let consensus = estimator(&mock)
            .with_quorum(QuorumPolicy::AtLeast(1))
            .with_member_timeout(Duration::from_millis(50))
            .estimate("plan")
            .await
            .unwrap();

        assert_eq!(consensus.max_budget(), 600_000.0);
    }

    #[tokio::test]
    async fn empty_ensemble_is_insufficient() {
        let client = StructuredModelClient::new();
        let estimator = EnsembleBudgetEstimator::new(Arc::new(client), Vec::new());

        let err = estimator.estimate("plan").await.unwrap_err();

        assert_eq!(
            err,
            PlanningError::InsufficientQuorum {
                required: 1,
                succeeded: 0,
                total: 0
            }
        );
    }

    #[tokio::test]
    async fn currency_is_configurable() {
        let mock = happy_mock();

        estimator(&mock).with_currency("USD").estimate("plan").await.unwrap();

        assert!(mock.get_calls()[0]
            .system_instruction
            .as_deref()
            .unwrap()
            .contains("USD"));
    }
}
