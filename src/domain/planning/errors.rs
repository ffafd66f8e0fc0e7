//! Error taxonomy for the planning pipeline.

use std::fmt;

use thiserror::Error;

/// Stage of the pipeline at which a failure was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Planning,
    Generation,
    BudgetEstimation,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Generation => "generation",
            Self::BudgetEstimation => "budget_estimation",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures surfaced by the model client, generator, estimator, and pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanningError {
    /// The provider call failed. `retryable` is false for failures that a
    /// repeat of the same request cannot fix (bad key, rejected request, blocked content).
    #[error("provider '{provider}' unavailable for model '{model}': {reason}")]
    ProviderUnavailable {
        provider: String,
        model: String,
        reason: String,
        retryable: bool,
    },

    /// The model answered but the answer broke its contract.
    #[error("malformed response from model '{model}': {reason}")]
    MalformedResponse { model: String, reason: String },

    /// A stage failed and the remaining stages were not run.
    #[error("pipeline aborted at {stage} stage: {source}")]
    PipelineAborted {
        stage: PipelineStage,
        #[source]
        source: Box<PlanningError>,
    },

    /// Too few ensemble members produced a usable estimate.
    #[error("insufficient quorum: {succeeded} of {total} members succeeded, {required} required")]
    InsufficientQuorum {
        required: usize,
        succeeded: usize,
        total: usize,
    },
}

impl PlanningError {
    pub fn provider_unavailable(
        provider: impl Into<String>,
        model: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            model: model.into(),
            reason: reason.into(),
            retryable: true,
        }
    }

    /// A provider failure that retrying the same request will not fix.
    pub fn provider_rejected(
        provider: impl Into<String>,
        model: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            model: model.into(),
            reason: reason.into(),
            retryable: false,
        }
    }

    pub fn malformed(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            model: model.into(),
            reason: reason.into(),
        }
    }

    /// Wraps this error as the cause of an abort at `stage`.
    pub fn aborted_at(self, stage: PipelineStage) -> Self {
        Self::PipelineAborted {
            stage,
            source: Box::new(self),
        }
    }

    /// The innermost error, unwrapping any abort layers.
    pub fn root_cause(&self) -> &PlanningError {
        match self {
            Self::PipelineAborted { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Stage recorded by the outermost abort, if any.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Self::PipelineAborted { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Whether retrying the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self.root_cause() {
            Self::ProviderUnavailable { retryable, .. } => *retryable,
            Self::InsufficientQuorum { .. } => true,
            _ => false,
        }
    }

    /// Stable identifier for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ProviderUnavailable { .. } => "provider_unavailable",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::PipelineAborted { .. } => "pipeline_aborted",
            Self::InsufficientQuorum { .. } => "insufficient_quorum",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aborted_error_reports_stage_and_cause() {
        let err = PlanningError::malformed("gemini-2.5-flash", "missing field 'prompt'")
            .aborted_at(PipelineStage::Planning);

        assert_eq!(err.stage(), Some(PipelineStage::Planning));
        assert_eq!(
            err.to_string(),
            "pipeline aborted at planning stage: malformed response from model \
             'gemini-2.5-flash': missing field 'prompt'"
        );
        assert!(matches!(err.root_cause(), PlanningError::MalformedResponse { .. }));
    }

    #[test]
    fn root_cause_of_plain_error_is_itself() {
        let err = PlanningError::provider_unavailable("groq", "m", "HTTP 503");
        assert_eq!(err.root_cause(), &err);
        assert_eq!(err.stage(), None);
    }

    #[test]
    fn retryability_follows_root_cause() {
        assert!(PlanningError::provider_unavailable("groq", "m", "down")
            .aborted_at(PipelineStage::BudgetEstimation)
            .is_retryable());
        assert!(!PlanningError::malformed("m", "bad json").is_retryable());
    }

    #[test]
    fn rejected_provider_call_is_not_retryable() {
        let err = PlanningError::provider_rejected("gemini", "m", "authentication failed")
            .aborted_at(PipelineStage::Planning);
        assert!(!err.is_retryable());
        assert_eq!(err.root_cause().code(), "provider_unavailable");
    }

    #[test]
    fn error_source_chain_is_exposed() {
        use std::error::Error;
        let err = PlanningError::malformed("m", "x").aborted_at(PipelineStage::Generation);
        assert!(err.source().is_some());
    }

    #[test]
    fn stage_names() {
        assert_eq!(PipelineStage::BudgetEstimation.to_string(), "budget_estimation");
        assert_eq!(PipelineStage::Generation.as_str(), "generation");
    }
}
