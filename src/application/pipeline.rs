//! PlanPipeline - trip attributes in, enriched plan out.
//!
//! Runs the chained generator and then the budget ensemble. A failure at any
//! stage is wrapped in `PipelineAborted` naming that stage, and later stages
//! are skipped. No partial plan is ever returned.

use std::time::Instant;

use tracing::Instrument;

use crate::domain::planning::{EnrichedPlan, PipelineStage, PlanningError, TripAttributes};

use super::chained_generator::ChainedPlanGenerator;
use super::ensemble_estimator::EnsembleBudgetEstimator;

pub struct PlanPipeline {
    generator: ChainedPlanGenerator,
    estimator: EnsembleBudgetEstimator,
}

impl PlanPipeline {
    pub fn new(generator: ChainedPlanGenerator, estimator: EnsembleBudgetEstimator) -> Self {
        Self {
            generator,
            estimator,
        }
    }

    /// Produces an enriched plan, or the error of the first stage that failed.
    pub async fn run(&self, trip: TripAttributes) -> Result<EnrichedPlan, PlanningError> {
        let span = tracing::info_span!(
            "plan_pipeline",
            destination = %trip.destination(),
            party_count = trip.party_count(),
            days = trip.duration_days(),
        );
        self.run_stages(trip).instrument(span).await
    }

    async fn run_stages(&self, trip: TripAttributes) -> Result<EnrichedPlan, PlanningError> {
        let started = Instant::now();

        let result = async {
            let prompt = self
                .generator
                .synthesize_prompt(&trip)
                .await
                .map_err(|e| e.aborted_at(PipelineStage::Planning))?;

            let suggestion = self
                .generator
                .generate_suggestion(&prompt)
                .await
                .map_err(|e| e.aborted_at(PipelineStage::Generation))?;
            tracing::debug!(chars = suggestion.char_count(), "Plan suggestion generated");

            let budget = self
                .estimator
                .estimate(suggestion.as_str())
                .await
                .map_err(|e| e.aborted_at(PipelineStage::BudgetEstimation))?;

            Ok::<_, PlanningError>((suggestion, budget))
        }
        .await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok((suggestion, budget)) => {
                tracing::info!(elapsed_ms, "Plan pipeline completed");
                Ok(EnrichedPlan {
                    trip,
                    suggestion,
                    budget,
                })
            }
            Err(err) => {
                tracing::warn!(
                    elapsed_ms,
                    stage = err.stage().map(|s| s.as_str()),
                    cause = err.root_cause().code(),
                    error = %err,
                    "Plan pipeline aborted"
                );
                Err(err)
            }
        }
    }
}
