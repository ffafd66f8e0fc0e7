//! CreatePlanHandler - Command handler for generating and storing a plan.

use std::sync::Arc;

use crate::application::PlanPipeline;
use crate::domain::planning::{PlanningError, StoredPlan, TripAttributes};
use crate::ports::{PlanRepository, RepositoryError};

/// Command to create a plan for a trip.
#[derive(Debug, Clone)]
pub struct CreatePlanCommand {
    pub trip: TripAttributes,
}

/// Error type for plan creation.
#[derive(Debug, Clone)]
pub enum CreatePlanError {
    /// The pipeline failed; nothing was stored.
    Planning(PlanningError),
    /// The plan was generated but could not be stored.
    Repository(RepositoryError),
}

impl std::fmt::Display for CreatePlanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreatePlanError::Planning(err) => write!(f, "{}", err),
            CreatePlanError::Repository(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CreatePlanError {}

impl From<PlanningError> for CreatePlanError {
    fn from(err: PlanningError) -> Self {
        CreatePlanError::Planning(err)
    }
}

impl From<RepositoryError> for CreatePlanError {
    fn from(err: RepositoryError) -> Self {
        CreatePlanError::Repository(err)
    }
}

/// Handler for creating plans.
pub struct CreatePlanHandler {
    pipeline: Arc<PlanPipeline>,
    repository: Arc<dyn PlanRepository>,
}

impl CreatePlanHandler {
    pub fn new(pipeline: Arc<PlanPipeline>, repository: Arc<dyn PlanRepository>) -> Self {
        Self {
            pipeline,
            repository,
        }
    }

    pub async fn handle(&self, cmd: CreatePlanCommand) -> Result<StoredPlan, CreatePlanError> {
        // 1. Run the pipeline; a failure leaves storage untouched
        let plan = self.pipeline.run(cmd.trip).await?;

        // 2. Persist
        let stored = StoredPlan::new(plan);
        self.repository.save(&stored).await?;

        tracing::info!(plan_id = %stored.id, "Plan stored");
        Ok(stored)
    }
}
