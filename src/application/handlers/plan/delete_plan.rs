//! DeletePlanHandler - Command handler for removing a stored plan.

use std::sync::Arc;

use crate::domain::foundation::PlanId;
use crate::ports::{PlanRepository, RepositoryError};

/// Command to delete a plan.
#[derive(Debug, Clone)]
pub struct DeletePlanCommand {
    pub plan_id: PlanId,
}

/// Error type for plan deletion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeletePlanError {
    #[error("Plan not found: {0}")]
    NotFound(PlanId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Handler for deleting plans.
pub struct DeletePlanHandler {
    repository: Arc<dyn PlanRepository>,
}

impl DeletePlanHandler {
    pub fn new(repository: Arc<dyn PlanRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, cmd: DeletePlanCommand) -> Result<(), DeletePlanError> {
        if !self.repository.delete(&cmd.plan_id).await? {
            return Err(DeletePlanError::NotFound(cmd.plan_id));
        }
        tracing::info!(plan_id = %cmd.plan_id, "Plan deleted");
        Ok(())
    }
}
