//! ListPlansHandler - Query handler for listing stored plans.

use std::sync::Arc;

use crate::domain::planning::StoredPlan;
use crate::ports::{PlanRepository, RepositoryError};

/// Handler for listing plans.
pub struct ListPlansHandler {
    repository: Arc<dyn PlanRepository>,
}

impl ListPlansHandler {
    pub fn new(repository: Arc<dyn PlanRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self) -> Result<Vec<StoredPlan>, RepositoryError> {
        self.repository.list().await
    }
}
