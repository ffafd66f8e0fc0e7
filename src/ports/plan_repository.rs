//! Plan Repository Port - Persistence for enriched plans.
//!
//! The pipeline itself never touches storage; the create-plan handler saves
//! its output through this port.

use async_trait::async_trait;

use crate::domain::foundation::PlanId;
use crate::domain::planning::StoredPlan;

/// Errors that can occur during plan persistence
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepositoryError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("Duplicate plan id: {0}")]
    Duplicate(PlanId),
}

/// Port for storing, listing, and deleting plans
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Persist a new plan
    ///
    /// # Errors
    /// Returns `RepositoryError::Duplicate` if a plan with the same id exists
    async fn save(&self, plan: &StoredPlan) -> Result<(), RepositoryError>;

    /// All stored plans, oldest first
    async fn list(&self) -> Result<Vec<StoredPlan>, RepositoryError>;

    /// Remove a plan by id
    ///
    /// # Returns
    /// `true` if a plan was removed, `false` if none matched
    async fn delete(&self, id: &PlanId) -> Result<bool, RepositoryError>;
}
