//! In-Memory Plan Repository Adapter
//!
//! Stores enriched plans in insertion order.
//! Useful for testing and development.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::PlanId;
use crate::domain::planning::StoredPlan;
use crate::ports::{PlanRepository, RepositoryError};

/// In-memory storage for plans
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlanRepository {
    plans: Arc<RwLock<Vec<StoredPlan>>>,
}

impl InMemoryPlanRepository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored plans (useful for tests)
    pub async fn clear(&self) {
        self.plans.write().await.clear();
    }

    /// Get the number of stored plans
    pub async fn plan_count(&self) -> usize {
        self.plans.read().await.len()
    }
}

#[async_trait]
impl PlanRepository for InMemoryPlanRepository {
    async fn save(&self, plan: &StoredPlan) -> Result<(), RepositoryError> {
        let mut plans = self.plans.write().await;
        if plans.iter().any(|p| p.id == plan.id) {
            return Err(RepositoryError::Duplicate(plan.id));
        }
        plans.push(plan.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<StoredPlan>, RepositoryError> {
        Ok(self.plans.read().await.clone())
    }

    async fn delete(&self, id: &PlanId) -> Result<bool, RepositoryError> {
        let mut plans = self.plans.write().await;
        let before = plans.len();
        plans.retain(|p| p.id != *id);
        Ok(plans.len() < before)
    }
}
