//! The pipeline's final artifact and its persisted form.

use crate::domain::foundation::{PlanId, Timestamp};

use super::{ConsensusBudget, PlanSuggestion, TripAttributes};

/// Trip attributes plus the generated suggestion and consensus budget.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedPlan {
    pub trip: TripAttributes,
    pub suggestion: PlanSuggestion,
    pub budget: ConsensusBudget,
}

/// An enriched plan after the repository has accepted it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPlan {
    pub id: PlanId,
    pub plan: EnrichedPlan,
    pub created_at: Timestamp,
}

impl StoredPlan {
    pub fn new(plan: EnrichedPlan) -> Self {
        Self {
            id: PlanId::new(),
            plan,
            created_at: Timestamp::now(),
        }
    }
}
