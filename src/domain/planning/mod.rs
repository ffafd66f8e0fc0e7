//! Planning domain - trip inputs, generated artifacts, and budget aggregation.
//!
//! Everything here is created and discarded within a single plan request,
//! except [`EnrichedPlan`] which is handed to the persistence collaborator.

mod budget;
mod errors;
mod plan;
mod suggestion;
mod trip;

pub use budget::{BudgetEstimate, BudgetViolation, ConsensusBudget, QuorumPolicy};
pub use errors::{PipelineStage, PlanningError};
pub use plan::{EnrichedPlan, StoredPlan};
pub use suggestion::{
    GeneratedPrompt, PlanSuggestion, PlanTextPolicy, SuggestionViolation, MAX_SUGGESTION_CHARS,
};
pub use trip::TripAttributes;
