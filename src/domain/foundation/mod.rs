//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, and input validation errors
//! used across the tour planner domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::ValidationError;
pub use ids::PlanId;
pub use timestamp::Timestamp;
