//! Plan command and query handlers.

// Command handlers
mod create_plan;
mod delete_plan;

// Query handlers
mod list_plans;

pub use create_plan::{CreatePlanCommand, CreatePlanError, CreatePlanHandler};
pub use delete_plan::{DeletePlanCommand, DeletePlanError, DeletePlanHandler};
pub use list_plans::ListPlansHandler;
