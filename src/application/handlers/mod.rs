//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod plan;

pub use plan::{
    CreatePlanCommand, CreatePlanError, CreatePlanHandler, DeletePlanCommand, DeletePlanError,
    DeletePlanHandler, ListPlansHandler,
};
