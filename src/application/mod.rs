//! Application layer - Pipeline services, Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! The pipeline services run the model calls; the handlers wrap them with
//! persistence for the HTTP surface.

mod chained_generator;
mod ensemble_estimator;
pub mod handlers;
mod pipeline;
mod structured_client;

pub use chained_generator::{
    ChainedPlanGenerator, GeneratorSettings, DEFAULT_GENERATION_MODEL, DEFAULT_PLANNING_MODEL,
};
pub use ensemble_estimator::{
    default_members, EnsembleBudgetEstimator, DEFAULT_CURRENCY, DEFAULT_ENSEMBLE_MODELS,
};
pub use handlers::{
    CreatePlanCommand, CreatePlanError, CreatePlanHandler, DeletePlanCommand, DeletePlanError,
    DeletePlanHandler, ListPlansHandler,
};
pub use pipeline::PlanPipeline;
pub use structured_client::{OutputSchema, StructuredModelClient, StructuredResult};
