//! HTTP adapter for plan endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{CreatePlanRequest, DeletePlanRequest, ErrorResponse, PlanResponse};
pub use handlers::PlanHandlers;
pub use routes::plan_routes;
