//! HTTP routes for plan endpoints.

use axum::{routing::get, Router};

use super::handlers::{create_plan, delete_plan, list_plans, PlanHandlers};

/// Creates the plan router with all endpoints.
pub fn plan_routes(handlers: PlanHandlers) -> Router {
    Router::new()
        .route(
            "/api/plans",
            get(list_plans).post(create_plan).delete(delete_plan),
        )
        .with_state(handlers)
}
