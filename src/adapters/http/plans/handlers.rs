//! HTTP handlers for plan endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::handlers::plan::{
    CreatePlanCommand, CreatePlanError, CreatePlanHandler, DeletePlanCommand, DeletePlanError,
    DeletePlanHandler, ListPlansHandler,
};
use crate::domain::foundation::PlanId;
use crate::ports::RepositoryError;

use super::dto::{CreatePlanRequest, DeletePlanRequest, ErrorResponse, PlanResponse};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct PlanHandlers {
    create_handler: Arc<CreatePlanHandler>,
    list_handler: Arc<ListPlansHandler>,
    delete_handler: Arc<DeletePlanHandler>,
}

impl PlanHandlers {
    pub fn new(
        create_handler: Arc<CreatePlanHandler>,
        list_handler: Arc<ListPlansHandler>,
        delete_handler: Arc<DeletePlanHandler>,
    ) -> Self {
        Self {
            create_handler,
            list_handler,
            delete_handler,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// GET /api/plans - List stored plans
pub async fn list_plans(State(handlers): State<PlanHandlers>) -> Response {
    match handlers.list_handler.handle().await {
        Ok(plans) => {
            let response: Vec<PlanResponse> = plans.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_repository_error(e),
    }
}

/// POST /api/plans - Generate and store a plan
pub async fn create_plan(
    State(handlers): State<PlanHandlers>,
    body: Result<Json<CreatePlanRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    let trip = match req.into_trip() {
        Ok(trip) => trip,
        Err(e) => return bad_request(e.to_string()),
    };

    match handlers.create_handler.handle(CreatePlanCommand { trip }).await {
        Ok(stored) => {
            let response: PlanResponse = stored.into();
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => handle_create_error(e),
    }
}

/// DELETE /api/plans - Delete a plan by `planId`
pub async fn delete_plan(
    State(handlers): State<PlanHandlers>,
    body: Result<Json<DeletePlanRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    let plan_id = match req.plan_id.parse::<PlanId>() {
        Ok(id) => id,
        Err(_) => return bad_request("Invalid plan ID"),
    };

    match handlers.delete_handler.handle(DeletePlanCommand { plan_id }).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(DeletePlanError::NotFound(id)) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::not_found("Plan", &id.to_string())),
        )
            .into_response(),
        Err(DeletePlanError::Repository(e)) => handle_repository_error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Error mapping
// ════════════════════════════════════════════════════════════════════════════

fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::bad_request(message))).into_response()
}

fn handle_create_error(error: CreatePlanError) -> Response {
    match error {
        CreatePlanError::Planning(err) => {
            tracing::error!(
                stage = err.stage().map(|s| s.as_str()),
                cause = err.root_cause().code(),
                error = %err,
                "Plan generation failed"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal("Plan processing failed")),
            )
                .into_response()
        }
        CreatePlanError::Repository(err) => {
            tracing::warn!(error = %err, "Plan could not be stored");
            bad_request(err.to_string())
        }
    }
}

fn handle_repository_error(error: RepositoryError) -> Response {
    tracing::error!(error = %error, "Plan repository failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::internal("Plan storage unavailable")),
    )
        .into_response()
}
