//! HTTP DTOs for plan endpoints.
//!
//! Field names follow the stored record layout (`people_count`, `ai_suggestion`, ...),
//! keeping the JSON contract independent of the domain types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;
use crate::domain::planning::{StoredPlan, TripAttributes};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to create a plan.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlanRequest {
    pub destination: String,
    pub purpose: String,
    pub people_count: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl CreatePlanRequest {
    /// Validates the request into trip attributes.
    pub fn into_trip(self) -> Result<TripAttributes, ValidationError> {
        TripAttributes::new(
            self.destination,
            self.purpose,
            self.people_count,
            self.start_date,
            self.end_date,
        )
    }
}

/// Request to delete a plan.
#[derive(Debug, Clone, Deserialize)]
pub struct DeletePlanRequest {
    #[serde(rename = "planId")]
    pub plan_id: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// A stored plan as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct PlanResponse {
    pub id: String,
    pub destination: String,
    pub purpose: String,
    pub people_count: u32,
    pub start_date: String,
    pub end_date: String,
    pub ai_suggestion: String,
    pub ai_min_budget: f64,
    pub ai_max_budget: f64,
    pub created_at: String,
}

impl From<StoredPlan> for PlanResponse {
    fn from(stored: StoredPlan) -> Self {
        let trip = &stored.plan.trip;
        Self {
            id: stored.id.to_string(),
            destination: trip.destination().to_string(),
            purpose: trip.purpose().to_string(),
            people_count: trip.party_count(),
            start_date: trip.start_date().format("%Y-%m-%d").to_string(),
            end_date: trip.end_date().format("%Y-%m-%d").to_string(),
            ai_suggestion: stored.plan.suggestion.as_str().to_string(),
            ai_min_budget: stored.plan.budget.min_budget(),
            ai_max_budget: stored.plan.budget.max_budget(),
            created_at: stored.created_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(resource_type: &str, id: &str) -> Self {
        Self {
            code: "NOT_FOUND".to_string(),
            message: format!("{} not found: {}", resource_type, id),
            details: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
            details: None,
        }
    }
}
