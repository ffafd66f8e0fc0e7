//! HTTP adapters - REST API implementations.
//!
//! `api_router` assembles the plan endpoints, the health probe, and the
//! tower-http layers (tracing, CORS, request timeout).

pub mod plans;

use axum::{routing::get, Router};
use http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{CorsPolicy, ServerConfig};

pub use plans::{plan_routes, PlanHandlers};

/// Builds the full API router.
pub fn api_router(handlers: PlanHandlers, server: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(plan_routes(handlers))
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(cors_layer(server))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "ok"
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    let configured = match server.cors_policy() {
        CorsPolicy::AnyOrigin => return base.allow_origin(Any),
        CorsPolicy::AllowList(origins) => origins,
    };

    let origins: Vec<HeaderValue> = configured
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
}
