//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `ModelProvider` - One completion call against a hosted model API
//! - `PlanRepository` - Persistence of enriched plans

mod ai_provider;
mod plan_repository;

pub use ai_provider::{
    AIError, FinishReason, ModelProvider, ModelRef, ModelRequest, ModelResponse, ProviderId,
    ProviderInfo, ResponseFormat, TokenUsage,
};
pub use plan_repository::{PlanRepository, RepositoryError};
