//! Storage Adapters
//!
//! Implementations of the PlanRepository port.
//!
//! ## Available Adapters
//!
//! - **InMemoryPlanRepository** - Stores plans in memory (testing/development)

mod in_memory_plan_repository;

pub use in_memory_plan_repository::InMemoryPlanRepository;
