//! Domain layer containing planning types and their invariants.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps, validation errors)
//! - `planning` - Trip attributes, generated text, budget estimates, pipeline errors

pub mod foundation;
pub mod planning;
