//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Model providers (Gemini, Groq, mock)
//! - `http` - REST API over axum
//! - `storage` - Plan repository implementations

pub mod ai;
pub mod http;
pub mod storage;
