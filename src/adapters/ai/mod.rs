//! Model Provider Adapters.
//!
//! Implementations of the ModelProvider port.
//!
//! ## Available Adapters
//!
//! - `GeminiProvider` - Google Gemini models, used by the chained generator
//! - `GroqProvider` - Groq-hosted open-weight models, used by the budget ensemble
//! - `MockModelProvider` - Configurable mock for testing

mod gemini_provider;
mod groq_provider;
mod mock_provider;

pub use gemini_provider::{GeminiConfig, GeminiProvider, DEFAULT_GEMINI_BASE_URL};
pub use groq_provider::{GroqConfig, GroqProvider, DEFAULT_GROQ_BASE_URL};
pub use mock_provider::{MockError, MockModelProvider, MockResponse};
