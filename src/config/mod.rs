//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `TOUR_PLANNER` prefix and nested values use double underscores as separators.
//! The bare `GEMINI_API_KEY` and `GROQ_API_KEY` variables are honored as
//! fallbacks for the prefixed keys.
//!
//! # Example
//!
//! ```no_run
//! use tour_planner::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod error;
mod server;

pub use ai::{AiConfig, KNOWN_PROVIDERS, MAX_RETRIES};
pub use error::{ConfigError, ValidationError};
pub use server::{CorsPolicy, Environment, LogFormat, ServerConfig};

use serde::Deserialize;

const ENV_PREFIX: &str = "TOUR_PLANNER";

/// Bare provider key variables and the config keys they default.
const KEY_FALLBACKS: [(&str, &str); 2] = [
    ("GEMINI_API_KEY", "ai.gemini_api_key"),
    ("GROQ_API_KEY", "ai.groq_api_key"),
];

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Model providers, pipeline models, and ensemble policy
    #[serde(default)]
    pub ai: AiConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Seeds provider keys from bare `GEMINI_API_KEY` / `GROQ_API_KEY`
    /// 3. Reads environment variables with `TOUR_PLANNER` prefix
    /// 4. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `TOUR_PLANNER__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `TOUR_PLANNER__AI__QUORUM=majority` -> `ai.quorum = "majority"`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        for (var, key) in KEY_FALLBACKS {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_default(key, value)?;
            }
        }

        let config = builder
            .add_source(
                config::Environment::default()
                    .prefix(ENV_PREFIX)
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    ///
    /// The HTTP request timeout must cover the slowest possible pipeline run,
    /// otherwise a plan request would end in a timeout instead of a pipeline error.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.ai.validate()?;

        let pipeline = self.ai.worst_case_pipeline();
        if self.server.request_timeout() < pipeline {
            return Err(ValidationError::RequestTimeoutTooShort {
                request_secs: self.server.request_timeout_secs,
                pipeline_secs: pipeline.as_secs(),
            });
        }
        Ok(())
    }
}
