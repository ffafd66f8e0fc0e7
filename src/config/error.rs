//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid socket address: {0}")]
    InvalidSocketAddr(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid {0} URL format")]
    InvalidUrl(&'static str),

    #[error("Unknown model provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid ensemble member: {0}")]
    InvalidEnsembleMember(String),

    #[error("Budget ensemble has no members")]
    EmptyEnsemble,

    #[error("Invalid quorum: {0}")]
    InvalidQuorum(String),

    #[error("Quorum requires {required} members but only {members} are configured")]
    QuorumExceedsMembers { required: usize, members: usize },

    #[error("Currency must be a three-letter code")]
    InvalidCurrency,

    #[error("Invalid CORS origin: {0}")]
    InvalidCorsOrigin(String),

    #[error("max_retries may be at most {max}")]
    TooManyRetries { max: u32 },

    #[error("Request timeout of {request_secs}s is shorter than the {pipeline_secs}s a plan may take")]
    RequestTimeoutTooShort { request_secs: u64, pipeline_secs: u64 },
}
