//! HTTP listener settings for the plan API.

use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

use super::error::ValidationError;

/// Upper bound for the per-request timeout, in seconds.
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 900;

/// Listener, logging, and request-handling settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Selects the log format; production logs are JSON.
    #[serde(default)]
    pub environment: Environment,

    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Covers a whole `POST /api/plans`, so it must outlast the pipeline.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Comma-separated allowed origins; unset means any origin.
    pub cors_origins: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Which browser origins may call the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    AnyOrigin,
    AllowList(Vec<String>),
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ValidationError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| ValidationError::InvalidSocketAddr(addr))
    }

    pub fn log_format(&self) -> LogFormat {
        match self.environment {
            Environment::Production => LogFormat::Json,
            Environment::Development => LogFormat::Pretty,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Blank entries are skipped; no entries at all means any origin.
    pub fn cors_policy(&self) -> CorsPolicy {
        let origins: Vec<String> = self
            .cors_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() {
            CorsPolicy::AnyOrigin
        } else {
            CorsPolicy::AllowList(origins)
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS {
            return Err(ValidationError::InvalidTimeout);
        }
        if let CorsPolicy::AllowList(origins) = self.cors_policy() {
            if let Some(bad) = origins
                .into_iter()
                .find(|o| !(o.starts_with("http://") || o.starts_with("https://")))
            {
                return Err(ValidationError::InvalidCorsOrigin(bad));
            }
        }
        self.socket_addr()?;
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: Environment::default(),
            log_level: default_log_level(),
            request_timeout_secs: default_request_timeout(),
            cors_origins: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info,tour_planner=debug".to_string()
}

/// Two sequential chain calls plus the ensemble, at the default 60s each, with headroom.
fn default_request_timeout() -> u64 {
    240
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_listen_on_3000_with_pretty_logs() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:3000");
        assert_eq!(config.log_format(), LogFormat::Pretty);
        assert_eq!(config.request_timeout(), Duration::from_secs(240));
        assert_eq!(config.cors_policy(), CorsPolicy::AnyOrigin);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn production_logs_as_json() {
        let config = ServerConfig {
            environment: Environment::Production,
            ..Default::default()
        };
        assert_eq!(config.log_format(), LogFormat::Json);
    }

    #[test]
    fn hostname_is_not_a_socket_addr() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidSocketAddr(_))
        ));
    }

    #[test]
    fn cors_origins_become_an_allow_list() {
        let config = ServerConfig {
            cors_origins: Some("http://localhost:5173, https://plans.example.com,".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.cors_policy(),
            CorsPolicy::AllowList(vec![
                "http://localhost:5173".to_string(),
                "https://plans.example.com".to_string(),
            ])
        );
    }

    #[test]
    fn blank_cors_origins_allow_any() {
        let config = ServerConfig {
            cors_origins: Some(" , ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.cors_policy(), CorsPolicy::AnyOrigin);
    }

    #[test]
    fn cors_origin_without_scheme_is_rejected() {
        let config = ServerConfig {
            cors_origins: Some("localhost:5173".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidCorsOrigin("localhost:5173".to_string()))
        );
    }

    #[test]
    fn port_and_timeout_bounds() {
        let zero_port = ServerConfig {
            port: 0,
            ..Default::default()
        };
        assert_eq!(zero_port.validate(), Err(ValidationError::InvalidPort));

        for secs in [0, MAX_REQUEST_TIMEOUT_SECS + 1] {
            let config = ServerConfig {
                request_timeout_secs: secs,
                ..Default::default()
            };
            assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
        }
    }
}
