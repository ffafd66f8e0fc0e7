//! Model provider and pipeline configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use crate::domain::planning::{PlanTextPolicy, QuorumPolicy};
use crate::ports::{ModelRef, ProviderId};

use super::error::ValidationError;

/// Providers the service knows how to construct.
pub const KNOWN_PROVIDERS: [&str; 2] = [ProviderId::GEMINI, ProviderId::GROQ];

/// Model provider and pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Gemini API key
    pub gemini_api_key: Option<Secret<String>>,

    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,

    /// Groq API key
    pub groq_api_key: Option<Secret<String>>,

    #[serde(default = "default_groq_base_url")]
    pub groq_base_url: String,

    /// Provider serving both chained-generation stages
    #[serde(default = "default_chain_provider")]
    pub chain_provider: String,

    /// Stage-1 model (prompt synthesis)
    #[serde(default = "default_planning_model")]
    pub planning_model: String,

    /// Stage-2 model (plan text)
    #[serde(default = "default_generation_model")]
    pub generation_model: String,

    /// Budget ensemble as comma-separated `provider:model` entries
    #[serde(default = "default_ensemble_models")]
    pub ensemble_models: String,

    /// Currency the ensemble is asked to estimate in
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Adapter retries on transient failures
    #[serde(default)]
    pub max_retries: u32,

    /// Optional bound on each ensemble member call, in seconds
    pub member_timeout_secs: Option<u64>,

    /// `all`, `majority`, or a minimum member count
    #[serde(default = "default_quorum")]
    pub quorum: String,

    #[serde(default)]
    pub plan_text_policy: PlanTextPolicy,
}

/// Upper bound for adapter retries; backoff doubles per attempt.
pub const MAX_RETRIES: u32 = 5;

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn member_timeout(&self) -> Option<Duration> {
        self.member_timeout_secs.map(Duration::from_secs)
    }

    /// Check if Gemini is configured
    pub fn has_gemini(&self) -> bool {
        has_key(&self.gemini_api_key)
    }

    /// Check if Groq is configured
    pub fn has_groq(&self) -> bool {
        has_key(&self.groq_api_key)
    }

    pub fn chain_provider_id(&self) -> ProviderId {
        ProviderId::new(&self.chain_provider)
    }

    /// Parsed ensemble members, in configured order
    pub fn ensemble_members(&self) -> Result<Vec<ModelRef>, ValidationError> {
        let members =
            ModelRef::parse_list(&self.ensemble_models).map_err(ValidationError::InvalidEnsembleMember)?;
        if members.is_empty() {
            return Err(ValidationError::EmptyEnsemble);
        }
        Ok(members)
    }

    /// Longest a single provider call may take, retries and backoff included.
    pub fn worst_case_call(&self) -> Duration {
        let attempts = u64::from(self.max_retries) + 1;
        let backoff_secs = 2u64.saturating_pow(self.max_retries).saturating_sub(1);
        Duration::from_secs(self.timeout_secs.saturating_mul(attempts).saturating_add(backoff_secs))
    }

    /// Longest a pipeline run may take: two sequential chain calls, then the
    /// ensemble, whose members run concurrently.
    pub fn worst_case_pipeline(&self) -> Duration {
        let call = self.worst_case_call();
        let member = self.member_timeout().map_or(call, |limit| limit.min(call));
        call * 2 + member
    }

    pub fn quorum_policy(&self) -> Result<QuorumPolicy, ValidationError> {
        self.quorum.parse().map_err(ValidationError::InvalidQuorum)
    }

    /// Validate AI configuration
    ///
    /// Every provider referenced by the chain or the ensemble must be known
    /// and have an API key.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let members = self.ensemble_members()?;

        let referenced = std::iter::once(self.chain_provider_id())
            .chain(members.iter().map(|m| m.provider.clone()));
        for provider in referenced {
            self.check_provider(&provider)?;
        }

        if self.planning_model.trim().is_empty() {
            return Err(ValidationError::MissingRequired("AI__PLANNING_MODEL"));
        }
        if self.generation_model.trim().is_empty() {
            return Err(ValidationError::MissingRequired("AI__GENERATION_MODEL"));
        }

        let required = self.quorum_policy()?.required(members.len());
        if required > members.len() {
            return Err(ValidationError::QuorumExceedsMembers {
                required,
                members: members.len(),
            });
        }

        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::InvalidCurrency);
        }
        if self.timeout_secs == 0 || self.timeout_secs > 300 || self.member_timeout_secs == Some(0) {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.max_retries > MAX_RETRIES {
            return Err(ValidationError::TooManyRetries { max: MAX_RETRIES });
        }
        if !is_http_url(&self.gemini_base_url) {
            return Err(ValidationError::InvalidUrl("Gemini"));
        }
        if !is_http_url(&self.groq_base_url) {
            return Err(ValidationError::InvalidUrl("Groq"));
        }

        Ok(())
    }

    fn check_provider(&self, provider: &ProviderId) -> Result<(), ValidationError> {
        match provider.as_str() {
            ProviderId::GEMINI if !self.has_gemini() => {
                Err(ValidationError::MissingRequired("GEMINI_API_KEY"))
            }
            ProviderId::GROQ if !self.has_groq() => {
                Err(ValidationError::MissingRequired("GROQ_API_KEY"))
            }
            name if KNOWN_PROVIDERS.contains(&name) => Ok(()),
            name => Err(ValidationError::UnknownProvider(name.to_string())),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_base_url: default_gemini_base_url(),
            groq_api_key: None,
            groq_base_url: default_groq_base_url(),
            chain_provider: default_chain_provider(),
            planning_model: default_planning_model(),
            generation_model: default_generation_model(),
            ensemble_models: default_ensemble_models(),
            currency: default_currency(),
            timeout_secs: default_timeout(),
            max_retries: 0,
            member_timeout_secs: None,
            quorum: default_quorum(),
            plan_text_policy: PlanTextPolicy::default(),
        }
    }
}

fn has_key(key: &Option<Secret<String>>) -> bool {
    key.as_ref().is_some_and(|k| !k.expose_secret().trim().is_empty())
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_groq_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_chain_provider() -> String {
    ProviderId::GEMINI.to_string()
}

fn default_planning_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_generation_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

fn default_ensemble_models() -> String {
    [
        "groq:moonshotai/kimi-k2-instruct-0905",
        "groq:openai/gpt-oss-120b",
        "groq:meta-llama/llama-4-maverick-17b-128e-instruct",
    ]
    .join(",")
}

fn default_currency() -> String {
    "KRW".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_quorum() -> String {
    "all".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> AiConfig {
        AiConfig {
            gemini_api_key: Some(Secret::new("gm-key".to_string())),
            groq_api_key: Some(Secret::new("gsk-key".to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn test_ai_config_defaults() {
        let config = AiConfig::default();
        assert_eq!(config.chain_provider_id(), ProviderId::gemini());
        assert_eq!(config.planning_model, "gemini-2.5-flash");
        assert_eq!(config.generation_model, "gemini-2.5-flash-lite");
        assert_eq!(config.currency, "KRW");
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.member_timeout(), None);
        assert_eq!(config.plan_text_policy, PlanTextPolicy::Truncate);
    }

    #[test]
    fn test_default_ensemble_has_three_groq_members() {
        let members = AiConfig::default().ensemble_members().unwrap();
        assert_eq!(members.len(), 3);
        assert!(members.iter().all(|m| m.provider == ProviderId::groq()));
        assert_eq!(members[0].model, "moonshotai/kimi-k2-instruct-0905");
    }

    #[test]
    fn test_timeout_duration() {
        let config = AiConfig {
            timeout_secs: 30,
            member_timeout_secs: Some(10),
            ..Default::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.member_timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = AiConfig {
            gemini_api_key: Some(Secret::new("  ".to_string())),
            ..Default::default()
        };
        assert!(!config.has_gemini());
    }

    #[test]
    fn test_validation_valid_config() {
        assert_eq!(configured().validate(), Ok(()));
    }

    #[test]
    fn test_validation_missing_gemini_key() {
        let config = AiConfig {
            gemini_api_key: None,
            ..configured()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("GEMINI_API_KEY"))
        );
    }

    #[test]
    fn test_validation_missing_groq_key() {
        let config = AiConfig {
            groq_api_key: None,
            ..configured()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("GROQ_API_KEY"))
        );
    }

    #[test]
    fn test_groq_key_not_needed_without_groq_members() {
        let config = AiConfig {
            groq_api_key: None,
            ensemble_models: "gemini:gemini-2.5-flash".to_string(),
            ..configured()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_validation_empty_ensemble() {
        let config = AiConfig {
            ensemble_models: " , ".to_string(),
            ..configured()
        };
        assert_eq!(config.validate(), Err(ValidationError::EmptyEnsemble));
    }

    #[test]
    fn test_validation_malformed_member() {
        let config = AiConfig {
            ensemble_models: "groq:a,kimi".to_string(),
            ..configured()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidEnsembleMember(_))
        ));
    }

    #[test]
    fn test_validation_unknown_provider() {
        let config = AiConfig {
            ensemble_models: "openrouter:some-model".to_string(),
            ..configured()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::UnknownProvider("openrouter".to_string()))
        );
    }

    #[test]
    fn test_validation_quorum() {
        let config = AiConfig {
            quorum: "majority".to_string(),
            ..configured()
        };
        assert_eq!(config.quorum_policy(), Ok(QuorumPolicy::Majority));
        assert_eq!(config.validate(), Ok(()));

        let config = AiConfig {
            quorum: "4".to_string(),
            ..configured()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::QuorumExceedsMembers {
                required: 4,
                members: 3
            })
        );

        let config = AiConfig {
            quorum: "most".to_string(),
            ..configured()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidQuorum(_))));
    }

    #[test]
    fn test_validation_retry_bound() {
        let config = AiConfig {
            max_retries: MAX_RETRIES,
            ..configured()
        };
        assert_eq!(config.validate(), Ok(()));

        let config = AiConfig {
            max_retries: 64,
            ..configured()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::TooManyRetries { max: MAX_RETRIES })
        );
    }

    #[test]
    fn test_worst_case_durations() {
        let config = AiConfig::default();
        assert_eq!(config.worst_case_call(), Duration::from_secs(60));
        assert_eq!(config.worst_case_pipeline(), Duration::from_secs(180));

        // 3 attempts of 10s plus 1s + 2s of backoff
        let config = AiConfig {
            timeout_secs: 10,
            max_retries: 2,
            member_timeout_secs: Some(5),
            ..Default::default()
        };
        assert_eq!(config.worst_case_call(), Duration::from_secs(33));
        assert_eq!(config.worst_case_pipeline(), Duration::from_secs(71));
    }

    #[test]
    fn test_validation_currency_and_urls() {
        let config = AiConfig {
            currency: "won".to_string(),
            ..configured()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidCurrency));

        let config = AiConfig {
            groq_base_url: "api.groq.com".to_string(),
            ..configured()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidUrl("Groq")));
    }

    #[test]
    fn test_validation_zero_member_timeout() {
        let config = AiConfig {
            member_timeout_secs: Some(0),
            ..configured()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
    }

    #[test]
    fn test_debug_output_redacts_keys() {
        let rendered = format!("{:?}", configured());
        assert!(!rendered.contains("gm-key"));
        assert!(!rendered.contains("gsk-key"));
    }
}
