//! Intermediate and final text artifacts of the chained generator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::ValidationError;

/// Upper bound on plan suggestion length, counted in Unicode scalar values.
pub const MAX_SUGGESTION_CHARS: usize = 300;

/// Instruction text synthesized by the planning stage.
///
/// Never blank. Consumed by the generation stage and then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPrompt(String);

impl GeneratedPrompt {
    pub fn new(prompt: impl Into<String>) -> Result<Self, ValidationError> {
        let prompt = prompt.into().trim().to_string();
        if prompt.is_empty() {
            return Err(ValidationError::empty_field("prompt"));
        }
        Ok(Self(prompt))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// How the generator treats stage-2 output that breaks the length or markup contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTextPolicy {
    /// Trim and cut to [`MAX_SUGGESTION_CHARS`]; markup is passed through.
    #[default]
    Truncate,
    /// Reject overlong or marked-up text as malformed.
    Reject,
}

/// Reasons stage-2 output fails the plan text contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuggestionViolation {
    #[error("plan text is empty")]
    Empty,

    #[error("plan text has {chars} characters, limit is {max}")]
    TooLong { chars: usize, max: usize },

    #[error("plan text contains markup ({marker})")]
    Markup { marker: &'static str },
}

/// Final human-readable plan text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSuggestion(String);

impl PlanSuggestion {
    /// Applies the text policy to raw stage-2 output.
    ///
    /// Empty output is rejected under every policy.
    pub fn from_model_output(raw: &str, policy: PlanTextPolicy) -> Result<Self, SuggestionViolation> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(SuggestionViolation::Empty);
        }

        match policy {
            PlanTextPolicy::Truncate => {
                let cut: String = text.chars().take(MAX_SUGGESTION_CHARS).collect();
                Ok(Self(cut.trim_end().to_string()))
            }
            PlanTextPolicy::Reject => {
                let chars = text.chars().count();
                if chars > MAX_SUGGESTION_CHARS {
                    return Err(SuggestionViolation::TooLong {
                        chars,
                        max: MAX_SUGGESTION_CHARS,
                    });
                }
                if let Some(marker) = detect_markup(text) {
                    return Err(SuggestionViolation::Markup { marker });
                }
                Ok(Self(text.to_string()))
            }
        }
    }

    /// Rehydrates stored plan text without re-applying the policy.
    pub fn from_stored(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

/// Returns a short label for the first Markdown or HTML construct found.
fn detect_markup(text: &str) -> Option<&'static str> {
    if text.contains("```") {
        return Some("code fence");
    }
    if text.contains("**") || text.contains("__") {
        return Some("emphasis");
    }
    if text.contains("](") {
        return Some("link");
    }

    for line in text.lines() {
        let line = line.trim_start();
        if line.starts_with('#') {
            return Some("heading");
        }
        if line.starts_with("- ") || line.starts_with("* ") || line.starts_with("+ ") {
            return Some("list item");
        }
        if line.starts_with('>') {
            return Some("blockquote");
        }
    }

    if contains_html_tag(text) {
        return Some("html tag");
    }
    None
}

fn contains_html_tag(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.iter().enumerate().any(|(i, &b)| {
        if b != b'<' {
            return false;
        }
        let rest = &bytes[i + 1..];
        let opens_tag = match rest.first() {
            Some(b'/') => rest.get(1).is_some_and(u8::is_ascii_alphabetic),
            Some(c) => c.is_ascii_alphabetic(),
            None => false,
        };
        opens_tag && rest.contains(&b'>')
    })
}
