//! Budget estimates from individual models and their consensus envelope.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Reasons a single model's budget figures are unusable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BudgetViolation {
    #[error("{field} is not a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} is negative ({value})")]
    Negative { field: &'static str, value: f64 },

    #[error("min_budget {min} exceeds max_budget {max}")]
    Inverted { min: f64, max: f64 },
}

/// One model's budget range, in the configured currency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetEstimate {
    min_budget: f64,
    max_budget: f64,
}

impl BudgetEstimate {
    /// Validates a range: both ends finite and non-negative, `min <= max`.
    pub fn new(min_budget: f64, max_budget: f64) -> Result<Self, BudgetViolation> {
        check_amount("min_budget", min_budget)?;
        check_amount("max_budget", max_budget)?;
        if min_budget > max_budget {
            return Err(BudgetViolation::Inverted {
                min: min_budget,
                max: max_budget,
            });
        }
        Ok(Self {
            min_budget,
            max_budget,
        })
    }

    pub fn min_budget(&self) -> f64 {
        self.min_budget
    }

    pub fn max_budget(&self) -> f64 {
        self.max_budget
    }
}

fn check_amount(field: &'static str, value: f64) -> Result<(), BudgetViolation> {
    if !value.is_finite() {
        return Err(BudgetViolation::NotFinite { field });
    }
    if value < 0.0 {
        return Err(BudgetViolation::Negative { field, value });
    }
    Ok(())
}

/// Widest range spanned by a set of estimates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsensusBudget {
    min_budget: f64,
    max_budget: f64,
}

impl ConsensusBudget {
    /// Minimum of the minima and maximum of the maxima.
    ///
    /// Returns `None` for an empty set. Input order does not affect the result.
    pub fn envelope(estimates: &[BudgetEstimate]) -> Option<Self> {
        let (first, rest) = estimates.split_first()?;
        let (min_budget, max_budget) = rest.iter().fold(
            (first.min_budget, first.max_budget),
            |(lo, hi), e| (lo.min(e.min_budget), hi.max(e.max_budget)),
        );
        Some(Self {
            min_budget,
            max_budget,
        })
    }

    /// Rehydrates a stored consensus without recomputing it.
    pub fn from_stored(min_budget: f64, max_budget: f64) -> Self {
        Self {
            min_budget,
            max_budget,
        }
    }

    pub fn min_budget(&self) -> f64 {
        self.min_budget
    }

    pub fn max_budget(&self) -> f64 {
        self.max_budget
    }
}

/// How many ensemble members must succeed before an envelope is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuorumPolicy {
    /// Every member must succeed; the first failure is reported.
    #[default]
    All,
    /// Strictly more than half of the members.
    Majority,
    /// At least this many members.
    AtLeast(usize),
}

impl QuorumPolicy {
    /// Number of successes required out of `total` members.
    pub fn required(&self, total: usize) -> usize {
        match self {
            Self::All => total,
            Self::Majority => total / 2 + 1,
            Self::AtLeast(n) => *n,
        }
    }
}

impl fmt::Display for QuorumPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Majority => write!(f, "majority"),
            Self::AtLeast(n) => write!(f, "{}", n),
        }
    }
}

impl FromStr for QuorumPolicy {
    type Err = String;

    /// Accepts `all`, `majority`, or a positive integer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "majority" => Ok(Self::Majority),
            other => match other.parse::<usize>() {
                Ok(0) => Err("quorum must be at least 1".to_string()),
                Ok(n) => Ok(Self::AtLeast(n)),
                Err(_) => Err(format!(
                    "unknown quorum '{}', expected all, majority, or a count",
                    s
                )),
            },
        }
    }
}
