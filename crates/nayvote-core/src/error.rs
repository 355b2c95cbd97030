//! Rule table error types.

use thiserror::Error;

use crate::classifier::Tier;

/// Errors raised while compiling the rule tables.
///
/// These only occur at construction time; a built cascade never fails.
#[derive(Debug, Error)]
pub enum PatternError {
    /// A single rule expression failed to compile.
    #[error("invalid {tier} pattern `{pattern}`: {source}")]
    InvalidPattern {
        tier: Tier,
        pattern: String,
        source: regex::Error,
    },

    /// The combined regex set for a tier failed to compile.
    #[error("invalid {tier} pattern set: {source}")]
    InvalidPatternSet { tier: Tier, source: regex::Error },
}

impl PatternError {
    /// Returns the tier whose table failed to compile.
    pub fn tier(&self) -> Tier {
        match self {
            PatternError::InvalidPattern { tier, .. } => *tier,
            PatternError::InvalidPatternSet { tier, .. } => *tier,
        }
    }
}

/// Result type for rule table construction.
pub type Result<T> = std::result::Result<T, PatternError>;
