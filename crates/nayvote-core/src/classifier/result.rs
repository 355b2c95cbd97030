//! Tiers, per-text classification results, and detection outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Rule tiers, in the order the cascade evaluates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Direct vote instructions; bypasses the negative tier.
    Override,
    /// Veto patterns that force a non-match.
    Negative,
    /// Titles made only of dots or dashes.
    Placeholder,
    /// High confidence rejection requests.
    Strong,
    /// Cancellations and wrong-submission notices.
    Medium,
    /// Patterns only evaluated against proposal content.
    Content,
    /// Keywords that need a co-occurring context phrase.
    Contextual,
    /// Bare keyword tally.
    SimpleKeyword,
}

impl Tier {
    /// Returns all tiers in evaluation order.
    pub fn all() -> &'static [Tier] {
        &[
            Tier::Override,
            Tier::Negative,
            Tier::Placeholder,
            Tier::Strong,
            Tier::Medium,
            Tier::Content,
            Tier::Contextual,
            Tier::SimpleKeyword,
        ]
    }

    /// Returns a human-readable name for this tier.
    pub fn name(&self) -> &'static str {
        match self {
            Tier::Override => "override",
            Tier::Negative => "negative",
            Tier::Placeholder => "placeholder",
            Tier::Strong => "strong",
            Tier::Medium => "medium",
            Tier::Content => "content",
            Tier::Contextual => "contextual",
            Tier::SimpleKeyword => "simple keyword",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of running the cascade over a single text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Whether the text reads as a nay request.
    pub is_match: bool,
    /// Tier-determined confidence (0.0 to 0.95).
    pub confidence: f32,
    /// Which rule decided the result.
    pub explanation: String,
    /// The tier that decided, if any did.
    pub tier: Option<Tier>,
}

impl ClassificationResult {
    /// Creates a positive result decided by `tier`.
    pub fn matched(tier: Tier, confidence: f32, explanation: impl Into<String>) -> Self {
        Self {
            is_match: true,
            confidence: confidence.clamp(0.0, 0.95),
            explanation: explanation.into(),
            tier: Some(tier),
        }
    }

    /// Creates a non-match forced by a negative pattern.
    pub fn vetoed(pattern: &str) -> Self {
        Self {
            is_match: false,
            confidence: 0.0,
            explanation: format!("Negative pattern matched: {}", pattern),
            tier: Some(Tier::Negative),
        }
    }

    /// Result for text that carries no evidence.
    pub fn empty_input() -> Self {
        Self::unmatched("Empty or invalid text")
    }

    /// Result when every tier passed.
    pub fn no_match() -> Self {
        Self::unmatched("No pattern matched")
    }

    /// Placeholder for content that was never supplied.
    pub fn absent() -> Self {
        Self::unmatched("")
    }

    fn unmatched(explanation: &str) -> Self {
        Self {
            is_match: false,
            confidence: 0.0,
            explanation: explanation.to_string(),
            tier: None,
        }
    }
}

/// A title and optional body to run through the detector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionInput {
    pub title: String,
    pub content: Option<String>,
}

impl DetectionInput {
    /// Creates an input with both title and content.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: Some(content.into()),
        }
    }

    /// Creates an input with no content.
    pub fn title_only(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: None,
        }
    }
}

/// Final verdict for one referendum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionOutcome {
    /// Whether the referendum asks to be voted down.
    pub is_nay_request: bool,
    /// Heuristic strength of the verdict (0.0 to 0.95).
    pub confidence: f32,
    /// Human-readable reason.
    pub explanation: String,
}

impl DetectionOutcome {
    /// Creates a positive outcome.
    pub fn nay(confidence: f32, explanation: impl Into<String>) -> Self {
        Self {
            is_nay_request: true,
            confidence: confidence.clamp(0.0, 0.95),
            explanation: explanation.into(),
        }
    }

    /// The outcome when nothing points at a nay request.
    ///
    /// Carries high confidence: it asserts absence, it is not a weak guess.
    pub fn not_nay() -> Self {
        Self {
            is_nay_request: false,
            confidence: 0.9,
            explanation: "No indicators of a 'nay' vote request found".to_string(),
        }
    }
}

impl From<ClassificationResult> for DetectionOutcome {
    fn from(result: ClassificationResult) -> Self {
        Self {
            is_nay_request: result.is_match,
            confidence: result.confidence,
            explanation: result.explanation,
        }
    }
}
