//! Nay-request detector.
//!
//! Combines a title judgment and a content judgment into one outcome:
//!
//! 1. Fast paths on the raw inputs (literal `NAY`, direct vote instruction in
//!    the title, cancelled title). These bypass the negative tier.
//! 2. Title cascade; short-circuit on confidence >= 0.85
//! 3. Content cascade; accept on confidence >= 0.7
//! 4. Weaker evidence from both sides is combined, capped at 0.9

use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, trace};

use super::{ClassificationResult, DetectionInput, DetectionOutcome, PatternCascade, Tier};
use crate::error::{PatternError, Result};
use crate::normalize;

/// Title confidence at which the content is not consulted.
pub const TITLE_SHORT_CIRCUIT_THRESHOLD: f32 = 0.85;
/// Content confidence that decides on its own.
pub const CONTENT_ACCEPT_THRESHOLD: f32 = 0.7;
/// Boost applied when title and content both weakly match.
pub const COMBINED_EVIDENCE_BOOST: f32 = 0.1;
/// Upper bound for combined evidence.
pub const COMBINED_EVIDENCE_CAP: f32 = 0.9;

/// Detects referenda whose text asks to be voted down.
///
/// Holds only compiled, read-only tables, so one detector can serve any
/// number of threads.
#[derive(Debug, Clone)]
pub struct NayDetector {
    cascade: PatternCascade,
    /// Direct instructions checked on the title before the cascade.
    direct_instructions: Vec<Regex>,
}

impl NayDetector {
    /// Creates a detector with the built-in rule tables.
    pub fn new() -> Result<Self> {
        Self::with_cascade(PatternCascade::new()?)
    }

    /// Creates a detector around an already-built cascade.
    pub fn with_cascade(cascade: PatternCascade) -> Result<Self> {
        let direct_instructions = [r"(?i)vote\s*nay", r"(?i)change.*vote.*nay"]
            .into_iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| PatternError::InvalidPattern {
                    tier: Tier::Override,
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            cascade,
            direct_instructions,
        })
    }

    /// Returns the underlying cascade.
    pub fn cascade(&self) -> &PatternCascade {
        &self.cascade
    }

    /// Decides whether `title`/`content` request a nay vote.
    pub fn detect(&self, title: &str, content: &str) -> DetectionOutcome {
        self.detect_parts(Some(title), Some(content))
    }

    /// Runs [`detect`](Self::detect) on a [`DetectionInput`].
    pub fn detect_input(&self, input: &DetectionInput) -> DetectionOutcome {
        self.detect_parts(Some(input.title.as_str()), input.content.as_deref())
    }

    /// Detects a batch in parallel. Output order matches input order.
    pub fn detect_batch(&self, inputs: &[DetectionInput]) -> Vec<DetectionOutcome> {
        inputs
            .par_iter()
            .map(|input| self.detect_input(input))
            .collect()
    }

    fn detect_parts(&self, title: Option<&str>, content: Option<&str>) -> DetectionOutcome {
        let title = normalize::normalize(title);
        let content = normalize::normalize(content);
        trace!(title_len = title.len(), content_len = content.len(), "detect");

        if let Some(outcome) = self.fast_path(title, content) {
            debug!(explanation = %outcome.explanation, "fast path matched");
            return outcome;
        }

        let title_result = self.cascade.check_text(title, false);
        if title_result.is_match && title_result.confidence >= TITLE_SHORT_CIRCUIT_THRESHOLD {
            return title_result.into();
        }

        let content_result = if normalize::is_blank(content) {
            ClassificationResult::absent()
        } else {
            self.cascade.check_text(content, true)
        };
        if content_result.is_match && content_result.confidence >= CONTENT_ACCEPT_THRESHOLD {
            return content_result.into();
        }

        Self::resolve(title_result, content_result)
    }

    /// Checks that run on the raw inputs, ahead of the negative tier.
    fn fast_path(&self, title: &str, content: &str) -> Option<DetectionOutcome> {
        // Case-sensitive: shouted NAY, not the lower-case word
        if title.contains("NAY") || content.contains("NAY") {
            return Some(DetectionOutcome::nay(0.95, "Contains capitalized 'NAY'"));
        }

        if self.direct_instructions.iter().any(|re| re.is_match(title)) {
            return Some(DetectionOutcome::nay(
                0.95,
                "Title contains direct vote nay instruction",
            ));
        }

        if title.to_lowercase().contains("cancelled") {
            return Some(DetectionOutcome::nay(
                0.9,
                format!("Cancelled proposal: '{}'", title),
            ));
        }

        None
    }

    /// Resolves two results that both fell below their thresholds.
    fn resolve(title: ClassificationResult, content: ClassificationResult) -> DetectionOutcome {
        match (title.is_match, content.is_match) {
            (true, true) => {
                let confidence = round_confidence(
                    (title.confidence.max(content.confidence) + COMBINED_EVIDENCE_BOOST)
                        .min(COMBINED_EVIDENCE_CAP),
                );
                DetectionOutcome::nay(
                    confidence,
                    format!(
                        "Combined evidence: {}; {}",
                        title.explanation, content.explanation
                    ),
                )
            }
            (true, false) => title.into(),
            _ => DetectionOutcome::not_nay(),
        }
    }
}

/// Rounds to two decimals so sums like 0.6 + 0.1 report as 0.7.
fn round_confidence(confidence: f32) -> f32 {
    (confidence * 100.0).round() / 100.0
}
