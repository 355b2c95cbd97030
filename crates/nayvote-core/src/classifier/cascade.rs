//! Pattern cascade: one text, eight tiers, first decisive tier wins.
//!
//! Tier order is fixed by [`EVALUATION_ORDER`]:
//!
//! 1. Override - direct vote instructions, checked before the veto
//! 2. Negative - a match forces a non-match
//! 3. Placeholder - dots or dashes only
//! 4. Strong (0.95), 5. Medium (0.85), 6. Content (0.9, content only)
//! 7. Contextual keyword pairs (0.7 / 0.6)
//! 8. Simple keyword tally (0.55)

use tracing::debug;

use super::patterns::{PatternTier, RuleTables};
use super::{ClassificationResult, Tier};
use crate::error::Result;
use crate::normalize;

/// Evaluation order of the tiers. Must never change.
pub const EVALUATION_ORDER: [Tier; 8] = [
    Tier::Override,
    Tier::Negative,
    Tier::Placeholder,
    Tier::Strong,
    Tier::Medium,
    Tier::Content,
    Tier::Contextual,
    Tier::SimpleKeyword,
];

/// Confidence when two or more contextual pairs are satisfied.
pub const MULTIPLE_CONTEXTUAL_CONFIDENCE: f32 = 0.7;
/// Confidence when exactly one contextual pair is satisfied.
pub const SINGLE_CONTEXTUAL_CONFIDENCE: f32 = 0.6;
/// Confidence for two or more distinct bare keywords.
pub const SIMPLE_KEYWORD_CONFIDENCE: f32 = 0.55;

/// Text handed to each tier evaluator.
struct TierInput<'a> {
    text: &'a str,
    lowered: &'a str,
    is_content: bool,
}

/// Regex cascade over a single text.
///
/// Immutable once built; share it freely across threads.
#[derive(Debug, Clone)]
pub struct PatternCascade {
    rules: RuleTables,
}

impl PatternCascade {
    /// Compiles the rule tables. Fails fast on an invalid expression.
    pub fn new() -> Result<Self> {
        Ok(Self {
            rules: RuleTables::build()?,
        })
    }

    /// Returns the compiled rule tables.
    pub fn rules(&self) -> &RuleTables {
        &self.rules
    }

    /// Classifies `text`. `is_content` enables the content-only tier.
    pub fn check_text(&self, text: &str, is_content: bool) -> ClassificationResult {
        let text = normalize::normalize(Some(text));
        if text.is_empty() {
            return ClassificationResult::empty_input();
        }

        let lowered = text.to_lowercase();
        let input = TierInput {
            text,
            lowered: &lowered,
            is_content,
        };

        for tier in EVALUATION_ORDER {
            if let Some(result) = self.evaluate(tier, &input) {
                debug!(tier = %tier, is_match = result.is_match, "cascade decided");
                return result;
            }
        }

        ClassificationResult::no_match()
    }

    fn evaluate(&self, tier: Tier, input: &TierInput<'_>) -> Option<ClassificationResult> {
        match tier {
            Tier::Override => self.check_override(input.text),
            Tier::Negative => self.check_negative(input.text),
            Tier::Placeholder => self.check_placeholder(input.text),
            Tier::Strong => Self::check_indicator(&self.rules.strong, "Strong", input.text),
            Tier::Medium => Self::check_indicator(&self.rules.medium, "Medium", input.text),
            Tier::Content if input.is_content => {
                Self::check_indicator(&self.rules.content, "Content", input.text)
            }
            Tier::Content => None,
            Tier::Contextual => self.check_contextual(input.lowered),
            Tier::SimpleKeyword => self.check_simple_keywords(input.lowered),
        }
    }

    fn check_override(&self, text: &str) -> Option<ClassificationResult> {
        let tier = &self.rules.overrides;
        let (rule, m) = tier.first_match(text)?;
        let explanation = rule
            .explanation()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Override indicator: '{}'", m.as_str()));
        Some(ClassificationResult::matched(
            Tier::Override,
            tier.confidence(),
            explanation,
        ))
    }

    fn check_negative(&self, text: &str) -> Option<ClassificationResult> {
        self.rules
            .negatives
            .iter()
            .find(|rule| rule.vetoes(text))
            .map(|rule| ClassificationResult::vetoed(rule.pattern()))
    }

    fn check_placeholder(&self, text: &str) -> Option<ClassificationResult> {
        let tier = &self.rules.placeholder;
        tier.first_match(text)?;
        Some(ClassificationResult::matched(
            Tier::Placeholder,
            tier.confidence(),
            format!("Empty/placeholder referendum: '{}'", text),
        ))
    }

    fn check_indicator(
        tier: &PatternTier,
        label: &str,
        text: &str,
    ) -> Option<ClassificationResult> {
        let (_, m) = tier.first_match(text)?;
        Some(ClassificationResult::matched(
            tier.tier(),
            tier.confidence(),
            format!("{} indicator: '{}'", label, m.as_str()),
        ))
    }

    fn check_contextual(&self, lowered: &str) -> Option<ClassificationResult> {
        let satisfied: Vec<&str> = self
            .rules
            .context_pairs
            .iter()
            .filter(|pair| pair.is_satisfied(lowered))
            .map(|pair| pair.keyword())
            .collect();

        match satisfied.as_slice() {
            [] => None,
            [keyword] => Some(ClassificationResult::matched(
                Tier::Contextual,
                SINGLE_CONTEXTUAL_CONFIDENCE,
                format!("Weak indicator with context: '{}'", keyword),
            )),
            keywords => Some(ClassificationResult::matched(
                Tier::Contextual,
                MULTIPLE_CONTEXTUAL_CONFIDENCE,
                format!(
                    "Multiple weak indicators with context: {}",
                    keywords.join(", ")
                ),
            )),
        }
    }

    fn check_simple_keywords(&self, lowered: &str) -> Option<ClassificationResult> {
        let present: Vec<&str> = self
            .rules
            .simple_keywords
            .iter()
            .filter(|keyword| keyword.is_present(lowered))
            .map(|keyword| keyword.word())
            .collect();

        if present.len() < 2 {
            return None;
        }

        Some(ClassificationResult::matched(
            Tier::SimpleKeyword,
            SIMPLE_KEYWORD_CONFIDENCE,
            format!(
                "Multiple weak indicators without context: {}",
                present.join(", ")
            ),
        ))
    }
}
