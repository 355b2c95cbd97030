//! Fixed rule tables for the pattern cascade.
//!
//! Every table is compiled once by [`RuleTables::build`]. Rules inside a
//! tier are ordered; the first rule that matches decides the tier.

use regex::{Match, Regex, RegexSet};

use super::Tier;
use crate::error::{PatternError, Result};

/// A single compiled rule expression.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pattern: &'static str,
    regex: Regex,
    /// Fixed explanation; tiers without one report the matched text.
    explanation: Option<&'static str>,
}

impl PatternRule {
    fn compile(tier: Tier, pattern: &'static str) -> Result<Self> {
        Ok(Self {
            pattern,
            regex: compile(tier, pattern)?,
            explanation: None,
        })
    }

    fn with_explanation(mut self, explanation: &'static str) -> Self {
        self.explanation = Some(explanation);
        self
    }

    /// Returns the source expression.
    pub fn pattern(&self) -> &'static str {
        self.pattern
    }

    /// Returns the fixed explanation, if the rule carries one.
    pub fn explanation(&self) -> Option<&'static str> {
        self.explanation
    }

    /// Returns the leftmost match in `text`.
    pub fn find<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        self.regex.find(text)
    }
}

/// An ordered group of rules sharing one confidence.
#[derive(Debug, Clone)]
pub struct PatternTier {
    tier: Tier,
    confidence: f32,
    /// Regex set for a fast "does anything match" check.
    regex_set: RegexSet,
    rules: Vec<PatternRule>,
}

impl PatternTier {
    fn build(tier: Tier, confidence: f32, rules: Vec<PatternRule>) -> Result<Self> {
        let regex_set = RegexSet::new(rules.iter().map(PatternRule::pattern))
            .map_err(|source| PatternError::InvalidPatternSet { tier, source })?;

        Ok(Self {
            tier,
            confidence,
            regex_set,
            rules,
        })
    }

    fn from_patterns(tier: Tier, confidence: f32, patterns: &[&'static str]) -> Result<Self> {
        let rules = patterns
            .iter()
            .map(|&p| PatternRule::compile(tier, p))
            .collect::<Result<Vec<_>>>()?;
        Self::build(tier, confidence, rules)
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Returns the first rule in list order that matches, with its match.
    pub fn first_match<'t>(&self, text: &'t str) -> Option<(&PatternRule, Match<'t>)> {
        // SetMatches iterates in ascending pattern index
        let index = self.regex_set.matches(text).into_iter().next()?;
        let rule = &self.rules[index];
        rule.find(text).map(|m| (rule, m))
    }
}

/// A veto rule.
///
/// With a trailing guard, the rule only vetoes when some match of its
/// expression is not followed by the guard on the rest of the text. This
/// reproduces a negative look-ahead, which `regex` does not support.
#[derive(Debug, Clone)]
pub struct NegativeRule {
    pattern: &'static str,
    regex: Regex,
    unless_followed_by: Option<Regex>,
}

impl NegativeRule {
    fn compile(pattern: &'static str) -> Result<Self> {
        Ok(Self {
            pattern,
            regex: compile(Tier::Negative, pattern)?,
            unless_followed_by: None,
        })
    }

    fn guarded(pattern: &'static str, guard: &'static str) -> Result<Self> {
        Ok(Self {
            pattern,
            regex: compile(Tier::Negative, pattern)?,
            unless_followed_by: Some(compile(Tier::Negative, guard)?),
        })
    }

    pub fn pattern(&self) -> &'static str {
        self.pattern
    }

    /// Returns true if this rule forces a non-match for `text`.
    pub fn vetoes(&self, text: &str) -> bool {
        let Some(guard) = &self.unless_followed_by else {
            return self.regex.is_match(text);
        };

        // Try every start position; leftmost-first gives the furthest end
        // for each start, which is the end most likely to clear the guard.
        let mut start = 0;
        while let Some(m) = self.regex.find_at(text, start) {
            if !guard.is_match(&text[m.end()..]) {
                return true;
            }
            start = m.start() + text[m.start()..].chars().next().map_or(1, char::len_utf8);
            if start > text.len() {
                break;
            }
        }
        false
    }
}

/// A keyword that only counts when its context phrase is also present.
#[derive(Debug, Clone)]
pub struct ContextPair {
    keyword: &'static str,
    keyword_regex: Regex,
    context_regex: Regex,
}

impl ContextPair {
    fn compile(
        keyword: &'static str,
        keyword_pattern: &'static str,
        context: &'static str,
    ) -> Result<Self> {
        Ok(Self {
            keyword,
            keyword_regex: compile(Tier::Contextual, keyword_pattern)?,
            context_regex: compile(Tier::Contextual, context)?,
        })
    }

    pub fn keyword(&self) -> &'static str {
        self.keyword
    }

    /// Both the keyword and its context must appear in the lower-cased text.
    pub fn is_satisfied(&self, lowered: &str) -> bool {
        self.keyword_regex.is_match(lowered) && self.context_regex.is_match(lowered)
    }
}

/// A bare whole-word keyword.
#[derive(Debug, Clone)]
pub struct SimpleKeyword {
    word: &'static str,
    regex: Regex,
}

impl SimpleKeyword {
    fn compile(word: &'static str) -> Result<Self> {
        let pattern = format!(r"\b{}\b", regex::escape(word));
        let regex = Regex::new(&pattern).map_err(|source| PatternError::InvalidPattern {
            tier: Tier::SimpleKeyword,
            pattern,
            source,
        })?;
        Ok(Self { word, regex })
    }

    pub fn word(&self) -> &'static str {
        self.word
    }

    pub fn is_present(&self, lowered: &str) -> bool {
        self.regex.is_match(lowered)
    }
}

/// All rule tables used by the cascade.
#[derive(Debug, Clone)]
pub struct RuleTables {
    pub overrides: PatternTier,
    pub negatives: Vec<NegativeRule>,
    pub placeholder: PatternTier,
    pub strong: PatternTier,
    pub medium: PatternTier,
    pub content: PatternTier,
    pub context_pairs: Vec<ContextPair>,
    pub simple_keywords: Vec<SimpleKeyword>,
}

impl RuleTables {
    /// Compiles every table. Fails if any expression is invalid.
    pub fn build() -> Result<Self> {
        Ok(Self {
            overrides: Self::build_override_tier()?,
            negatives: Self::build_negative_rules()?,
            placeholder: Self::build_placeholder_tier()?,
            strong: Self::build_strong_tier()?,
            medium: Self::build_medium_tier()?,
            content: Self::build_content_tier()?,
            context_pairs: Self::build_context_pairs()?,
            simple_keywords: Self::build_simple_keywords()?,
        })
    }

    fn build_override_tier() -> Result<PatternTier> {
        let rules = vec![
            PatternRule::compile(Tier::Override, r"(?i)vote\s*nay")?
                .with_explanation("Contains 'vote nay'"),
            PatternRule::compile(Tier::Override, r"(?i)change.*vote.*nay")?
                .with_explanation("Contains vote change instruction"),
            PatternRule::compile(Tier::Override, r"(?i)\bNAY\b")?
                .with_explanation("Contains capitalized NAY"),
        ];
        PatternTier::build(Tier::Override, 0.95, rules)
    }

    fn build_placeholder_tier() -> Result<PatternTier> {
        PatternTier::from_patterns(Tier::Placeholder, 0.95, &[r"^\s*[.-]{1,3}\s*$"])
    }

    fn build_negative_rules() -> Result<Vec<NegativeRule>> {
        const ANY_NAY_SIGNAL: &str = r"(?i)^.*(?:nay|vote|reject|change)";

        Ok(vec![
            NegativeRule::compile(r"(?i)don't\s+miss")?,
            NegativeRule::compile(r"(?i)no\s+need\s+to\s+vote\s+nay")?,
            NegativeRule::compile(r"(?i)\.dot\b")?,
            NegativeRule::compile(r"(?i)\breplace.{0,10}(curator|bounty)")?,
            NegativeRule::compile(r"(?i)(bond|deposit|spend).{0,20}(return|reimburs)")?,
            NegativeRule::compile(r"(?i)reject.{0,20}(malicious|attack|spam)")?,
            NegativeRule::compile(r"(?i)reject.{0,20}(if|should).{0,20}(you|community)")?,
            NegativeRule::compile(r"(?i)to\s+reject\s+invalid")?,
            NegativeRule::compile(r"(?i)ability\s+to\s+reject")?,
            NegativeRule::compile(r"(?i)option\s+to\s+reject")?,
            NegativeRule::compile(r"(?i)power\s+to\s+reject")?,
            NegativeRule::compile(r"(?i)right\s+to\s+reject")?,
            NegativeRule::compile(r"(?i)(can|may|might|could|should|would)\s+reject")?,
            NegativeRule::compile(r"(?i)(polkadot|kusama|substrate)\s+reject")?,
            NegativeRule::compile(r"(?i)reject\s+any\s+(invalid|malicious)")?,
            NegativeRule::compile(r"(?i)(validators|nominators|collators)\s+reject")?,
            NegativeRule::compile(r"(?i)reject\s+unauthorized")?,
            NegativeRule::compile(r"(?i)(treasury|council|fellowship)\s+reject")?,
            NegativeRule::compile(r"(?i)governance\s+can\s+reject")?,
            // Payment terms, unless a nay signal follows
            NegativeRule::guarded(r"(?i)(refund|reimbursement|retroactive)", ANY_NAY_SIGNAL)?,
            NegativeRule::guarded(
                r"(?i)(retry|resubmission|redux)",
                r"(?i)^.*(?:vote\s+nay|nay\s+this)",
            )?,
            NegativeRule::guarded(
                r"(?i)(bond|deposit|spend|motion).{0,20}(reject|return)",
                r"(?i)^.*(?:vote\s+nay|change.*vote)",
            )?,
            // Purpose descriptions ("funding for ...")
            NegativeRule::guarded(
                r"(?i)(maintenance|development|proposal|funding).{0,20}(for|of)",
                ANY_NAY_SIGNAL,
            )?,
        ])
    }

    fn build_strong_tier() -> Result<PatternTier> {
        let patterns = [
            r"(?i)reject\s+this\s+(referendum|proposal|motion)",
            r"(?i)please\s+reject\s+(this|the)",
            r"(?i)reject\s+.*referendum\s+#?\d+",
            r"(?i)reject\s+.*proposal\s+#?\d+",
            r"(?i)\bvote\s+nay\b",
            r"(?i)please\s+vote\s+nay\b",
            r"(?i)\bvote\s+no\b",
            r"(?i)do\s+not\s+vote\s+(for|on)",
            r"(?i)don't\s+vote\s+(for|on)",
            r"(?i)please\s+ignore\s+this",
            r"(?i)ignore\s+this\s+(referendum|proposal)",
            r"(?i)created\s+in\s+error",
            r"(?i)wrong\s+(preimage|submission|parameter|pre-image)",
            r"(?i)mistake\s+in\s+preimage",
            r"(?i)\bunnote\b",
            r"(?i)\bdo\s+not\s+place\s+decision\s+deposit\b",
            r"(?i)\b(please|do)\s+vote\s+(nay|no|against)\s+this\b",
            r"(?i)\ballow\s+it\s+(to\s+)?timeout\b",
            r"(?i)^\s*reject\s*$",
            r"(?i)^\s*(\.|-){1,3}\s*$",
            r"(?i)\[nay this proposal\]",
            r"(?i)\bnay this proposal\b",
            r"(?i)vote\s+nay\s*[-\s]*",
            r"(?i)change\s+your\s+vote\s+to\s+nay",
            r"(?i)ignore\s*/?\s*nay",
            r"(?i)\bduplicate\s+ref(erendum)?\b",
            r"(?i)vote\s+for\s+nay\b",
            r"(?i)test\s+.*\s+vote\s+(for|)\s*nay",
            r"(?i)\[vote\s+nay\b",
            r"(?i)resubmission\s+in\s+process",
            r"(?i)will\s+be\s+sent\s+again",
        ];
        PatternTier::from_patterns(Tier::Strong, 0.95, &patterns)
    }

    fn build_medium_tier() -> Result<PatternTier> {
        let patterns = [
            r"(?i)preimage\s+(removed|pulled)",
            r"(?i)(incorrect|wrong)\s+(preimage|hash)",
            r"(?i)vote\s+on\s+#\d+\s+instead",
            r"(?i)\bcancelled\b",
            r"(?i)\[cancelled\]",
            r"(?i)cancelling\s+this\s+one",
            r"(?i)posted\s+on\s+wrong\s+track",
            r"(?i)wrong\s+track\b",
            r"(?i)wrong\s+dot\s+amount",
            r"(?i)wrong\s+function",
            r"(?i)wrong\s+category",
        ];
        PatternTier::from_patterns(Tier::Medium, 0.85, &patterns)
    }

    fn build_content_tier() -> Result<PatternTier> {
        let patterns = [
            r"(?i)please\s+reject\s+this",
            r"(?i)reject\s+this\s+referendum",
            r"(?i)Please reject this proposal",
            r"(?i)\bvote\s+nay\s+on\s+this\b",
            r"(?i)vote\s+against\s+this",
            r"(?i)\bvote\s+no\s+on\s+this\b",
            r"(?i)bug\s*/\s*error\s+in\s+this",
            r"(?i)will\s+resubmit\s+a\s+corrected",
            r"(?i)we\s+will\s+resubmit",
            r"(?i)will\s+resubmit\s+it",
            r"(?i)resubmit.*proposal",
            r"(?i)reject.*resubmit",
        ];
        PatternTier::from_patterns(Tier::Content, 0.9, &patterns)
    }

    fn build_context_pairs() -> Result<Vec<ContextPair>> {
        // Evaluated against lower-cased text
        Ok(vec![
            ContextPair::compile("nay", r"\bnay\b", r"vote\s+nay|please\s+nay")?,
            ContextPair::compile("reject", r"\breject\b", r"reject\s+this|please\s+reject")?,
            ContextPair::compile("error", r"\berror\b", r"error\s+in|due\s+to\s+error")?,
            ContextPair::compile("wrong", r"\bwrong\b", r"wrong\s+\w+|is\s+wrong")?,
            ContextPair::compile("mistake", r"\bmistake\b", r"mistake\s+in|by\s+mistake")?,
            ContextPair::compile("incorrect", r"\bincorrect\b", r"incorrect\s+\w+|is\s+incorrect")?,
            ContextPair::compile("cancel", r"\bcancel\b", r"cancel\s+this|please\s+cancel")?,
            ContextPair::compile("ignore", r"\bignore\b", r"ignore\s+this|please\s+ignore")?,
            ContextPair::compile("against", r"\bagainst\b", r"vote\s+against")?,
        ])
    }

    fn build_simple_keywords() -> Result<Vec<SimpleKeyword>> {
        ["nay", "reject", "error", "wrong", "mistake"]
            .into_iter()
            .map(SimpleKeyword::compile)
            .collect()
    }
}

fn compile(tier: Tier, pattern: &'static str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| PatternError::InvalidPattern {
        tier,
        pattern: pattern.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> RuleTables {
        RuleTables::build().expect("rule tables compile")
    }

    #[test]
    fn all_tables_compile() {
        let t = tables();
        assert_eq!(t.overrides.rules().len(), 3);
        assert_eq!(t.negatives.len(), 23);
        assert_eq!(t.strong.rules().len(), 31);
        assert_eq!(t.medium.rules().len(), 11);
        assert_eq!(t.content.rules().len(), 12);
        assert_eq!(t.context_pairs.len(), 9);
        assert_eq!(t.simple_keywords.len(), 5);
    }

    #[test]
    fn tier_confidences_are_fixed() {
        let t = tables();
        assert_eq!(t.overrides.confidence(), 0.95);
        assert_eq!(t.placeholder.confidence(), 0.95);
        assert_eq!(t.strong.confidence(), 0.95);
        assert_eq!(t.medium.confidence(), 0.85);
        assert_eq!(t.content.confidence(), 0.9);
    }

    #[test]
    fn first_match_respects_list_order() {
        let t = tables();
        // Matches both "please reject (this|the)" and "reject this proposal";
        // the earlier rule wins.
        let (rule, m) = t.strong.first_match("Please reject this proposal").unwrap();
        assert_eq!(rule.pattern(), r"(?i)reject\s+this\s+(referendum|proposal|motion)");
        assert_eq!(m.as_str(), "reject this proposal");
    }

    #[test]
    fn first_match_returns_none_without_match() {
        let t = tables();
        assert!(t.strong.first_match("Register KSM on Asset Hub").is_none());
    }

    #[test]
    fn override_rules_carry_explanations() {
        let t = tables();
        let (rule, _) = t.overrides.first_match("change my vote to nay").unwrap();
        assert_eq!(rule.explanation(), Some("Contains vote change instruction"));
    }

    #[test]
    fn unguarded_negative_vetoes_on_any_match() {
        let t = tables();
        let dot = t.negatives.iter().find(|r| r.pattern() == r"(?i)\.dot\b").unwrap();
        assert!(dot.vetoes("send it to polkadot.dot"));
        assert!(!dot.vetoes("Polkadot treasury"));
    }

    #[test]
    fn guarded_negative_is_lifted_by_trailing_signal() {
        let t = tables();
        let refund = t
            .negatives
            .iter()
            .find(|r| r.pattern().contains("refund"))
            .unwrap();
        assert!(refund.vetoes("Retroactive funding request"));
        assert!(!refund.vetoes("Retroactive funding, please reject"));
    }

    #[test]
    fn guard_only_looks_past_the_match() {
        let t = tables();
        let refund = t
            .negatives
            .iter()
            .find(|r| r.pattern().contains("refund"))
            .unwrap();
        // The signal precedes the payment term, so the veto stands.
        assert!(refund.vetoes("Reject earlier motion: refund"));
    }

    #[test]
    fn guard_checks_every_occurrence() {
        let t = tables();
        let refund = t
            .negatives
            .iter()
            .find(|r| r.pattern().contains("refund"))
            .unwrap();
        // First "refund" is followed by "vote", the second is not.
        assert!(refund.vetoes("refund, vote later; refund"));
    }

    #[test]
    fn guard_stops_at_line_end() {
        let t = tables();
        let refund = t
            .negatives
            .iter()
            .find(|r| r.pattern().contains("refund"))
            .unwrap();
        assert!(refund.vetoes("refund request\nvote nay"));
    }

    #[test]
    fn context_pair_needs_both_parts() {
        let t = tables();
        let error = t.context_pairs.iter().find(|p| p.keyword() == "error").unwrap();
        assert!(error.is_satisfied("an error in submission"));
        assert!(!error.is_satisfied("an error was made"));
    }

    #[test]
    fn simple_keywords_are_whole_words() {
        let t = tables();
        let wrong = t.simple_keywords.iter().find(|k| k.word() == "wrong").unwrap();
        assert!(wrong.is_present("it was wrong"));
        assert!(!wrong.is_present("wrongful"));
    }

    #[test]
    fn invalid_pattern_reports_tier() {
        let err = compile(Tier::Medium, r"(unclosed").unwrap_err();
        assert_eq!(err.tier(), Tier::Medium);
        assert!(err.to_string().contains("medium"));
    }
}
