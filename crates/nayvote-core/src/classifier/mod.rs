//! Nay-request classification.
//!
//! [`PatternCascade`] judges a single text; [`NayDetector`] combines the
//! title and content judgments into one [`DetectionOutcome`].

mod cascade;
mod detector;
pub mod patterns;
mod result;

pub use cascade::{
    PatternCascade, EVALUATION_ORDER, MULTIPLE_CONTEXTUAL_CONFIDENCE, SIMPLE_KEYWORD_CONFIDENCE,
    SINGLE_CONTEXTUAL_CONFIDENCE,
};
pub use detector::{
    NayDetector, COMBINED_EVIDENCE_BOOST, COMBINED_EVIDENCE_CAP, CONTENT_ACCEPT_THRESHOLD,
    TITLE_SHORT_CIRCUIT_THRESHOLD,
};
pub use result::{ClassificationResult, DetectionInput, DetectionOutcome, Tier};
