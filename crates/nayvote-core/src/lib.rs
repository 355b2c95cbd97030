//! Nayvote Core - detection of referenda that ask to be voted down.
//!
//! Governance proposal authors often withdraw a submission by asking voters
//! to reject it ("please vote nay", "created in error", a title of just `-`).
//! This crate turns a referendum title and body into a [`DetectionOutcome`]
//! using a fixed cascade of regex tiers.
//!
//! # Example
//!
//! ```
//! use nayvote_core::NayDetector;
//!
//! let detector = NayDetector::new().expect("built-in rules compile");
//! let outcome = detector.detect("Wrong preimage", "");
//! assert!(outcome.is_nay_request);
//! assert_eq!(outcome.confidence, 0.95);
//! ```

pub mod classifier;
pub mod error;
pub mod normalize;

pub use classifier::{
    ClassificationResult, DetectionInput, DetectionOutcome, NayDetector, PatternCascade, Tier,
};
pub use error::{PatternError, Result};
