//! Nayvote - command-line front end for the nay-request detector.
//!
//! This crate provides:
//!
//! - Loading of saved referendum JSON records
//! - HTML to plain text conversion for proposal bodies
//! - Parallel batch export of verdicts to CSV
//!
//! # Usage
//!
//! ```no_run
//! use nayvote_app::batch::{process_json_files, BatchConfig, Network};
//! use nayvote_core::NayDetector;
//!
//! let detector = NayDetector::new().expect("built-in rules compile");
//! let config = BatchConfig::new(Network::Polkadot, "referendum_data");
//! let summary = process_json_files(&config, &detector).expect("export failed");
//! println!("wrote {} rows", summary.rows_written);
//! ```

pub mod batch;
pub mod html;
pub mod record;

pub use batch::{BatchConfig, BatchError, BatchSummary, Network};
pub use html::HtmlToText;
pub use record::ReferendumRecord;
