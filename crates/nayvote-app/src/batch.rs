//! Batch export of saved referendum JSON files to CSV.
//!
//! Reads `referendum_<id>.json` files for one network, runs every record
//! through the detector in parallel, and appends the verdicts to
//! `<output>/<network>_referendums.csv`. Ids already present in the CSV are
//! skipped, so the export can be re-run as new files arrive.

use std::collections::HashSet;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use nayvote_core::{DetectionOutcome, NayDetector};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::html::HtmlToText;
use crate::record::{FileNamePattern, ReferendumRecord};

/// CSV columns, in output order.
pub const CSV_HEADERS: [&str; 9] = [
    "id",
    "title",
    "content",
    "is_nay_request",
    "confidence",
    "explanation",
    "status",
    "created_at",
    "proposer",
];

/// Default number of content characters kept per row.
pub const DEFAULT_CONTENT_LIMIT: usize = 100;

/// Errors that can occur during a batch export.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The JSON directory does not exist.
    #[error("JSON directory {} does not exist", .0.display())]
    MissingDirectory(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be parsed.
    #[error("failed to parse {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// CSV read or write error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A built-in expression failed to compile.
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// Result type for batch operations.
pub type Result<T> = std::result::Result<T, BatchError>;

/// Governance networks with saved referendum data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum Network {
    #[default]
    Polkadot,
    Kusama,
    Moonbeam,
}

impl Network {
    pub fn name(&self) -> &'static str {
        match self {
            Network::Polkadot => "polkadot",
            Network::Kusama => "kusama",
            Network::Moonbeam => "moonbeam",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where to read records from and where to write the CSV.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub network: Network,
    /// Overrides `<output>/<network>/json`.
    pub json_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// Content characters kept (and classified) per record.
    pub content_limit: usize,
}

impl BatchConfig {
    pub fn new(network: Network, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            network,
            json_dir: None,
            output_dir: output_dir.into(),
            content_limit: DEFAULT_CONTENT_LIMIT,
        }
    }

    /// Directory holding the `referendum_<id>.json` files.
    pub fn json_dir(&self) -> PathBuf {
        self.json_dir.clone().unwrap_or_else(|| {
            self.output_dir
                .join(self.network.name())
                .join("json")
        })
    }

    /// Path of the CSV file for this network.
    pub fn csv_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_referendums.csv", self.network.name()))
    }
}

/// Counts reported after an export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// JSON files found in the directory.
    pub files_found: usize,
    /// Files whose id was already in the CSV.
    pub skipped_existing: usize,
    /// Files not named `referendum_<id>.json`.
    pub skipped_invalid_name: usize,
    /// Files that could not be read or parsed.
    pub failed: usize,
    /// Rows appended to the CSV.
    pub rows_written: usize,
}

/// One CSV row.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferendumRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub outcome: DetectionOutcome,
    pub status: String,
    pub created_at: String,
    pub proposer: String,
}

impl ReferendumRow {
    /// Classifies a record. Content is converted to text and truncated
    /// before detection.
    pub fn classify(
        record: ReferendumRecord,
        detector: &NayDetector,
        html: &HtmlToText,
        content_limit: usize,
    ) -> Self {
        let content = truncate_chars(&html.convert(&record.content), content_limit);
        let outcome = detector.detect(&record.title, &content);

        Self {
            id: record.post_id,
            title: record.title,
            content,
            outcome,
            status: record.status,
            created_at: record.created_at,
            proposer: record.proposer,
        }
    }

    /// Returns the row as CSV fields, in [`CSV_HEADERS`] order.
    pub fn to_record(&self) -> [String; 9] {
        [
            self.id.clone(),
            self.title.clone(),
            self.content.clone(),
            if self.outcome.is_nay_request { "1" } else { "0" }.to_string(),
            format_confidence(self.outcome.confidence),
            self.outcome.explanation.clone(),
            self.status.clone(),
            self.created_at.clone(),
            self.proposer.clone(),
        ]
    }
}

/// Exports every unprocessed record in the configured JSON directory.
pub fn process_json_files(config: &BatchConfig, detector: &NayDetector) -> Result<BatchSummary> {
    let json_dir = config.json_dir();
    if !json_dir.is_dir() {
        return Err(BatchError::MissingDirectory(json_dir));
    }

    let csv_path = config.csv_path();
    let existing = existing_ids(&csv_path)?;
    if !existing.is_empty() {
        info!("Found {} existing records in {:?}", existing.len(), csv_path);
    }

    let mut files: Vec<PathBuf> = fs::read_dir(&json_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    let mut summary = BatchSummary {
        files_found: files.len(),
        ..Default::default()
    };
    info!("Found {} JSON files in {:?}", files.len(), json_dir);

    let names = FileNamePattern::new()?;
    let mut pending = Vec::new();
    for path in files {
        match names.referendum_id(&path) {
            None => {
                warn!("Skipping file with invalid name format: {:?}", path);
                summary.skipped_invalid_name += 1;
            }
            Some(id) if existing.contains(&id) => {
                debug!("Skipping referendum {} (already in CSV)", id);
                summary.skipped_existing += 1;
            }
            Some(id) => pending.push((id, path)),
        }
    }

    let html = HtmlToText::new()?;
    let mut results: Vec<(u64, Result<ReferendumRow>)> = pending
        .par_iter()
        .map(|(id, path)| {
            let row = load_record(path).map(|record| {
                ReferendumRow::classify(record, detector, &html, config.content_limit)
            });
            (*id, row)
        })
        .collect();
    results.sort_by_key(|(id, _)| *id);

    let mut rows = Vec::with_capacity(results.len());
    for (id, result) in results {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!("Error processing referendum {}: {}", id, e);
                summary.failed += 1;
            }
        }
    }

    summary.rows_written = append_rows(&csv_path, &rows)?;
    if summary.rows_written > 0 {
        info!("Added {} new records to {:?}", summary.rows_written, csv_path);
    } else {
        info!("No new records to add to {:?}", csv_path);
    }

    Ok(summary)
}

/// Loads one saved referendum file.
pub fn load_record(path: &Path) -> Result<ReferendumRecord> {
    let bytes = fs::read(path)?;
    ReferendumRecord::from_slice(&bytes).map_err(|source| BatchError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads the numeric ids already present in the CSV's `id` column.
pub fn existing_ids(csv_path: &Path) -> Result<HashSet<u64>> {
    if !csv_path.exists() || fs::metadata(csv_path)?.len() == 0 {
        return Ok(HashSet::new());
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let Some(id_column) = reader.headers()?.iter().position(|h| h == "id") else {
        return Ok(HashSet::new());
    };

    let mut ids = HashSet::new();
    for record in reader.records() {
        let record = record?;
        if let Some(id) = record.get(id_column).and_then(|v| v.parse::<u64>().ok()) {
            ids.insert(id);
        }
    }
    Ok(ids)
}

/// Appends rows to the CSV, writing the header only for a new file.
pub fn append_rows(csv_path: &Path, rows: &[ReferendumRow]) -> Result<usize> {
    if rows.is_empty() {
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let has_content = csv_path.exists() && fs::metadata(csv_path)?.len() > 0;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;
    let mut writer = csv::Writer::from_writer(file);

    if !has_content {
        writer.write_record(CSV_HEADERS)?;
    }
    for row in rows {
        writer.write_record(row.to_record())?;
    }
    writer.flush()?;

    Ok(rows.len())
}

/// Keeps the first `limit` characters.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// Formats a confidence with at most two decimals ("0.95", "0.7").
pub fn format_confidence(confidence: f32) -> String {
    let rounded = (confidence * 100.0).round() / 100.0;
    rounded.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn detector() -> NayDetector {
        NayDetector::new().unwrap()
    }

    fn write_json(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    fn setup() -> (TempDir, BatchConfig) {
        let tmp = TempDir::new().unwrap();
        let config = BatchConfig::new(Network::Kusama, tmp.path());
        fs::create_dir_all(config.json_dir()).unwrap();
        (tmp, config)
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn default_paths_follow_network() {
        let config = BatchConfig::new(Network::Polkadot, "referendum_data");
        assert_eq!(
            config.json_dir(),
            PathBuf::from("referendum_data/polkadot/json")
        );
        assert_eq!(
            config.csv_path(),
            PathBuf::from("referendum_data/polkadot_referendums.csv")
        );
    }

    #[test]
    fn exports_rows_sorted_by_id() {
        let (_tmp, config) = setup();
        let dir = config.json_dir();
        write_json(
            &dir,
            "referendum_12.json",
            r#"{"post_id": 12, "title": "-", "content": "", "status": "Rejected"}"#,
        );
        write_json(
            &dir,
            "referendum_3.json",
            r#"{"post_id": 3, "title": "Register KSM on Asset Hub", "content": "<p>Hello</p>"}"#,
        );

        let summary = process_json_files(&config, &detector()).unwrap();
        assert_eq!(summary.files_found, 2);
        assert_eq!(summary.rows_written, 2);

        let rows = read_rows(&config.csv_path());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "3");
        assert_eq!(rows[0][2], "Hello");
        assert_eq!(rows[0][3], "0");
        assert_eq!(rows[0][4], "0.9");
        assert_eq!(rows[1][0], "12");
        assert_eq!(rows[1][3], "1");
        assert_eq!(rows[1][4], "0.95");
        assert_eq!(rows[1][6], "Rejected");
    }

    #[test]
    fn rerun_skips_existing_ids() {
        let (_tmp, config) = setup();
        let dir = config.json_dir();
        write_json(&dir, "referendum_1.json", r#"{"post_id": 1, "title": "Wrong preimage"}"#);
        process_json_files(&config, &detector()).unwrap();

        write_json(&dir, "referendum_2.json", r#"{"post_id": 2, "title": "Treasury"}"#);
        let summary = process_json_files(&config, &detector()).unwrap();
        assert_eq!(summary.skipped_existing, 1);
        assert_eq!(summary.rows_written, 1);

        let content = fs::read_to_string(config.csv_path()).unwrap();
        assert_eq!(content.matches("is_nay_request").count(), 1);
        assert_eq!(read_rows(&config.csv_path()).len(), 2);
    }

    #[test]
    fn bad_files_are_counted_not_fatal() {
        let (_tmp, config) = setup();
        let dir = config.json_dir();
        write_json(&dir, "notes.json", "{}");
        write_json(&dir, "referendum_5.json", "not json");
        write_json(&dir, "referendum_6.json", r#"{"post_id": 6, "title": "ok"}"#);
        fs::write(dir.join("readme.txt"), "ignored").unwrap();

        let summary = process_json_files(&config, &detector()).unwrap();
        assert_eq!(summary.files_found, 3);
        assert_eq!(summary.skipped_invalid_name, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.rows_written, 1);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let config = BatchConfig::new(Network::Moonbeam, tmp.path());
        let err = process_json_files(&config, &detector()).unwrap_err();
        assert!(matches!(err, BatchError::MissingDirectory(_)));
    }

    #[test]
    fn content_is_truncated_before_detection() {
        let record = ReferendumRecord {
            post_id: "9".to_string(),
            title: "Treasury".to_string(),
            content: format!("<p>{}VOTE NAY</p>", "x".repeat(100)),
            ..Default::default()
        };
        let html = HtmlToText::new().unwrap();
        let row = ReferendumRow::classify(record, &detector(), &html, 100);
        assert_eq!(row.content.chars().count(), 100);
        assert!(!row.outcome.is_nay_request);
    }

    #[test]
    fn nothing_written_for_empty_batch() {
        let (_tmp, config) = setup();
        let summary = process_json_files(&config, &detector()).unwrap();
        assert_eq!(summary.rows_written, 0);
        assert!(!config.csv_path().exists());
    }

    #[test]
    fn existing_ids_ignore_non_numeric() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.csv");
        fs::write(&path, "id,title\n4,a\n,b\nabc,c\n10,d\n").unwrap();
        let ids = existing_ids(&path).unwrap();
        assert_eq!(ids, HashSet::from([4, 10]));
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate_chars("爱Web3 中文", 4), "爱Web");
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[test]
    fn confidence_formatting() {
        assert_eq!(format_confidence(0.95), "0.95");
        assert_eq!(format_confidence(0.6 + 0.1), "0.7");
        assert_eq!(format_confidence(0.0), "0");
    }
}
