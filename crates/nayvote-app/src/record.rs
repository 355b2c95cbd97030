//! Referendum records as saved from the Polkassembly post API.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// The fields of an on-chain post that the export needs.
///
/// Missing fields become empty strings; numeric ids and timestamps are
/// stringified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReferendumRecord {
    #[serde(default, deserialize_with = "scalar_string")]
    pub post_id: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub title: String,
    /// Body as HTML.
    #[serde(default, deserialize_with = "scalar_string")]
    pub content: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub status: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub created_at: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub proposer: String,
}

impl ReferendumRecord {
    /// Parses a record from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Extracts referendum ids from `referendum_<id>.json` file names.
#[derive(Debug, Clone)]
pub struct FileNamePattern {
    regex: Regex,
}

impl FileNamePattern {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(r"referendum_(\d+)\.json$")?,
        })
    }

    /// Returns the referendum id encoded in the file name, if any.
    pub fn referendum_id(&self, path: &Path) -> Option<u64> {
        let name = path.file_name()?.to_str()?;
        self.regex.captures(name)?.get(1)?.as_str().parse().ok()
    }
}
