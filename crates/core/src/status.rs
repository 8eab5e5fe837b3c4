//! Model of the Solr CoreAdmin `STATUS` response.
//!
//! Only the fields the evaluator needs are modelled; everything else in
//! the document is ignored. Missing fields default rather than fail so a
//! half-loaded core still produces a verdict instead of aborting the run.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::types::Timestamp;

/// Timestamp layout Solr uses for `lastModified`, e.g. `2024-03-01T12:00:00.123Z`.
const LAST_MODIFIED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Top-level CoreAdmin `STATUS` document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDocument {
    /// Core name -> per-core status.
    #[serde(default)]
    pub status: BTreeMap<String, CoreEntry>,
    /// Core name -> error text, for cores Solr failed to load.
    #[serde(default)]
    pub init_failures: BTreeMap<String, String>,
}

/// One entry of the `status` mapping.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoreEntry {
    #[serde(default)]
    pub index: IndexInfo,
}

/// The `index` section of a core entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexInfo {
    /// `null` or a non-integer value counts as zero documents.
    #[serde(default, deserialize_with = "lenient_count")]
    pub num_docs: u64,
    /// Anything but a string is treated as absent.
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_modified: Option<String>,
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_u64).unwrap_or(0))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// Parsed view of a single core, ready for evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStatus {
    pub name: String,
    pub num_docs: u64,
    /// `None` when Solr omitted the field or sent something unparsable.
    pub last_modified: Option<Timestamp>,
}

impl StatusDocument {
    /// Parse the raw JSON body returned by the admin endpoint.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Parsed status of `core`, or `None` if Solr did not report it.
    pub fn core(&self, core: &str) -> Option<CoreStatus> {
        self.status
            .get(core)
            .map(|entry| CoreStatus::from_entry(core, entry))
    }

    /// Load failure text for `core`, if Solr could not initialise it.
    pub fn init_failure(&self, core: &str) -> Option<&str> {
        self.init_failures.get(core).map(String::as_str)
    }
}

impl CoreStatus {
    pub fn from_entry(name: &str, entry: &CoreEntry) -> Self {
        Self {
            name: name.to_string(),
            num_docs: entry.index.num_docs,
            last_modified: entry
                .index
                .last_modified
                .as_deref()
                .and_then(parse_last_modified),
        }
    }
}

/// Parse a Solr `lastModified` value.
///
/// Accepts the `...%.fZ` layout Solr emits and falls back to general
/// RFC 3339. Returns `None` for anything else.
pub fn parse_last_modified(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, LAST_MODIFIED_FORMAT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
