//! Extracted records and the cleaned result set of a pipeline run

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder written into any record field that ended up empty
pub const MISSING_FIELD: &str = "N/A";

/// Kind of data a record carries, one per extraction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    #[serde(rename = "Text")]
    Text,
    #[serde(rename = "File Link")]
    FileLink,
    #[serde(rename = "Metadata")]
    Metadata,
    #[serde(rename = "Keyword Match")]
    KeywordMatch,
    #[serde(rename = "Image Resource")]
    ImageResource,
    #[serde(rename = "Table Data")]
    TableData,
}

impl RecordType {
    /// Human readable label, also used as the exported value
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::FileLink => "File Link",
            Self::Metadata => "Metadata",
            Self::KeywordMatch => "Keyword Match",
            Self::ImageResource => "Image Resource",
            Self::TableData => "Table Data",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of extracted data.
///
/// Records are immutable once built by the content extractor. The only
/// transformation applied afterwards is the cleaning pass of the
/// aggregator, which produces a new record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtractedRecord {
    #[serde(rename = "type")]
    record_type: RecordType,
    payload: String,
    source: String,
    node: String,
}

impl ExtractedRecord {
    pub fn new(
        record_type: RecordType,
        payload: impl Into<String>,
        source: impl Into<String>,
        node: impl Into<String>,
    ) -> Self {
        Self {
            record_type,
            payload: payload.into(),
            source: source.into(),
            node: node.into(),
        }
    }

    pub const fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// URL of the page this record was extracted from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Tag name of the DOM node the record came from
    pub fn node(&self) -> &str {
        &self.node
    }

    /// Field name/value pairs in export column order
    pub fn fields(&self) -> [(&'static str, &str); 4] {
        [
            ("type", self.record_type.label()),
            ("payload", &self.payload),
            ("source", &self.source),
            ("node", &self.node),
        ]
    }

    /// Collapse whitespace runs in the payload and fill empty fields.
    pub(crate) fn cleaned(self) -> Self {
        let payload = self.payload.split_whitespace().collect::<Vec<_>>().join(" ");
        Self {
            record_type: self.record_type,
            payload: or_missing(payload),
            source: or_missing(self.source),
            node: or_missing(self.node),
        }
    }
}

fn or_missing(value: String) -> String {
    if value.trim().is_empty() {
        MISSING_FIELD.to_string()
    } else {
        value
    }
}

/// Ordered, deduplicated and cleaned records of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PipelineResult {
    records: Vec<ExtractedRecord>,
}

impl PipelineResult {
    pub(crate) const fn from_cleaned(records: Vec<ExtractedRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ExtractedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExtractedRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<ExtractedRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a PipelineResult {
    type Item = &'a ExtractedRecord;
    type IntoIter = std::slice::Iter<'a, ExtractedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
