//! Record aggregation
//!
//! Merges the record lists of every fetched page into one cleaned result.

use std::collections::HashSet;

use crate::domain::record::{ExtractedRecord, PipelineResult};

/// Concatenate record lists in call order, drop exact duplicate rows and
/// clean what is left.
///
/// Duplicates are removed before cleaning, so rows that only differ in
/// whitespace both survive. The first occurrence of a row wins.
pub fn aggregate<I>(record_lists: I) -> PipelineResult
where
    I: IntoIterator<Item = Vec<ExtractedRecord>>,
{
    let mut seen = HashSet::new();
    let records = record_lists
        .into_iter()
        .flatten()
        .filter(|record| seen.insert(record.clone()))
        .map(ExtractedRecord::cleaned)
        .collect();

    PipelineResult::from_cleaned(records)
}
