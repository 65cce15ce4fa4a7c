//! CSV and JSON exports

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use super::{ReportError, ReportResult};
use crate::domain::record::PipelineResult;

/// Column order of the tabular exports
pub const COLUMNS: [&str; 4] = ["type", "payload", "source", "node"];

/// UTF-8 CSV with a header row, even for an empty result
pub fn to_csv(result: &PipelineResult) -> ReportResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());

    writer.write_record(COLUMNS)?;
    for record in result {
        writer.serialize(record)?;
    }

    writer.into_inner().map_err(|e| ReportError::Io(e.into_error()))
}

/// Array of objects indented with four spaces
pub fn to_json(result: &PipelineResult) -> ReportResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    result.serialize(&mut serializer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::aggregator::aggregate;
    use crate::domain::record::{ExtractedRecord, RecordType};

    fn sample() -> PipelineResult {
        aggregate([vec![
            ExtractedRecord::new(RecordType::Text, "Hello, \"quoted\" world", "https://a.com", "p"),
            ExtractedRecord::new(RecordType::TableData, "A | B [ROW] 1 | 2", "https://a.com", "table"),
        ]])
    }

    #[test]
    fn test_csv_header_and_quoting() {
        let csv = String::from_utf8(to_csv(&sample()).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("type,payload,source,node"));
        assert_eq!(lines.next(), Some(r#"Text,"Hello, ""quoted"" world",https://a.com,p"#));
        assert_eq!(lines.next(), Some("Table Data,A | B [ROW] 1 | 2,https://a.com,table"));
    }

    #[test]
    fn test_empty_csv_has_header_only() {
        let csv = to_csv(&PipelineResult::default()).unwrap();
        assert_eq!(csv, b"type,payload,source,node\n");
    }

    #[test]
    fn test_json_uses_four_space_indent() {
        let json = String::from_utf8(to_json(&sample()).unwrap()).unwrap();
        assert!(json.starts_with("[\n    {\n        \"type\": \"Text\""));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[1]["node"], "table");
    }

    #[test]
    fn test_empty_json_is_empty_array() {
        assert_eq!(to_json(&PipelineResult::default()).unwrap(), b"[]");
    }
}
