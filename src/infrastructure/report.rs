//! Report rendering
//!
//! Renders a [`PipelineResult`] into one of the three export formats. All
//! formats are produced from the same in-memory result and returned as
//! bytes; writing them anywhere is the caller's business.

pub mod pdf;
pub mod tabular;
pub mod text_encoding;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::domain::record::PipelineResult;
use crate::infrastructure::config::ReportConfig;

pub use pdf::PdfLayout;

/// Export formats offered for a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Csv,
    Json,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [Self; 3] = [Self::Csv, Self::Json, Self::Pdf];

    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Csv => "data.csv",
            Self::Json => "data.json",
            Self::Pdf => "intelligence_report.pdf",
        }
    }

    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Json => "application/json",
            Self::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => f.write_str("csv"),
            Self::Json => f.write_str("json"),
            Self::Pdf => f.write_str("pdf"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ReportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pdf" => Ok(Self::Pdf),
            other => Err(ReportError::UnknownFormat {
                value: other.to_string(),
            }),
        }
    }
}

/// Errors raised while rendering an export
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Unknown export format: {value}")]
    UnknownFormat { value: String },

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PDF generation failed: {reason}")]
    Pdf { reason: String },

    #[error("I/O error while rendering: {0}")]
    Io(#[from] std::io::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;

/// Renders results into export formats
#[derive(Debug, Clone, Default)]
pub struct ReportGenerator {
    layout: PdfLayout,
}

impl ReportGenerator {
    pub fn new(layout: PdfLayout) -> Self {
        Self { layout }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(PdfLayout::from_config(config))
    }

    pub const fn layout(&self) -> &PdfLayout {
        &self.layout
    }

    pub fn render(&self, result: &PipelineResult, format: ExportFormat) -> ReportResult<Vec<u8>> {
        let bytes = match format {
            ExportFormat::Csv => tabular::to_csv(result)?,
            ExportFormat::Json => tabular::to_json(result)?,
            ExportFormat::Pdf => pdf::render_pdf(result, &self.layout)?,
        };
        debug!("Rendered {} records as {} ({} bytes)", result.len(), format, bytes.len());
        Ok(bytes)
    }
}
