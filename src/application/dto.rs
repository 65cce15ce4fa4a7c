//! Data Transfer Objects for the pipeline
//!
//! A run is a pure function of its request; everything it produced comes
//! back in the response.

use serde::Serialize;
use std::fmt;

use crate::domain::frontier::CrawlFrontier;
use crate::domain::mode::{ExtractionMode, ModeKind};
use crate::domain::record::PipelineResult;
use crate::domain::warning::Warning;
use crate::infrastructure::parsing::urls::{display_host, parse_page_url};
use crate::infrastructure::parsing_error::ParsingResult;

/// Message shown when a run finished without records
pub const NO_DATA_MESSAGE: &str = "No data found matching your criteria.";

/// One pipeline run as requested by the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRequest {
    pub url: String,
    pub mode: ExtractionMode,
    pub crawl_subpages: bool,
}

impl PipelineRequest {
    /// Validate raw operator input.
    ///
    /// Rejects an empty or non-http URL, an unknown mode, a missing
    /// target for the modes that need one and a custom selector that is
    /// not valid CSS.
    pub fn new(url: &str, mode: &str, target: Option<&str>, crawl_subpages: bool) -> ParsingResult<Self> {
        let url = parse_page_url(url)?;
        let mode = mode.parse::<ModeKind>()?.with_target(target)?;
        Ok(Self {
            url: url.to_string(),
            mode,
            crawl_subpages,
        })
    }

    /// Request with an already built mode; the URL is still validated
    pub fn with_mode(url: &str, mode: ExtractionMode, crawl_subpages: bool) -> ParsingResult<Self> {
        let url = parse_page_url(url)?;
        Ok(Self {
            url: url.to_string(),
            mode,
            crawl_subpages,
        })
    }
}

/// Everything one run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineResponse {
    pub result: PipelineResult,
    pub warnings: Vec<Warning>,
    /// Links discovered on the primary page (empty unless crawling)
    pub frontier: CrawlFrontier,
    /// Pages whose content was extracted, primary page first
    pub pages_fetched: Vec<String>,
}

impl PipelineResponse {
    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }
}

/// Dashboard metrics of a finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub records_found: usize,
    pub pipeline_status: String,
    pub data_source: String,
}

impl RunSummary {
    pub fn new(url: &str, response: &PipelineResponse) -> Self {
        Self {
            records_found: response.result.len(),
            pipeline_status: "100% Cleaned".to_string(),
            data_source: display_host(url),
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Records Found: {} | Pipeline Status: {} | Data Source: {}",
            self.records_found, self.pipeline_status, self.data_source
        )
    }
}
