//! OMG Scraper - single-operator web extraction pipeline
//!
//! Fetches a page with a headless browser (or plain HTTP), extracts records
//! in one of six modes, optionally follows up to three internal links,
//! deduplicates and cleans the rows, and exports them as CSV, JSON or a
//! PDF report.

// Module declarations
pub mod application;
pub mod commands;
pub mod domain;
pub mod infrastructure;

// Re-export the presentation-facing API
pub use application::{PipelineRequest, PipelineResponse, RunSummary};
pub use commands::{Artifact, Session, create_fetcher};
