//! Application layer module
//!
//! This module contains the pipeline use case and the data transfer
//! objects that carry one run's request and response.

pub mod aggregator;
pub mod dto;
pub mod pipeline;

pub use aggregator::aggregate;
pub use dto::{PipelineRequest, PipelineResponse, RunSummary};
pub use pipeline::{PipelineRunner, PipelineSettings};
