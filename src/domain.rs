//! Domain module - records, extraction modes and crawl state
//!
//! These types carry the data that flows through one pipeline run:
//! the closed set of extraction modes, the records each mode produces,
//! the frontier of same-domain links and the warnings raised on the way.
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod frontier;
pub mod mode;
pub mod record;
pub mod warning;

// Re-export commonly used items for convenience
pub use frontier::CrawlFrontier;
pub use mode::{ExtractionMode, ModeKind, SelectorTarget};
pub use record::{ExtractedRecord, MISSING_FIELD, PipelineResult, RecordType};
pub use warning::{PipelineStage, Warning};
