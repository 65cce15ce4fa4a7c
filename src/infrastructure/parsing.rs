//! HTML parsing for link discovery and content extraction
//!
//! Parsers work on an already parsed [`scraper::Html`] document and never
//! fail on malformed markup: unexpected DOM just yields fewer matches.
//! They are kept synchronous because `Html` is not `Send`.

pub mod content_extractor;
pub mod context;
pub mod error;
pub mod link_discoverer;
pub mod urls;

// Re-export public types
pub use content_extractor::{ContentExtractor, ExtractionSettings};
pub use context::{ExtractContext, ParseContext};
pub use error::{ParsingError, ParsingResult};
pub use link_discoverer::LinkDiscoverer;

use scraper::Html;

/// Parser trait with context support
pub trait ContextualParser {
    type Output;
    type Context;

    /// Parse HTML with contextual information
    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output>;
}
