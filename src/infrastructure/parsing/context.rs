//! Parsing contexts
//!
//! Carry the page URL used to resolve relative references, and for
//! extraction the mode being applied.

use url::Url;

use super::urls;
use crate::domain::mode::ExtractionMode;

/// Context for parsing one fetched page
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// URL the page was fetched from, as given
    pub page_url: String,

    /// Parsed form of `page_url`; `None` when it is not an absolute URL
    pub base: Option<Url>,
}

impl ParseContext {
    pub fn new(page_url: impl Into<String>) -> Self {
        let page_url = page_url.into();
        let base = Url::parse(&page_url).ok();
        Self { page_url, base }
    }

    /// Absolute form of `href`, or `href` itself when it cannot be resolved
    pub fn resolve(&self, href: &str) -> String {
        urls::resolve_or_verbatim(self.base.as_ref(), href)
    }
}

/// Context for extracting records from one page
#[derive(Debug, Clone)]
pub struct ExtractContext {
    pub page: ParseContext,
    pub mode: ExtractionMode,
}

impl ExtractContext {
    pub fn new(page_url: impl Into<String>, mode: ExtractionMode) -> Self {
        Self {
            page: ParseContext::new(page_url),
            mode,
        }
    }
}
