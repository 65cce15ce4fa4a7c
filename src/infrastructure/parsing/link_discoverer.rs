//! Same-domain link discovery

#![allow(clippy::uninlined_format_args)]

use scraper::{Html, Selector};
use tracing::debug;

use super::{ContextualParser, ParseContext, ParsingError, ParsingResult, urls};
use crate::domain::frontier::CrawlFrontier;

/// Collects the internal links of a page
pub struct LinkDiscoverer {
    anchor_selector: Selector,
}

impl LinkDiscoverer {
    pub fn new() -> ParsingResult<Self> {
        let anchor_selector =
            Selector::parse("a[href]").map_err(|e| ParsingError::invalid_selector("a[href]", e))?;
        Ok(Self { anchor_selector })
    }

    /// Parse `html` and discover the links of the page at `base_url`
    pub fn discover(&self, html: &str, base_url: &str) -> ParsingResult<CrawlFrontier> {
        let document = Html::parse_document(html);
        self.parse_with_context(&document, &ParseContext::new(base_url))
    }
}

impl ContextualParser for LinkDiscoverer {
    type Output = CrawlFrontier;
    type Context = ParseContext;

    /// Anchors resolved against the page URL, normalized, kept when on the
    /// same host and not the page itself. Document order is preserved.
    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output> {
        let base = context
            .base
            .as_ref()
            .ok_or_else(|| ParsingError::invalid_url(&context.page_url, "not an absolute URL"))?;
        let base_host = urls::host_key(base);
        let base_normalized = urls::normalize(base);

        let mut frontier = CrawlFrontier::new();
        let mut skipped = 0usize;

        for anchor in html.select(&self.anchor_selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };

            let Some(resolved) = urls::resolve(Some(base), href) else {
                skipped += 1;
                continue;
            };

            if base_host.is_none() || urls::host_key(&resolved) != base_host {
                skipped += 1;
                continue;
            }

            let normalized = urls::normalize(&resolved);
            if normalized != base_normalized {
                frontier.insert(normalized);
            }
        }

        debug!(
            "Discovered {} internal links on {} ({} external or invalid skipped)",
            frontier.len(),
            context.page_url,
            skipped
        );

        Ok(frontier)
    }
}
