//! Pipeline use case
//!
//! One run: optionally discover the internal links of the primary page,
//! extract the primary page, extract up to three discovered sub-pages in
//! order, then aggregate. Every fetch and parse failure is caught where it
//! happens and turned into a [`Warning`]; a run always completes.

#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;
use std::time::Duration;

use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::application::aggregator::aggregate;
use crate::application::dto::{PipelineRequest, PipelineResponse};
use crate::domain::frontier::CrawlFrontier;
use crate::domain::mode::ExtractionMode;
use crate::domain::record::ExtractedRecord;
use crate::domain::warning::{PipelineStage, Warning};
use crate::infrastructure::config::{AppConfig, defaults};
use crate::infrastructure::fetcher::{FetchError, PageFetcher, WaitCondition};
use crate::infrastructure::parsing::{ContentExtractor, ExtractionSettings, LinkDiscoverer, ParsingResult};

/// Knobs of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Readiness condition before extracting a page
    pub extraction_wait: WaitCondition,
    /// Readiness condition before reading links from the primary page
    pub discovery_wait: WaitCondition,
    /// Upper bound for `extraction_wait`
    pub wait_timeout: Duration,
    /// Sub-pages followed when crawling, never more than 3
    pub max_subpages: usize,
    pub extraction: ExtractionSettings,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            extraction_wait: WaitCondition::ElementPresent(config.fetcher.wait_selector.clone()),
            discovery_wait: WaitCondition::Delay(Duration::from_millis(config.fetcher.discovery_delay_ms)),
            wait_timeout: Duration::from_secs(config.fetcher.wait_timeout_seconds),
            max_subpages: config.crawl.max_subpages.min(defaults::MAX_SUBPAGES),
            extraction: ExtractionSettings::from_config(&config.extraction),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Runs the pipeline against a page fetcher
pub struct PipelineRunner {
    fetcher: Arc<dyn PageFetcher>,
    settings: PipelineSettings,
    discoverer: LinkDiscoverer,
    extractor: ContentExtractor,
}

impl PipelineRunner {
    pub fn new(fetcher: Arc<dyn PageFetcher>, settings: PipelineSettings) -> ParsingResult<Self> {
        let discoverer = LinkDiscoverer::new()?;
        let extractor = ContentExtractor::with_settings(settings.extraction.clone())?;
        Ok(Self {
            fetcher,
            settings,
            discoverer,
            extractor,
        })
    }

    pub const fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    fn fetch_warning(url: &str, stage: PipelineStage, error: &FetchError) -> Warning {
        warn!(url = %url, stage = ?stage, kind = error.kind(), "Fetch failed: {}", error);
        Warning::new(url, stage, error.kind(), error.to_string())
    }

    /// Same-domain links of `base_url`, or the reason there are none
    pub async fn discover(&self, base_url: &str) -> Result<CrawlFrontier, Warning> {
        let html = self
            .fetcher
            .fetch(base_url, &self.settings.discovery_wait, self.settings.wait_timeout)
            .await
            .map_err(|e| Self::fetch_warning(base_url, PipelineStage::Discovery, &e))?;

        self.discoverer.discover(&html, base_url).map_err(|e| {
            warn!(url = %base_url, kind = "parse", "Link discovery failed: {}", e);
            Warning::new(base_url, PipelineStage::Discovery, "parse", e.to_string())
        })
    }

    /// Records of one page, or the reason there are none
    pub async fn extract(&self, url: &str, mode: &ExtractionMode) -> Result<Vec<ExtractedRecord>, Warning> {
        let html = self
            .fetcher
            .fetch(url, &self.settings.extraction_wait, self.settings.wait_timeout)
            .await
            .map_err(|e| Self::fetch_warning(url, PipelineStage::Extraction, &e))?;

        self.extractor.extract(&html, url, mode).map_err(|e| {
            warn!(url = %url, kind = "parse", "Extraction failed: {}", e);
            Warning::new(url, PipelineStage::Extraction, "parse", e.to_string())
        })
    }

    /// Execute one run. Never fails: problems end up in `warnings`.
    pub async fn run(&self, request: &PipelineRequest) -> PipelineResponse {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline_run", run_id = %run_id, url = %request.url, mode = %request.mode);

        async {
            info!("🚀 Pipeline started (crawl sub-pages: {})", request.crawl_subpages);

            let mut response = PipelineResponse::default();
            let mut batches = Vec::new();

            if request.crawl_subpages {
                match self.discover(&request.url).await {
                    Ok(frontier) => {
                        info!("🔍 Discovered {} internal links", frontier.len());
                        response.frontier = frontier;
                    }
                    Err(warning) => response.warnings.push(warning),
                }
            }

            let subpages = response.frontier.first(self.settings.max_subpages).to_vec();
            let total_subpages = subpages.len();
            let targets = std::iter::once(request.url.clone()).chain(subpages);

            for (index, url) in targets.enumerate() {
                if index > 0 {
                    info!("Crawling link {}/{}: {}", index, total_subpages, url);
                }
                match self.extract(&url, &request.mode).await {
                    Ok(records) => {
                        batches.push(records);
                        response.pages_fetched.push(url);
                    }
                    Err(warning) => response.warnings.push(warning),
                }
            }

            response.result = aggregate(batches);

            if response.result.is_empty() {
                info!("Pipeline finished without records ({} warnings)", response.warnings.len());
            } else {
                info!(
                    "✅ Extraction complete! Found {} records ({} warnings)",
                    response.result.len(),
                    response.warnings.len()
                );
            }

            response
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_default_config() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.extraction_wait, WaitCondition::ElementPresent("body".to_string()));
        assert_eq!(settings.discovery_wait, WaitCondition::Delay(Duration::from_secs(2)));
        assert_eq!(settings.wait_timeout, Duration::from_secs(5));
        assert_eq!(settings.max_subpages, 3);
    }

    #[test]
    fn test_settings_cap_subpages() {
        let mut config = AppConfig::default();
        config.crawl.max_subpages = 10;
        assert_eq!(PipelineSettings::from_config(&config).max_subpages, 3);
    }
}
