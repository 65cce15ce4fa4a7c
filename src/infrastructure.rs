//! Infrastructure layer for page fetching, parsing, reporting and the ambient stack
//!
//! This module provides the browser and HTTP fetchers, HTML parsing,
//! report rendering, configuration and logging.

pub mod browser_fetcher;
pub mod config; // Configuration loading and defaults
pub mod fetcher; // PageFetcher seam
pub mod http_client;
pub mod logging; // Logging infrastructure
pub mod parsing;
pub mod parsing_error;
pub mod report;

// Re-export commonly used items
pub use browser_fetcher::BrowserFetcher;
pub use config::{AppConfig, ConfigError, ConfigManager, FetcherBackend};
pub use fetcher::{FetchError, FetchResult, PageFetcher, WaitCondition};
pub use http_client::StaticFetcher;
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use parsing::{ContentExtractor, ExtractionSettings, LinkDiscoverer, ParsingError, ParsingResult};
pub use report::{ExportFormat, ReportError, ReportGenerator};
