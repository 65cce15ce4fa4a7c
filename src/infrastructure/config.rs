//! Configuration infrastructure
//!
//! Contains configuration loading and management for the scraper.
//!
//! Configuration is resolved in three layers:
//! 1. Built-in defaults (the `defaults` module)
//! 2. The JSON config file in the user config directory (optional)
//! 3. Environment variables prefixed with `OMG_SCRAPER__`

#![allow(clippy::uninlined_format_args)]

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use anyhow::{Context, Result};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Page fetching (browser or static HTTP)
    pub fetcher: FetcherConfig,

    /// Content extraction tuning
    pub extraction: ExtractionConfig,

    /// Sub-page crawling
    pub crawl: CrawlConfig,

    /// PDF report layout
    pub report: ReportConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Which page fetcher implementation to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetcherBackend {
    /// Headless Chromium, renders JavaScript
    #[default]
    Browser,
    /// Plain HTTP GET, no JavaScript
    Static,
}

impl fmt::Display for FetcherBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Browser => f.write_str("browser"),
            Self::Static => f.write_str("static"),
        }
    }
}

impl FromStr for FetcherBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "browser" | "chromium" => Ok(Self::Browser),
            "static" | "http" => Ok(Self::Static),
            other => Err(ConfigError::Validation {
                message: format!("unknown fetcher backend '{}', expected browser or static", other),
            }),
        }
    }
}

/// Page fetcher settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Fetcher implementation
    pub backend: FetcherBackend,

    /// Explicit Chromium binary; auto-detected when unset
    pub chrome_executable: Option<PathBuf>,

    /// Extra command line flags passed to Chromium
    pub browser_args: Vec<String>,

    /// Element that must be present before the page is read
    pub wait_selector: String,

    /// How long to wait for `wait_selector`
    pub wait_timeout_seconds: u64,

    /// Settle delay before reading a page during link discovery
    pub discovery_delay_ms: u64,

    /// Navigation timeout
    pub navigation_timeout_seconds: u64,

    /// Polling interval while waiting for an element
    pub poll_interval_ms: u64,

    /// User agent for the static fetcher
    pub user_agent: String,

    /// Follow redirects in the static fetcher
    pub follow_redirects: bool,
}

/// Content extraction settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Text shorter than or equal to this many characters is skipped
    pub min_text_length: usize,

    /// Tags scanned by the CSS selector mode for the "everything" target
    pub default_text_tags: Vec<String>,

    /// Tags searched by the keyword mode
    pub keyword_tags: Vec<String>,
}

/// Sub-page crawl settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Internal links followed when crawling is enabled (at most 3)
    pub max_subpages: usize,
}

/// PDF report layout settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Title printed at the top of the first page
    pub title: String,

    pub page_width_mm: f32,

    pub page_height_mm: f32,

    /// Left, right and top margin
    pub margin_mm: f32,

    /// A new page starts once the cursor passes this distance from the top
    pub page_break_threshold_mm: f32,
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted file logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Enable automatic log cleanup on startup
    pub auto_cleanup_logs: bool,

    /// Module-specific log level filters (e.g., "chromiumoxide": "warn")
    pub module_filters: HashMap<String, String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            backend: FetcherBackend::default(),
            chrome_executable: None,
            browser_args: defaults::BROWSER_ARGS.iter().map(|s| s.to_string()).collect(),
            wait_selector: defaults::WAIT_SELECTOR.to_string(),
            wait_timeout_seconds: defaults::WAIT_TIMEOUT_SECONDS,
            discovery_delay_ms: defaults::DISCOVERY_DELAY_MS,
            navigation_timeout_seconds: defaults::NAVIGATION_TIMEOUT_SECONDS,
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
            user_agent: defaults::USER_AGENT.to_string(),
            follow_redirects: true,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_text_length: defaults::MIN_TEXT_LENGTH,
            default_text_tags: defaults::DEFAULT_TEXT_TAGS.iter().map(|s| s.to_string()).collect(),
            keyword_tags: defaults::KEYWORD_TAGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_subpages: defaults::MAX_SUBPAGES,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: defaults::REPORT_TITLE.to_string(),
            page_width_mm: defaults::PAGE_WIDTH_MM,
            page_height_mm: defaults::PAGE_HEIGHT_MM,
            margin_mm: defaults::PAGE_MARGIN_MM,
            page_break_threshold_mm: defaults::PAGE_BREAK_THRESHOLD_MM,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            max_files: defaults::LOG_MAX_FILES,
            auto_cleanup_logs: defaults::LOG_AUTO_CLEANUP,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("chromiumoxide".to_string(), "warn".to_string());
                filters.insert("tungstenite".to_string(), "warn".to_string());
                filters.insert("reqwest".to_string(), "info".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("html5ever".to_string(), "warn".to_string());
                filters.insert("selectors".to_string(), "warn".to_string());
                filters
            },
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration source error: {0}")]
    Source(#[from] ::config::ConfigError),

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

impl AppConfig {
    /// Check values that would make the pipeline misbehave.
    ///
    /// `crawl.max_subpages` above the cap is clamped rather than rejected.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.fetcher.wait_timeout_seconds == 0 {
            return Err(ConfigError::Validation {
                message: "fetcher.wait_timeout_seconds must be greater than 0".to_string(),
            });
        }

        if self.fetcher.navigation_timeout_seconds == 0 {
            return Err(ConfigError::Validation {
                message: "fetcher.navigation_timeout_seconds must be greater than 0".to_string(),
            });
        }

        if self.fetcher.wait_selector.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "fetcher.wait_selector must not be empty".to_string(),
            });
        }

        if self.report.page_width_mm <= 0.0 || self.report.page_height_mm <= 0.0 {
            return Err(ConfigError::Validation {
                message: "report page size must be positive".to_string(),
            });
        }

        if self.report.page_break_threshold_mm >= self.report.page_height_mm
            || self.report.page_break_threshold_mm <= self.report.margin_mm
        {
            return Err(ConfigError::Validation {
                message: format!(
                    "report.page_break_threshold_mm must lie between the top margin ({}) and the page height ({})",
                    self.report.margin_mm, self.report.page_height_mm
                ),
            });
        }

        if self.crawl.max_subpages > defaults::MAX_SUBPAGES {
            warn!(
                "crawl.max_subpages = {} exceeds the cap, using {}",
                self.crawl.max_subpages,
                defaults::MAX_SUBPAGES
            );
            self.crawl.max_subpages = defaults::MAX_SUBPAGES;
        }

        Ok(())
    }

    /// Resolve configuration from defaults, an optional JSON file and the environment
    pub fn from_sources(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_sources_with_env(path, None)
    }

    /// Like [`AppConfig::from_sources`] with an explicit environment map.
    ///
    /// Passing `None` reads the process environment.
    pub fn from_sources_with_env(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder()
            .add_source(::config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Json)
                    .required(false),
            );
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix(defaults::ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(defaults::APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Create a configuration manager pointing at the default config file
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join(defaults::CONFIG_FILE_NAME);
        Ok(Self { config_path })
    }

    /// Create a configuration manager for an explicit file
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Load configuration, falling back to defaults when the file is unusable.
    ///
    /// A file that fails to parse or validate is copied aside with a
    /// `.corrupted` extension and replaced by the defaults.
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !fs::try_exists(&self.config_path).await.unwrap_or(false) {
            info!("Configuration file not found, using defaults: {:?}", self.config_path);
            return Ok(AppConfig::from_sources(None)?);
        }

        match AppConfig::from_sources(Some(self.config_path.as_path())) {
            Ok(config) => {
                info!("Loaded configuration from: {:?}", self.config_path);
                Ok(config)
            }
            Err(load_error) => {
                warn!("⚠️  Configuration load failed: {}", load_error);
                warn!("⚠️  Resetting to default configuration");

                let backup_path = self.config_path.with_extension("json.corrupted");
                if let Err(e) = fs::copy(&self.config_path, &backup_path).await {
                    warn!("Failed to create backup of corrupted config: {}", e);
                } else {
                    info!("Backed up corrupted config to: {:?}", backup_path);
                }

                self.reset_to_defaults().await
            }
        }
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Reset configuration to defaults (useful for troubleshooting)
    pub async fn reset_to_defaults(&self) -> Result<AppConfig> {
        info!("🔄 Resetting configuration to defaults");

        let default_config = AppConfig::default();
        self.save_config(&default_config).await?;

        info!("✅ Configuration reset to defaults");
        Ok(default_config)
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }
}

/// Default configuration values
pub mod defaults {
    /// Directory name under the user config directory
    pub const APP_DIR_NAME: &str = "omg-scraper";

    /// Config file name
    pub const CONFIG_FILE_NAME: &str = "omg_scraper_config.json";

    /// Environment variable prefix; nested keys use `__`
    pub const ENV_PREFIX: &str = "OMG_SCRAPER";

    /// Environment variable pointing at a Chromium binary
    pub const CHROMIUM_PATH_ENV: &str = "OMG_CHROMIUM_PATH";

    // Fetcher defaults
    /// Flags passed to the headless browser
    pub const BROWSER_ARGS: &[&str] = &["--disable-gpu", "--no-sandbox", "--disable-dev-shm-usage"];

    /// Element that signals basic DOM presence
    pub const WAIT_SELECTOR: &str = "body";

    /// Default wait for the DOM presence condition in seconds
    pub const WAIT_TIMEOUT_SECONDS: u64 = 5;

    /// Settle delay before reading a page during link discovery
    pub const DISCOVERY_DELAY_MS: u64 = 2000;

    /// Default navigation timeout in seconds
    pub const NAVIGATION_TIMEOUT_SECONDS: u64 = 30;

    /// Polling interval while waiting for an element
    pub const POLL_INTERVAL_MS: u64 = 100;

    /// User agent of the static fetcher
    pub const USER_AGENT: &str = "omg-scraper/0.1 (+https://github.com/omg-scraper)";

    // Extraction defaults
    /// Minimum text length (exclusive) for the CSS selector mode
    pub const MIN_TEXT_LENGTH: usize = 10;

    /// Tags scanned for the "everything" target
    pub const DEFAULT_TEXT_TAGS: &[&str] = &["p", "h1", "h2", "h3", "li", "td"];

    /// Tags searched by the keyword mode
    pub const KEYWORD_TAGS: &[&str] = &["p", "li", "td", "h1", "h2"];

    // Crawl defaults
    /// Internal links followed when crawling; also the hard cap
    pub const MAX_SUBPAGES: usize = 3;

    // Report defaults
    pub const REPORT_TITLE: &str = "OMG Universal Data Pipeline Report";

    /// A4 portrait
    pub const PAGE_WIDTH_MM: f32 = 210.0;
    pub const PAGE_HEIGHT_MM: f32 = 297.0;

    pub const PAGE_MARGIN_MM: f32 = 10.0;

    pub const PAGE_BREAK_THRESHOLD_MM: f32 = 250.0;

    pub const PDF_LAYER_NAME: &str = "Layer 1";

    // Log configuration defaults
    /// Default log level
    pub const LOG_LEVEL: &str = "info";

    /// Default JSON format setting
    pub const LOG_JSON_FORMAT: bool = false;

    /// Default console output setting
    pub const LOG_CONSOLE_OUTPUT: bool = true;

    /// Default file output setting
    pub const LOG_FILE_OUTPUT: bool = true;

    /// Default maximum log files to keep
    pub const LOG_MAX_FILES: u32 = 5;

    /// Default auto cleanup logs setting
    pub const LOG_AUTO_CLEANUP: bool = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.crawl.max_subpages, 3);
        assert_eq!(config.extraction.min_text_length, 10);
        assert_eq!(config.fetcher.wait_selector, "body");
    }

    #[test]
    fn test_max_subpages_is_clamped() {
        let mut config = AppConfig::default();
        config.crawl.max_subpages = 10;
        config.validate().unwrap();
        assert_eq!(config.crawl.max_subpages, 3);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut config = AppConfig::default();
        config.fetcher.wait_timeout_seconds = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_threshold_beyond_page_is_rejected() {
        let mut config = AppConfig::default();
        config.report.page_break_threshold_mm = 400.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_environment_overrides_defaults() {
        let mut env = HashMap::new();
        env.insert("OMG_SCRAPER__FETCHER__WAIT_TIMEOUT_SECONDS".to_string(), "12".to_string());
        env.insert("OMG_SCRAPER__FETCHER__BACKEND".to_string(), "static".to_string());

        let config = AppConfig::from_sources_with_env(None, Some(env)).unwrap();
        assert_eq!(config.fetcher.wait_timeout_seconds, 12);
        assert_eq!(config.fetcher.backend, FetcherBackend::Static);
        assert_eq!(config.crawl.max_subpages, 3);
    }

    #[test]
    fn test_fetcher_backend_from_str() {
        assert_eq!("Browser".parse::<FetcherBackend>().unwrap(), FetcherBackend::Browser);
        assert_eq!("http".parse::<FetcherBackend>().unwrap(), FetcherBackend::Static);
        assert!("selenium".parse::<FetcherBackend>().is_err());
    }
}
