//! Static HTTP page fetcher
//!
//! Plain GET requests without JavaScript rendering. Useful when no
//! Chromium binary is available or the target pages are server-rendered.

#![allow(clippy::uninlined_format_args)]

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use scraper::{Html, Selector};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::infrastructure::config::FetcherConfig;
use crate::infrastructure::fetcher::{FetchError, FetchResult, PageFetcher, WaitCondition};

/// Configuration for HTTP client behavior
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// Whether to follow redirects
    pub follow_redirects: bool,
}

impl HttpClientConfig {
    pub fn from_fetcher_config(config: &FetcherConfig) -> Self {
        Self {
            timeout_seconds: config.navigation_timeout_seconds,
            user_agent: config.user_agent.clone(),
            follow_redirects: config.follow_redirects,
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from_fetcher_config(&FetcherConfig::default())
    }
}

/// Fetcher that issues one HTTP GET per page
#[derive(Clone)]
pub struct StaticFetcher {
    client: Client,
    config: HttpClientConfig,
}

impl StaticFetcher {
    pub fn from_fetcher_config(config: &FetcherConfig) -> FetchResult<Self> {
        Self::with_config(HttpClientConfig::from_fetcher_config(config))
    }

    pub fn with_config(config: HttpClientConfig) -> FetchResult<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .gzip(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .map_err(|e| FetchError::launch(format!("failed to create HTTP client: {}", e)))?;

        info!("Static fetcher ready (timeout {}s)", config.timeout_seconds);
        Ok(Self { client, config })
    }

    pub const fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    async fn get_text(&self, url: &str) -> FetchResult<String> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::navigation(url, format!("request timed out after {}s", self.config.timeout_seconds))
            } else {
                FetchError::navigation(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::body(url, e))
    }
}

/// Whether the document contains an element matching `selector`.
///
/// An unparsable selector can never be satisfied.
fn contains_element(html: &str, selector: &str) -> bool {
    Selector::parse(selector).is_ok_and(|selector| Html::parse_document(html).select(&selector).next().is_some())
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str, wait: &WaitCondition, wait_timeout: Duration) -> FetchResult<String> {
        debug!("GET {}", url);
        let html = self.get_text(url).await?;

        match wait {
            WaitCondition::Delay(delay) => sleep(*delay).await,
            WaitCondition::ElementPresent(selector) => {
                // Without a script engine the document never changes, so one check is final.
                if !contains_element(&html, selector) {
                    return Err(FetchError::timeout(url, wait, wait_timeout));
                }
            }
        }

        debug!("Fetched {} ({} bytes)", url, html.len());
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_config_from_fetcher_config() {
        let fetcher_config = FetcherConfig {
            navigation_timeout_seconds: 7,
            follow_redirects: false,
            ..FetcherConfig::default()
        };
        let config = HttpClientConfig::from_fetcher_config(&fetcher_config);
        assert_eq!(config.timeout_seconds, 7);
        assert!(!config.follow_redirects);
        assert_eq!(config.user_agent, fetcher_config.user_agent);
    }

    #[test]
    fn test_contains_element() {
        let html = "<html><body><div id='app'>hi</div></body></html>";
        assert!(contains_element(html, "body"));
        assert!(contains_element(html, "#app"));
        assert!(!contains_element(html, ".missing"));
        assert!(!contains_element(html, "<<<"));
    }

    #[tokio::test]
    async fn test_static_fetcher_creation() {
        let fetcher = StaticFetcher::with_config(HttpClientConfig::default());
        assert!(fetcher.is_ok());
    }
}
