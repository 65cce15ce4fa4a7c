//! Headless Chromium page fetcher
//!
//! Every call launches its own browser process on a throwaway profile
//! directory, navigates, waits for the requested condition and serializes
//! the DOM. The browser lives inside a [`BrowserGuard`] so the process, its
//! CDP handler task and the profile are released on every exit path.

#![allow(clippy::uninlined_format_args)]

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, warn};

use crate::infrastructure::config::{FetcherConfig, defaults};
use crate::infrastructure::fetcher::{FetchError, FetchResult, PageFetcher, WaitCondition};

/// Prefix of the per-call Chromium profile directories
const PROFILE_DIR_PREFIX: &str = "omg-scraper-profile-";

/// Binaries looked up on PATH when no explicit path is configured
const CHROMIUM_BINARIES: &[&str] = &["google-chrome", "chromium", "chromium-browser"];

/// Find the Chromium binary.
///
/// Resolution order: configured path, `OMG_CHROMIUM_PATH`, then the usual
/// binary names on PATH. `None` lets chromiumoxide run its own detection.
pub fn find_chromium(configured: Option<&PathBuf>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Some(path.clone());
        }
        warn!("Configured Chromium path does not exist: {:?}", path);
    }

    if let Ok(p) = std::env::var(defaults::CHROMIUM_PATH_ENV) {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
        warn!("{} points to a missing file: {}", defaults::CHROMIUM_PATH_ENV, p);
    }

    CHROMIUM_BINARIES
        .iter()
        .find_map(|name| which::which(name).ok())
}

/// Empty profile directory for one browser launch, removed on drop
fn create_profile() -> FetchResult<TempDir> {
    tempfile::Builder::new()
        .prefix(PROFILE_DIR_PREFIX)
        .tempdir()
        .map_err(|e| FetchError::launch(format!("could not create browser profile: {}", e)))
}

/// Fetcher backed by a fresh headless Chromium per call
#[derive(Debug, Clone)]
pub struct BrowserFetcher {
    chrome_executable: Option<PathBuf>,
    browser_args: Vec<String>,
    navigation_timeout: Duration,
    poll_interval: Duration,
}

impl BrowserFetcher {
    pub fn from_config(config: &FetcherConfig) -> Self {
        let chrome_executable = find_chromium(config.chrome_executable.as_ref());
        match &chrome_executable {
            Some(path) => info!("Using Chromium binary: {:?}", path),
            None => debug!("No Chromium binary resolved, relying on driver auto-detection"),
        }

        Self {
            chrome_executable,
            browser_args: config.browser_args.clone(),
            navigation_timeout: Duration::from_secs(config.navigation_timeout_seconds),
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
        }
    }

    /// Launch configuration running on the given profile directory.
    ///
    /// chromiumoxide otherwise shares one fixed profile across launches.
    fn browser_config(&self, profile: &Path) -> FetchResult<BrowserConfig> {
        let mut builder = BrowserConfig::builder().user_data_dir(profile);
        if let Some(path) = &self.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        for arg in &self.browser_args {
            builder = builder.arg(arg.as_str());
        }
        builder.build().map_err(FetchError::launch)
    }

    async fn open_page(&self, browser: &Browser, url: &str) -> FetchResult<Page> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::navigation(url, e))?;

        match timeout(self.navigation_timeout, page.goto(url)).await {
            Ok(Ok(_)) => Ok(page),
            Ok(Err(e)) => Err(FetchError::navigation(url, e)),
            Err(_) => Err(FetchError::navigation(
                url,
                format!("navigation timed out after {}s", self.navigation_timeout.as_secs()),
            )),
        }
    }

    async fn wait_until_ready(
        &self,
        page: &Page,
        url: &str,
        wait: &WaitCondition,
        wait_timeout: Duration,
    ) -> FetchResult<()> {
        match wait {
            WaitCondition::Delay(delay) => {
                sleep(*delay).await;
                Ok(())
            }
            WaitCondition::ElementPresent(selector) => {
                let deadline = Instant::now() + wait_timeout;
                loop {
                    if page.find_element(selector.as_str()).await.is_ok() {
                        return Ok(());
                    }
                    if Instant::now() >= deadline {
                        return Err(FetchError::timeout(url, wait, wait_timeout));
                    }
                    sleep(self.poll_interval).await;
                }
            }
        }
    }

    async fn render(
        &self,
        browser: &Browser,
        url: &str,
        wait: &WaitCondition,
        wait_timeout: Duration,
    ) -> FetchResult<String> {
        let page = self.open_page(browser, url).await?;
        self.wait_until_ready(&page, url, wait, wait_timeout).await?;
        page.content().await.map_err(|e| FetchError::body(url, e))
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str, wait: &WaitCondition, wait_timeout: Duration) -> FetchResult<String> {
        debug!("Launching browser for {} (wait for {})", url, wait);
        let profile = create_profile()?;
        let config = self.browser_config(profile.path())?;
        let mut guard = BrowserGuard::launch(config, profile).await?;

        let result = match guard.browser() {
            Some(browser) => self.render(browser, url, wait, wait_timeout).await,
            None => Err(FetchError::launch("browser already released")),
        };

        guard.release().await;

        if let Ok(html) = &result {
            debug!("Fetched {} ({} bytes)", url, html.len());
        }
        result
    }
}

/// Poll the CDP handler until its connection closes.
///
/// The handler also yields recoverable errors (e.g. CDP messages it cannot
/// deserialize); they are logged and the loop keeps going. Returns the
/// number of events seen.
async fn drain_events<S, E>(events: &mut S) -> usize
where
    S: Stream<Item = Result<(), E>> + Unpin,
    E: std::fmt::Display,
{
    let mut seen = 0;
    while let Some(event) = events.next().await {
        seen += 1;
        if let Err(e) = event {
            debug!("CDP handler error: {}", e);
        }
    }
    seen
}

/// Owns one browser process, its CDP event loop and its profile directory
struct BrowserGuard {
    browser: Option<Browser>,
    handler_task: Option<JoinHandle<()>>,
    profile: Option<TempDir>,
}

impl BrowserGuard {
    async fn launch(config: BrowserConfig, profile: TempDir) -> FetchResult<Self> {
        let (browser, mut handler) = Browser::launch(config).await.map_err(FetchError::launch)?;

        let handler_task = tokio::spawn(async move {
            drain_events(&mut handler).await;
        });

        Ok(Self {
            browser: Some(browser),
            handler_task: Some(handler_task),
            profile: Some(profile),
        })
    }

    fn browser(&self) -> Option<&Browser> {
        self.browser.as_ref()
    }

    /// Close the browser, wait for the process to exit and stop the handler
    async fn release(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                debug!("Browser close returned an error: {}", e);
            }
            if let Err(e) = browser.wait().await {
                debug!("Waiting for browser exit failed: {}", e);
            }
        }
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
        if let Some(profile) = self.profile.take() {
            let path = profile.path().to_path_buf();
            if let Err(e) = profile.close() {
                debug!("Failed to remove browser profile {:?}: {}", path, e);
            }
        }
    }
}

impl Drop for BrowserGuard {
    fn drop(&mut self) {
        // Reached only when `release` did not run, e.g. the future was cancelled.
        // Dropping the browser kills its child process.
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
        if self.browser.take().is_some() {
            warn!("Browser dropped without being closed");
        }
    }
}
