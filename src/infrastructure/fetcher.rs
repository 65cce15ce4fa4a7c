//! Page fetching abstraction
//!
//! The pipeline only ever needs one thing from the outside world: the HTML
//! of a page once it is ready to be read. [`PageFetcher`] is that seam.
//! The browser and static HTTP implementations live in their own modules,
//! and tests plug in an in-memory stub.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Condition that makes a page ready to be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitCondition {
    /// Wait until an element matching this CSS selector exists
    ElementPresent(String),
    /// Wait a fixed amount of time after navigation
    Delay(Duration),
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ElementPresent(selector) => write!(f, "element '{selector}'"),
            Self::Delay(delay) => write!(f, "delay {}ms", delay.as_millis()),
        }
    }
}

/// Errors raised while fetching a page
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Browser could not be launched: {reason}")]
    Launch { reason: String },

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Timed out after {seconds}s waiting for {condition} on {url}")]
    Timeout {
        url: String,
        condition: String,
        seconds: u64,
    },

    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    #[error("Could not read page body of {url}: {reason}")]
    Body { url: String, reason: String },
}

impl FetchError {
    pub fn launch(reason: impl ToString) -> Self {
        Self::Launch {
            reason: reason.to_string(),
        }
    }

    pub fn navigation(url: &str, reason: impl ToString) -> Self {
        Self::Navigation {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn timeout(url: &str, condition: &WaitCondition, timeout: Duration) -> Self {
        Self::Timeout {
            url: url.to_string(),
            condition: condition.to_string(),
            seconds: timeout.as_secs(),
        }
    }

    pub fn body(url: &str, reason: impl ToString) -> Self {
        Self::Body {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Short error class used in warnings and structured log fields
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Launch { .. } => "launch",
            Self::Navigation { .. } => "navigation",
            Self::Timeout { .. } => "timeout",
            Self::Http { .. } => "http",
            Self::Body { .. } => "body",
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Source of ready-to-parse HTML.
///
/// Implementations own every resource they acquire for a call and release
/// it before returning, on success and on failure.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, wait: &WaitCondition, timeout: Duration) -> FetchResult<String>;
}
