//! Parsing and request validation error types
//!
//! These errors are raised where operator input is turned into typed
//! requests (URL, mode, target) and where HTML is interpreted. Malformed
//! DOM is never an error: it simply yields fewer matches.

use thiserror::Error;

use crate::domain::mode::ModeKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Please enter a URL")]
    EmptyUrl,

    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Unknown extraction mode: {value}")]
    UnknownMode { value: String },

    #[error("{mode} requires a target: {prompt}")]
    MissingTarget { mode: String, prompt: String },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },
}

impl ParsingError {
    /// Missing target error carrying the prompt the operator should answer
    pub fn missing_target(kind: ModeKind) -> Self {
        Self::MissingTarget {
            mode: kind.label().to_string(),
            prompt: kind.target_prompt().unwrap_or_default().to_string(),
        }
    }

    pub fn invalid_url(url: &str, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for parsing operations
pub type ParsingResult<T> = Result<T, ParsingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_target_carries_prompt() {
        let err = ParsingError::missing_target(ModeKind::KeywordSearch);
        assert_eq!(err.to_string(), "Keyword Search requires a target: Enter Keyword");
    }

    #[test]
    fn test_empty_url_message() {
        assert_eq!(ParsingError::EmptyUrl.to_string(), "Please enter a URL");
    }
}
