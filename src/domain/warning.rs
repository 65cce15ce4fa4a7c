//! Non-fatal problems surfaced to the operator

use std::fmt;

use serde::Serialize;

/// Pipeline step that raised a warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineStage {
    Discovery,
    Extraction,
}

/// A failure that was caught at its origin and downgraded.
///
/// The pipeline keeps going with an empty result for the affected URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub url: String,
    pub stage: PipelineStage,
    /// Short error class, e.g. `timeout` or `navigation`
    pub kind: String,
    pub message: String,
}

impl Warning {
    pub fn new(url: &str, stage: PipelineStage, kind: &str, message: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            stage,
            kind: kind.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            PipelineStage::Discovery => write!(f, "Discovery Error: {}", self.message),
            PipelineStage::Extraction => write!(f, "Failed to extract {}: {}", self.url, self.message),
        }
    }
}
