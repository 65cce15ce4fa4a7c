//! Presentation-facing commands
//!
//! [`Session`] holds the only mutable state of the program: the response of
//! the latest run. Each run replaces it, and exports always render from it.

#![allow(clippy::uninlined_format_args)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tokio::fs;
use tracing::info;

use crate::application::dto::{PipelineRequest, PipelineResponse, RunSummary};
use crate::application::pipeline::{PipelineRunner, PipelineSettings};
use crate::infrastructure::browser_fetcher::BrowserFetcher;
use crate::infrastructure::config::{AppConfig, FetcherBackend, FetcherConfig};
use crate::infrastructure::fetcher::PageFetcher;
use crate::infrastructure::http_client::StaticFetcher;
use crate::infrastructure::report::{ExportFormat, ReportGenerator};

/// Build the page fetcher selected in the configuration
pub fn create_fetcher(config: &FetcherConfig) -> Result<Arc<dyn PageFetcher>> {
    let fetcher: Arc<dyn PageFetcher> = match config.backend {
        FetcherBackend::Browser => Arc::new(BrowserFetcher::from_config(config)),
        FetcherBackend::Static => {
            Arc::new(StaticFetcher::from_fetcher_config(config).context("Failed to create static fetcher")?)
        }
    };
    info!("Using {} fetcher", config.backend);
    Ok(fetcher)
}

/// One rendered export, ready to be saved or offered for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub format: ExportFormat,
    pub file_name: &'static str,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
struct CompletedRun {
    request: PipelineRequest,
    response: PipelineResponse,
}

/// Operator session
pub struct Session {
    runner: PipelineRunner,
    reports: ReportGenerator,
    current: Option<CompletedRun>,
}

impl Session {
    pub const fn new(runner: PipelineRunner, reports: ReportGenerator) -> Self {
        Self {
            runner,
            reports,
            current: None,
        }
    }

    /// Session wired from configuration with the configured fetcher
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let fetcher = create_fetcher(&config.fetcher)?;
        Self::with_fetcher(config, fetcher)
    }

    /// Session wired from configuration with an explicit fetcher
    pub fn with_fetcher(config: &AppConfig, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        let runner = PipelineRunner::new(fetcher, PipelineSettings::from_config(config))
            .context("Invalid extraction settings")?;
        Ok(Self::new(runner, ReportGenerator::from_config(&config.report)))
    }

    /// Run the pipeline and make its response the current one
    pub async fn run(&mut self, request: PipelineRequest) -> &PipelineResponse {
        let response = self.runner.run(&request).await;
        let run = self.current.insert(CompletedRun { request, response });
        &run.response
    }

    pub fn current(&self) -> Option<&PipelineResponse> {
        self.current.as_ref().map(|run| &run.response)
    }

    pub fn current_request(&self) -> Option<&PipelineRequest> {
        self.current.as_ref().map(|run| &run.request)
    }

    /// Dashboard metrics of the current run
    pub fn summary(&self) -> Option<RunSummary> {
        self.current
            .as_ref()
            .map(|run| RunSummary::new(&run.request.url, &run.response))
    }

    /// Render the current result in `format`
    pub fn export(&self, format: ExportFormat) -> Result<Artifact> {
        let run = self.current.as_ref().ok_or_else(|| anyhow!("No pipeline result to export"))?;
        let bytes = self
            .reports
            .render(&run.response.result, format)
            .with_context(|| format!("Failed to render {} export", format))?;

        Ok(Artifact {
            format,
            file_name: format.file_name(),
            mime_type: format.mime_type(),
            bytes,
        })
    }

    /// Write the requested exports of the current result into `dir`
    pub async fn write_artifacts(&self, dir: &Path, formats: &[ExportFormat]) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create output directory {:?}", dir))?;

        let mut written = Vec::with_capacity(formats.len());
        for &format in formats {
            let artifact = self.export(format)?;
            let path = dir.join(artifact.file_name);
            fs::write(&path, &artifact.bytes)
                .await
                .with_context(|| format!("Failed to write {:?}", path))?;
            info!("Wrote {} ({}, {} bytes)", path.display(), artifact.mime_type, artifact.bytes.len());
            written.push(path);
        }

        Ok(written)
    }
}
