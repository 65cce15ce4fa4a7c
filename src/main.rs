#![allow(missing_docs)]
#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use tracing::{error, warn};

use omg_scraper_lib::application::dto::{NO_DATA_MESSAGE, PipelineRequest};
use omg_scraper_lib::commands::Session;
use omg_scraper_lib::domain::mode::ModeKind;
use omg_scraper_lib::domain::record::PipelineResult;
use omg_scraper_lib::infrastructure::config::{AppConfig, ConfigManager, FetcherBackend};
use omg_scraper_lib::infrastructure::logging::{init_logging_with_config, log_system_info};
use omg_scraper_lib::infrastructure::report::ExportFormat;

/// Rows printed in the data snapshot
const SNAPSHOT_ROWS: usize = 10;

/// OMG Scraper: fetch a page, extract records, export CSV, JSON and PDF
#[derive(Parser, Debug)]
#[command(name = "omg-scraper", version, about)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the extraction pipeline against a URL
    Run(RunArgs),

    /// Inspect or reset the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum ConfigAction {
    /// Print the effective configuration as JSON
    Show,
    /// Print the configuration file path
    Path,
    /// Overwrite the configuration file with defaults
    Reset,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Target URL
    url: String,

    /// Extraction mode: css-selector, file-discovery, metadata,
    /// keyword-search, image-scraper or table-extractor
    #[arg(long, short)]
    mode: ModeKind,

    /// Selector ("everything" for common text tags), extensions (".pdf,.zip") or keyword
    #[arg(long, short)]
    target: Option<String>,

    /// Also extract the first three internal links
    #[arg(long)]
    crawl: bool,

    /// Directory the exports are written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Which exports to write
    #[arg(long, value_enum, default_value_t = FormatArg::All)]
    format: FormatArg,

    /// Page fetcher: browser (headless Chromium) or static (plain HTTP)
    #[arg(long)]
    fetcher: Option<FetcherBackend>,

    /// Seconds to wait for a page to become ready
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum FormatArg {
    Csv,
    Json,
    Pdf,
    All,
}

impl FormatArg {
    fn formats(self) -> Vec<ExportFormat> {
        match self {
            Self::Csv => vec![ExportFormat::Csv],
            Self::Json => vec![ExportFormat::Json],
            Self::Pdf => vec![ExportFormat::Pdf],
            Self::All => ExportFormat::ALL.to_vec(),
        }
    }
}

fn config_manager(path: Option<&PathBuf>) -> Result<ConfigManager> {
    match path {
        Some(path) => Ok(ConfigManager::with_path(path)),
        None => ConfigManager::new(),
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(width.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

fn print_snapshot(result: &PipelineResult) {
    println!("\nProcessed Data Snapshot");
    println!("{:<14} {:<60} {:<40} {:<6}", "type", "payload", "source", "node");
    for record in result.iter().take(SNAPSHOT_ROWS) {
        println!(
            "{:<14} {:<60} {:<40} {:<6}",
            record.record_type().label(),
            truncate(record.payload(), 60),
            truncate(record.source(), 40),
            record.node()
        );
    }
    if result.len() > SNAPSHOT_ROWS {
        println!("... {} more rows", result.len() - SNAPSHOT_ROWS);
    }
}

async fn run_pipeline(config: AppConfig, args: RunArgs) -> Result<()> {
    let request = match PipelineRequest::new(&args.url, args.mode.label(), args.target.as_deref(), args.crawl) {
        Ok(request) => request,
        Err(e) => Cli::command().error(ErrorKind::InvalidValue, e).exit(),
    };

    let mut session = Session::from_config(&config)?;
    let response = session.run(request).await;

    for warning in &response.warnings {
        eprintln!("WARNING: {}", warning);
    }

    if response.is_empty() {
        println!("{}", NO_DATA_MESSAGE);
        return Ok(());
    }

    println!("Extraction complete! Found {} records.", response.result.len());
    print_snapshot(&response.result);

    if let Some(summary) = session.summary() {
        println!("\n{}", summary);
    }

    let written = session.write_artifacts(&args.out_dir, &args.format.formats()).await?;
    println!("\nStructured exports:");
    for path in written {
        println!("  {}", path.display());
    }

    Ok(())
}

async fn run_config_action(manager: &ConfigManager, config: &AppConfig, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(config).context("Failed to serialize configuration")?);
        }
        ConfigAction::Path => println!("{}", manager.config_path().display()),
        ConfigAction::Reset => {
            manager.reset_to_defaults().await?;
            println!("Configuration reset: {}", manager.config_path().display());
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = config_manager(cli.config.as_ref())?;
    let mut config = manager.load_config().await?;

    if let Command::Run(args) = &cli.command {
        if let Some(backend) = args.fetcher {
            config.fetcher.backend = backend;
        }
        if let Some(timeout) = args.timeout {
            config.fetcher.wait_timeout_seconds = timeout;
        }
        if let Err(e) = config.validate() {
            Cli::command().error(ErrorKind::InvalidValue, e).exit();
        }
    }

    if let Err(e) = init_logging_with_config(&config.logging) {
        eprintln!("Logging disabled: {}", e);
    } else {
        log_system_info();
    }

    let result = match cli.command {
        Command::Run(args) => run_pipeline(config, args).await,
        Command::Config { action } => run_config_action(&manager, &config, action).await,
    };

    if let Err(e) = &result {
        error!("{:#}", e);
        warn!("Pipeline aborted");
    }
    result
}
