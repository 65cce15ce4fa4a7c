//! End-to-end pipeline tests against an in-memory page fetcher
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use omg_scraper_lib::application::dto::PipelineRequest;
use omg_scraper_lib::application::pipeline::{PipelineRunner, PipelineSettings};
use omg_scraper_lib::commands::Session;
use omg_scraper_lib::domain::mode::{ExtractionMode, SelectorTarget};
use omg_scraper_lib::domain::record::RecordType;
use omg_scraper_lib::domain::warning::PipelineStage;
use omg_scraper_lib::infrastructure::config::AppConfig;
use omg_scraper_lib::infrastructure::ParsingError;
use omg_scraper_lib::infrastructure::fetcher::{FetchError, FetchResult, PageFetcher, WaitCondition};
use omg_scraper_lib::infrastructure::report::ExportFormat;

const HOME: &str = "https://site.test/home";

/// Serves canned pages and records every call
#[derive(Default)]
struct StubFetcher {
    pages: HashMap<String, FetchResult<String>>,
    calls: Mutex<Vec<(String, WaitCondition)>>,
}

impl StubFetcher {
    fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), Ok(html.to_string()));
        self
    }

    fn failing(mut self, url: &str, error: FetchError) -> Self {
        self.pages.insert(url.to_string(), Err(error));
        self
    }

    fn calls(&self) -> Vec<(String, WaitCondition)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str, wait: &WaitCondition, _timeout: Duration) -> FetchResult<String> {
        self.calls.lock().unwrap().push((url.to_string(), wait.clone()));
        self.pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::navigation(url, "net::ERR_NAME_NOT_RESOLVED")))
    }
}

fn runner(fetcher: Arc<StubFetcher>) -> PipelineRunner {
    PipelineRunner::new(fetcher, PipelineSettings::default()).unwrap()
}

fn request(mode: &str, target: Option<&str>, crawl: bool) -> PipelineRequest {
    PipelineRequest::new(HOME, mode, target, crawl).unwrap()
}

const HOME_WITH_LINKS: &str = r#"
<html><head><title>Home</title></head><body>
    <p>Welcome to the home page of the site</p>
    <a href="/a">A</a>
    <a href="/b#section">B</a>
    <a href="/a/">A again</a>
    <a href="https://elsewhere.test/x">External</a>
    <a href="/c">C</a>
    <a href="/d">D</a>
    <a href="/home">Self</a>
</body></html>
"#;

fn sub_page(name: &str) -> String {
    format!("<html><head><title>{name}</title></head><body><p>Content of sub page {name}</p></body></html>")
}

#[tokio::test]
async fn metadata_page_without_description() {
    let fetcher = Arc::new(StubFetcher::default().page(HOME, "<html><head><title>Home</title></head><body></body></html>"));
    let response = runner(fetcher).run(&request("Metadata", None, false)).await;

    assert_eq!(response.result.len(), 1);
    let record = &response.result.records()[0];
    assert_eq!(record.record_type(), RecordType::Metadata);
    assert_eq!(record.payload(), "TITLE: Home | DESC: None");
    assert_eq!(record.source(), HOME);
    assert_eq!(record.node(), "head");
    assert!(response.warnings.is_empty());
}

#[tokio::test]
async fn file_discovery_matches_extensions_case_insensitively() {
    let html = r#"<body><a href="report.PDF">Report</a><a href="image.png">Image</a></body>"#;
    let fetcher = Arc::new(StubFetcher::default().page(HOME, html));
    let response = runner(fetcher).run(&request("File Discovery", Some(".pdf,.zip"), false)).await;

    assert_eq!(response.result.len(), 1);
    assert_eq!(response.result.records()[0].payload(), "https://site.test/report.PDF");
    assert_eq!(response.result.records()[0].record_type(), RecordType::FileLink);
}

#[tokio::test]
async fn crawl_follows_first_three_internal_links() {
    let fetcher = Arc::new(
        StubFetcher::default()
            .page(HOME, HOME_WITH_LINKS)
            .page("https://site.test/a", &sub_page("A"))
            .page("https://site.test/b", &sub_page("B"))
            .page("https://site.test/c", &sub_page("C"))
            .page("https://site.test/d", &sub_page("D")),
    );
    let response = runner(fetcher.clone()).run(&request("CSS Selector", Some("everything"), true)).await;

    let frontier: Vec<&str> = response.frontier.iter().collect();
    assert_eq!(
        frontier,
        vec!["https://site.test/a", "https://site.test/b", "https://site.test/c", "https://site.test/d"]
    );
    assert_eq!(
        response.pages_fetched,
        vec![HOME, "https://site.test/a", "https://site.test/b", "https://site.test/c"]
    );

    let payloads: Vec<&str> = response.result.iter().map(|r| r.payload()).collect();
    assert_eq!(
        payloads,
        vec![
            "Welcome to the home page of the site",
            "Content of sub page A",
            "Content of sub page B",
            "Content of sub page C",
        ]
    );

    // Discovery reads the page after a settle delay, extraction waits for <body>
    let calls = fetcher.calls();
    assert_eq!(calls[0], (HOME.to_string(), WaitCondition::Delay(Duration::from_secs(2))));
    assert_eq!(calls[1], (HOME.to_string(), WaitCondition::ElementPresent("body".to_string())));
    assert_eq!(calls.len(), 5);
}

#[tokio::test]
async fn no_discovery_without_crawl() {
    let fetcher = Arc::new(StubFetcher::default().page(HOME, HOME_WITH_LINKS));
    let response = runner(fetcher.clone()).run(&request("Metadata", None, false)).await;

    assert!(response.frontier.is_empty());
    assert_eq!(response.pages_fetched, vec![HOME]);
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test]
async fn every_record_comes_from_a_fetched_page() {
    let fetcher = Arc::new(
        StubFetcher::default()
            .page(HOME, HOME_WITH_LINKS)
            .page("https://site.test/a", &sub_page("A"))
            .failing(
                "https://site.test/b",
                FetchError::Http {
                    url: "https://site.test/b".to_string(),
                    status: 500,
                },
            ),
    );
    let response = runner(fetcher).run(&request("Metadata", None, true)).await;

    for record in &response.result {
        assert!(response.pages_fetched.iter().any(|url| url == record.source()));
    }
    assert_eq!(response.result.len(), 2);
}

#[tokio::test]
async fn failing_primary_page_is_a_warning_not_an_error() {
    let timeout = FetchError::timeout(
        HOME,
        &WaitCondition::ElementPresent("body".to_string()),
        Duration::from_secs(5),
    );
    let fetcher = Arc::new(StubFetcher::default().failing(HOME, timeout));
    let response = runner(fetcher).run(&request("Table Extractor", None, false)).await;

    assert!(response.result.is_empty());
    assert!(response.pages_fetched.is_empty());
    assert_eq!(response.warnings.len(), 1);
    let warning = &response.warnings[0];
    assert_eq!(warning.stage, PipelineStage::Extraction);
    assert_eq!(warning.kind, "timeout");
    assert!(warning.to_string().starts_with(&format!("Failed to extract {HOME}: ")));
}

#[tokio::test]
async fn failing_sub_page_keeps_the_rest() {
    let fetcher = Arc::new(
        StubFetcher::default()
            .page(HOME, HOME_WITH_LINKS)
            .page("https://site.test/a", &sub_page("A"))
            .page("https://site.test/c", &sub_page("C")),
    );
    let response = runner(fetcher).run(&request("Keyword Search", Some("CONTENT"), true)).await;

    let payloads: Vec<&str> = response.result.iter().map(|r| r.payload()).collect();
    assert_eq!(payloads, vec!["Content of sub page A", "Content of sub page C"]);
    assert_eq!(response.warnings.len(), 1);
    assert_eq!(response.warnings[0].url, "https://site.test/b");
    assert_eq!(response.warnings[0].kind, "navigation");
}

#[tokio::test]
async fn discovery_failure_still_extracts_primary_page() {
    // The stub serves the same canned error for both fetches of the primary page
    let fetcher = Arc::new(StubFetcher::default().failing(HOME, FetchError::launch("chrome not found")));
    let response = runner(fetcher).run(&request("Image Scraper", None, true)).await;

    assert_eq!(response.warnings.len(), 2);
    assert_eq!(response.warnings[0].stage, PipelineStage::Discovery);
    assert_eq!(response.warnings[0].to_string(), "Discovery Error: Browser could not be launched: chrome not found");
    assert_eq!(response.warnings[1].stage, PipelineStage::Extraction);
    assert!(response.frontier.is_empty());
}

#[tokio::test]
async fn zero_matches_is_a_success() {
    let fetcher = Arc::new(StubFetcher::default().page(HOME, "<html><body><div>short</div></body></html>"));
    let response = runner(fetcher).run(&request("CSS Selector", Some(".missing"), false)).await;

    assert!(response.is_empty());
    assert!(response.warnings.is_empty());
    assert_eq!(response.pages_fetched, vec![HOME]);
}

#[tokio::test]
async fn duplicate_nodes_collapse_and_whitespace_is_cleaned() {
    let html = "<body><p>Same   paragraph\n text</p><p>Same   paragraph\n text</p></body>";
    let fetcher = Arc::new(StubFetcher::default().page(HOME, html));
    let response = runner(fetcher).run(&request("CSS Selector", Some("p"), false)).await;

    assert_eq!(response.result.len(), 1);
    assert_eq!(response.result.records()[0].payload(), "Same paragraph text");
}

#[tokio::test]
async fn session_replaces_result_and_writes_exports() {
    let fetcher = Arc::new(
        StubFetcher::default()
            .page(HOME, "<html><head><title>Home</title></head><body><img src='/logo.png'></body></html>"),
    );
    let mut session = Session::with_fetcher(&AppConfig::default(), fetcher).unwrap();

    let first = session.run(request("Metadata", None, false)).await.result.len();
    assert_eq!(first, 1);

    let second = session.run(request("Image Scraper", None, false)).await;
    assert_eq!(second.result.records()[0].payload(), "URL: https://site.test/logo.png | ALT: No label");

    let summary = session.summary().unwrap();
    assert_eq!(summary.records_found, 1);
    assert_eq!(summary.data_source, "site.test");

    let dir = tempfile::tempdir().unwrap();
    let written = session.write_artifacts(dir.path(), &ExportFormat::ALL).await.unwrap();
    assert_eq!(written.len(), 3);
    for name in ["data.csv", "data.json", "intelligence_report.pdf"] {
        assert!(dir.path().join(name).exists(), "{name} missing");
    }

    let csv = std::fs::read_to_string(dir.path().join("data.csv")).unwrap();
    assert!(csv.contains("Image Resource"));
    assert!(!csv.contains("Metadata"));
}

#[test]
fn malformed_selector_is_rejected_up_front() {
    let err = PipelineRequest::new(HOME, "CSS Selector", Some("p["), false).unwrap_err();
    assert!(matches!(err, ParsingError::InvalidSelector { .. }));
}

#[tokio::test]
async fn malformed_selector_reaching_extraction_is_a_warning() {
    let fetcher = Arc::new(StubFetcher::default().page(HOME, "<body><p>Some long paragraph here</p></body>"));
    let mode = ExtractionMode::CssSelector(SelectorTarget::Custom("p[".to_string()));
    let request = PipelineRequest::with_mode(HOME, mode, false).unwrap();

    let response = runner(fetcher).run(&request).await;

    assert!(response.result.is_empty());
    assert_eq!(response.warnings.len(), 1);
    assert_eq!(response.warnings[0].stage, PipelineStage::Extraction);
    assert_eq!(response.warnings[0].kind, "parse");
    assert!(response.warnings[0].to_string().starts_with(&format!("Failed to extract {HOME}: ")));
}
