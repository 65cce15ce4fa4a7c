//! Mode-driven content extraction
//!
//! Turns a parsed page into typed records. Each [`ExtractionMode`] variant
//! has its own extraction routine; all records of one call share the
//! mode's record type and carry the page URL as their source.

#![allow(clippy::uninlined_format_args)]

use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use super::{ContextualParser, ExtractContext, ParseContext, ParsingError, ParsingResult};
use crate::domain::mode::{ExtractionMode, SelectorTarget};
use crate::domain::record::{ExtractedRecord, RecordType};
use crate::infrastructure::config::ExtractionConfig;

const UNTITLED: &str = "Untitled";
const NONE_VALUE: &str = "None";
const NO_LABEL: &str = "No label";
const CELL_SEPARATOR: &str = " | ";
const ROW_SEPARATOR: &str = " [ROW] ";

/// Tunables of the extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSettings {
    /// Text must be strictly longer than this many characters
    pub min_text_length: usize,
    /// Tags scanned, in this order, by the CSS selector mode's "everything" target
    pub default_text_tags: Vec<String>,
    /// Tags searched by the keyword mode
    pub keyword_tags: Vec<String>,
}

impl ExtractionSettings {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            min_text_length: config.min_text_length,
            default_text_tags: config.default_text_tags.clone(),
            keyword_tags: config.keyword_tags.clone(),
        }
    }
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

/// Fixed selectors compiled once per extractor
struct CompiledSelectors {
    anchors: Selector,
    title: Selector,
    description: Selector,
    images: Selector,
    tables: Selector,
    rows: Selector,
    cells: Selector,
    default_text_tags: Vec<Selector>,
    keyword_tags: Selector,
}

fn compile(selector: &str) -> ParsingResult<Selector> {
    Selector::parse(selector).map_err(|e| ParsingError::invalid_selector(selector, e))
}

impl CompiledSelectors {
    fn new(settings: &ExtractionSettings) -> ParsingResult<Self> {
        let default_text_tags = settings
            .default_text_tags
            .iter()
            .map(|tag| compile(tag))
            .collect::<ParsingResult<Vec<_>>>()?;

        Ok(Self {
            anchors: compile("a[href]")?,
            title: compile("title")?,
            description: compile(r#"meta[name="description"]"#)?,
            images: compile("img[src]")?,
            tables: compile("table")?,
            rows: compile("tr")?,
            cells: compile("td, th")?,
            default_text_tags,
            keyword_tags: compile(&settings.keyword_tags.join(", "))?,
        })
    }
}

/// Extracts records from parsed pages
pub struct ContentExtractor {
    settings: ExtractionSettings,
    selectors: CompiledSelectors,
}

impl ContentExtractor {
    /// Create an extractor with default settings
    pub fn new() -> ParsingResult<Self> {
        Self::with_settings(ExtractionSettings::default())
    }

    /// Create an extractor with custom settings.
    ///
    /// Fails when a configured tag is not a valid selector.
    pub fn with_settings(settings: ExtractionSettings) -> ParsingResult<Self> {
        let selectors = CompiledSelectors::new(&settings)?;
        Ok(Self { settings, selectors })
    }

    pub const fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    /// Parse `html` and extract the records `mode` asks for
    pub fn extract(&self, html: &str, url: &str, mode: &ExtractionMode) -> ParsingResult<Vec<ExtractedRecord>> {
        let document = Html::parse_document(html);
        self.extract_records(&document, url, mode)
    }

    /// Extract records from an already parsed document.
    ///
    /// Fails only when a custom selector is not valid CSS.
    pub fn extract_records(
        &self,
        html: &Html,
        url: &str,
        mode: &ExtractionMode,
    ) -> ParsingResult<Vec<ExtractedRecord>> {
        let page = ParseContext::new(url);
        let records = match mode {
            ExtractionMode::CssSelector(target) => self.extract_text(html, &page, target)?,
            ExtractionMode::FileDiscovery(extensions) => self.extract_file_links(html, &page, extensions),
            ExtractionMode::Metadata => vec![self.extract_metadata(html, &page)],
            ExtractionMode::KeywordSearch(keyword) => self.extract_keyword_matches(html, &page, keyword),
            ExtractionMode::ImageScraper => self.extract_images(html, &page),
            ExtractionMode::TableExtractor => self.extract_tables(html, &page),
        };

        debug!("{} produced {} records from {}", mode, records.len(), url);
        Ok(records)
    }

    fn extract_text(
        &self,
        html: &Html,
        page: &ParseContext,
        target: &SelectorTarget,
    ) -> ParsingResult<Vec<ExtractedRecord>> {
        let custom;
        let selectors: Vec<&Selector> = match target {
            SelectorTarget::Everything => self.selectors.default_text_tags.iter().collect(),
            SelectorTarget::Custom(selector) => {
                custom = compile(selector)?;
                vec![&custom]
            }
        };

        // Tag by tag, so all <p> come before all <h1> for "everything"
        let records = selectors
            .into_iter()
            .flat_map(|selector| html.select(selector))
            .filter_map(|element| {
                let text = stripped_text(element);
                (text.chars().count() > self.settings.min_text_length).then(|| {
                    ExtractedRecord::new(RecordType::Text, text, &page.page_url, element.value().name())
                })
            })
            .collect();
        Ok(records)
    }

    fn extract_file_links(&self, html: &Html, page: &ParseContext, extensions: &[String]) -> Vec<ExtractedRecord> {
        html.select(&self.selectors.anchors)
            .filter_map(|anchor| anchor.value().attr("href"))
            .filter(|href| {
                let href = href.to_lowercase();
                extensions.iter().any(|ext| href.ends_with(ext.as_str()))
            })
            .map(|href| ExtractedRecord::new(RecordType::FileLink, page.resolve(href), &page.page_url, "a"))
            .collect()
    }

    fn extract_metadata(&self, html: &Html, page: &ParseContext) -> ExtractedRecord {
        let title = html
            .select(&self.selectors.title)
            .next()
            .map_or_else(|| UNTITLED.to_string(), |title| single_string(title).unwrap_or_else(|| NONE_VALUE.to_string()));

        let description = html
            .select(&self.selectors.description)
            .next()
            .and_then(|meta| meta.value().attr("content"))
            .unwrap_or(NONE_VALUE);

        ExtractedRecord::new(
            RecordType::Metadata,
            format!("TITLE: {} | DESC: {}", title, description),
            &page.page_url,
            "head",
        )
    }

    fn extract_keyword_matches(&self, html: &Html, page: &ParseContext, keyword: &str) -> Vec<ExtractedRecord> {
        html.select(&self.selectors.keyword_tags)
            .filter(|element| element.text().collect::<String>().to_lowercase().contains(keyword))
            .map(|element| {
                ExtractedRecord::new(
                    RecordType::KeywordMatch,
                    stripped_text(element),
                    &page.page_url,
                    element.value().name(),
                )
            })
            .collect()
    }

    fn extract_images(&self, html: &Html, page: &ParseContext) -> Vec<ExtractedRecord> {
        html.select(&self.selectors.images)
            .filter_map(|img| {
                let src = img.value().attr("src")?;
                let alt = img.value().attr("alt").unwrap_or(NO_LABEL);
                Some(ExtractedRecord::new(
                    RecordType::ImageResource,
                    format!("URL: {} | ALT: {}", page.resolve(src), alt),
                    &page.page_url,
                    "img",
                ))
            })
            .collect()
    }

    fn extract_tables(&self, html: &Html, page: &ParseContext) -> Vec<ExtractedRecord> {
        html.select(&self.selectors.tables)
            .filter_map(|table| {
                let rows: Vec<String> = table
                    .select(&self.selectors.rows)
                    .map(|row| {
                        row.select(&self.selectors.cells)
                            .map(stripped_text)
                            .collect::<Vec<_>>()
                            .join(CELL_SEPARATOR)
                    })
                    .collect();

                (!rows.is_empty()).then(|| {
                    ExtractedRecord::new(RecordType::TableData, rows.join(ROW_SEPARATOR), &page.page_url, "table")
                })
            })
            .collect()
    }
}

impl ContextualParser for ContentExtractor {
    type Output = Vec<ExtractedRecord>;
    type Context = ExtractContext;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output> {
        self.extract_records(html, &context.page.page_url, &context.mode)
    }
}

/// Text of an element with every text node trimmed and empty ones dropped,
/// concatenated without a separator.
fn stripped_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).filter(|piece| !piece.is_empty()).collect()
}

/// The element's only string child, if it has exactly one
fn single_string(element: ElementRef<'_>) -> Option<String> {
    let mut children = element.children();
    let only = children.next()?;
    if children.next().is_some() {
        return None;
    }
    match only.value() {
        Node::Text(text) => Some(String::from(&**text)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mode::ModeKind;
    use rstest::rstest;

    const URL: &str = "https://example.com/page";

    fn extract(html: &str, mode: ExtractionMode) -> Vec<ExtractedRecord> {
        ContentExtractor::new().unwrap().extract(html, URL, &mode).unwrap()
    }

    fn payloads(records: &[ExtractedRecord]) -> Vec<&str> {
        records.iter().map(ExtractedRecord::payload).collect()
    }

    #[rstest]
    #[case(ExtractionMode::CssSelector(SelectorTarget::Everything))]
    #[case(ExtractionMode::CssSelector(SelectorTarget::Custom(".news".to_string())))]
    #[case(ExtractionMode::FileDiscovery(vec![".pdf".to_string()]))]
    #[case(ExtractionMode::KeywordSearch("rust".to_string()))]
    #[case(ExtractionMode::ImageScraper)]
    #[case(ExtractionMode::TableExtractor)]
    fn test_no_matching_nodes_yields_empty(#[case] mode: ExtractionMode) {
        assert!(extract("<html><body><div>short</div></body></html>", mode).is_empty());
    }

    #[test]
    fn test_everything_scans_tags_in_order() {
        let html = r"
            <h1>A headline that is long</h1>
            <p>First paragraph text</p>
            <p>tiny</p>
            <li>List item long enough</li>
        ";
        let records = extract(html, ExtractionMode::CssSelector(SelectorTarget::Everything));
        assert_eq!(
            payloads(&records),
            vec!["First paragraph text", "A headline that is long", "List item long enough"]
        );
        assert_eq!(records[0].node(), "p");
        assert_eq!(records[1].node(), "h1");
        assert!(records.iter().all(|r| r.record_type() == RecordType::Text && r.source() == URL));
    }

    #[test]
    fn test_text_length_must_exceed_minimum() {
        let html = "<p>0123456789</p><p>0123456789A</p>";
        let records = extract(html, ExtractionMode::CssSelector(SelectorTarget::Everything));
        assert_eq!(payloads(&records), vec!["0123456789A"]);
    }

    #[test]
    fn test_custom_selector_and_stripped_text() {
        let html = r#"<div class="news">  Breaking <b> news </b> today </div><div>Other long text here</div>"#;
        let records = extract(html, ExtractionMode::CssSelector(SelectorTarget::Custom(".news".to_string())));
        assert_eq!(payloads(&records), vec!["Breakingnewstoday"]);
        assert_eq!(records[0].node(), "div");
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        let mode = ExtractionMode::CssSelector(SelectorTarget::Custom("p[".to_string()));
        let result = ContentExtractor::new().unwrap().extract("<p>Some long paragraph</p>", URL, &mode);
        assert!(matches!(result, Err(ParsingError::InvalidSelector { ref selector, .. }) if selector == "p["));
    }

    #[test]
    fn test_file_discovery_is_case_insensitive() {
        let html = r#"<a href="report.PDF">Report</a><a href="image.png">Image</a><a href="/files/a.zip">Zip</a>"#;
        let mode = ModeKind::FileDiscovery.with_target(Some(".pdf,.zip")).unwrap();
        let records = extract(html, mode);
        assert_eq!(
            payloads(&records),
            vec!["https://example.com/report.PDF", "https://example.com/files/a.zip"]
        );
        assert!(records.iter().all(|r| r.node() == "a" && r.record_type() == RecordType::FileLink));
    }

    #[test]
    fn test_metadata_title_without_description() {
        let records = extract("<html><head><title>Home</title></head><body></body></html>", ExtractionMode::Metadata);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload(), "TITLE: Home | DESC: None");
        assert_eq!(records[0].node(), "head");
        assert_eq!(records[0].record_type(), RecordType::Metadata);
    }

    #[rstest]
    #[case("<html><head></head><body></body></html>", "TITLE: Untitled | DESC: None")]
    #[case("<html><head><title></title></head></html>", "TITLE: None | DESC: None")]
    #[case(
        r#"<html><head><title>Shop</title><meta name="description" content="Best deals"></head></html>"#,
        "TITLE: Shop | DESC: Best deals"
    )]
    #[case(
        r#"<html><head><title>Shop</title><meta name="description"></head></html>"#,
        "TITLE: Shop | DESC: None"
    )]
    fn test_metadata_variants(#[case] html: &str, #[case] expected: &str) {
        let records = extract(html, ExtractionMode::Metadata);
        assert_eq!(payloads(&records), vec![expected]);
    }

    #[test]
    fn test_keyword_search_matches_case_insensitively() {
        let html = "<p>Learning  RUST is fun</p><li>nothing here</li><table><tr><td>rustacean</td></tr></table><div>rust in a div</div>";
        let mode = ModeKind::KeywordSearch.with_target(Some("Rust")).unwrap();
        let records = extract(html, mode);
        assert_eq!(payloads(&records), vec!["Learning  RUST is fun", "rustacean"]);
        assert_eq!(records[1].node(), "td");
    }

    #[test]
    fn test_images_resolve_src_and_default_alt() {
        let html = r#"<img src="/a.png" alt="Logo"><img src="b.jpg"><img alt="no source">"#;
        let records = extract(html, ExtractionMode::ImageScraper);
        assert_eq!(
            payloads(&records),
            vec![
                "URL: https://example.com/a.png | ALT: Logo",
                "URL: https://example.com/b.jpg | ALT: No label"
            ]
        );
    }

    #[test]
    fn test_tables_join_cells_and_rows() {
        let html = r"
            <table>
                <tr><th>Name</th><th>Age</th></tr>
                <tr><td> Ann </td><td>31</td></tr>
            </table>
            <table></table>
        ";
        let records = extract(html, ExtractionMode::TableExtractor);
        assert_eq!(payloads(&records), vec!["Name | Age [ROW] Ann | 31"]);
        assert_eq!(records[0].node(), "table");
    }

    #[test]
    fn test_invalid_configured_tag_is_rejected() {
        let settings = ExtractionSettings {
            keyword_tags: vec!["p[".to_string()],
            ..ExtractionSettings::default()
        };
        assert!(matches!(
            ContentExtractor::with_settings(settings),
            Err(ParsingError::InvalidSelector { .. })
        ));
    }
}
