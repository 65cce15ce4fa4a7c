//! Extraction modes
//!
//! The six modes form a closed set. Modes that need a user supplied
//! target carry it inside the variant, so a mode without its target can
//! not be constructed and an unknown mode is rejected at the boundary.

use scraper::Selector;
use std::fmt;
use std::str::FromStr;

use crate::domain::record::RecordType;
use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};

/// Sentinel target of the CSS selector mode that scans the default tag set
pub const EVERYTHING_TARGET: &str = "everything";

/// Mode identifier without its target, as picked by the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    CssSelector,
    FileDiscovery,
    Metadata,
    KeywordSearch,
    ImageScraper,
    TableExtractor,
}

impl ModeKind {
    pub const ALL: [Self; 6] = [
        Self::CssSelector,
        Self::FileDiscovery,
        Self::Metadata,
        Self::KeywordSearch,
        Self::ImageScraper,
        Self::TableExtractor,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::CssSelector => "CSS Selector",
            Self::FileDiscovery => "File Discovery",
            Self::Metadata => "Metadata",
            Self::KeywordSearch => "Keyword Search",
            Self::ImageScraper => "Image Scraper",
            Self::TableExtractor => "Table Extractor",
        }
    }

    /// Kebab-case name used on the command line
    pub const fn cli_name(self) -> &'static str {
        match self {
            Self::CssSelector => "css-selector",
            Self::FileDiscovery => "file-discovery",
            Self::Metadata => "metadata",
            Self::KeywordSearch => "keyword-search",
            Self::ImageScraper => "image-scraper",
            Self::TableExtractor => "table-extractor",
        }
    }

    pub const fn requires_target(self) -> bool {
        self.target_prompt().is_some()
    }

    /// Prompt shown to the operator for modes that take a target
    pub const fn target_prompt(self) -> Option<&'static str> {
        match self {
            Self::CssSelector => Some("Enter Selector (e.g. .news or everything)"),
            Self::FileDiscovery => Some("Enter Extensions (e.g. .pdf,.zip)"),
            Self::KeywordSearch => Some("Enter Keyword"),
            Self::Metadata | Self::ImageScraper | Self::TableExtractor => None,
        }
    }

    /// Bind the operator supplied target to this mode.
    ///
    /// Targets are ignored by modes that take none.
    pub fn with_target(self, target: Option<&str>) -> ParsingResult<ExtractionMode> {
        let target = target.filter(|t| !t.trim().is_empty());

        let mode = match (self, target) {
            (Self::Metadata, _) => ExtractionMode::Metadata,
            (Self::ImageScraper, _) => ExtractionMode::ImageScraper,
            (Self::TableExtractor, _) => ExtractionMode::TableExtractor,
            (Self::CssSelector, Some(target)) => {
                let target = SelectorTarget::from_input(target);
                if let SelectorTarget::Custom(selector) = &target {
                    Selector::parse(selector).map_err(|e| ParsingError::invalid_selector(selector, e))?;
                }
                ExtractionMode::CssSelector(target)
            }
            (Self::FileDiscovery, Some(target)) => {
                let extensions = parse_extensions(target);
                if extensions.is_empty() {
                    return Err(ParsingError::missing_target(self));
                }
                ExtractionMode::FileDiscovery(extensions)
            }
            (Self::KeywordSearch, Some(target)) => {
                ExtractionMode::KeywordSearch(target.to_lowercase())
            }
            (Self::CssSelector | Self::FileDiscovery | Self::KeywordSearch, None) => {
                return Err(ParsingError::missing_target(self));
            }
        };

        Ok(mode)
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ModeKind {
    type Err = ParsingError;

    /// Accepts both the display label ("Keyword Search") and the
    /// command line name ("keyword-search"), case-insensitively.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| {
                kind.label().eq_ignore_ascii_case(wanted) || kind.cli_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| ParsingError::UnknownMode {
                value: value.to_string(),
            })
    }
}

/// What the CSS selector mode scans
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorTarget {
    /// The default text tag set
    Everything,
    /// A user supplied CSS selector
    Custom(String),
}

impl SelectorTarget {
    fn from_input(target: &str) -> Self {
        if target.trim().eq_ignore_ascii_case(EVERYTHING_TARGET) {
            Self::Everything
        } else {
            Self::Custom(target.trim().to_string())
        }
    }
}

/// A fully specified extraction mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionMode {
    CssSelector(SelectorTarget),
    /// Lower-cased file extensions, e.g. `.pdf`
    FileDiscovery(Vec<String>),
    Metadata,
    /// Lower-cased keyword
    KeywordSearch(String),
    ImageScraper,
    TableExtractor,
}

impl ExtractionMode {
    pub const fn kind(&self) -> ModeKind {
        match self {
            Self::CssSelector(_) => ModeKind::CssSelector,
            Self::FileDiscovery(_) => ModeKind::FileDiscovery,
            Self::Metadata => ModeKind::Metadata,
            Self::KeywordSearch(_) => ModeKind::KeywordSearch,
            Self::ImageScraper => ModeKind::ImageScraper,
            Self::TableExtractor => ModeKind::TableExtractor,
        }
    }

    /// Type of every record this mode emits
    pub const fn record_type(&self) -> RecordType {
        match self {
            Self::CssSelector(_) => RecordType::Text,
            Self::FileDiscovery(_) => RecordType::FileLink,
            Self::Metadata => RecordType::Metadata,
            Self::KeywordSearch(_) => RecordType::KeywordMatch,
            Self::ImageScraper => RecordType::ImageResource,
            Self::TableExtractor => RecordType::TableData,
        }
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CssSelector(SelectorTarget::Everything) => {
                write!(f, "{} ({EVERYTHING_TARGET})", self.kind())
            }
            Self::CssSelector(SelectorTarget::Custom(selector)) => {
                write!(f, "{} ({selector})", self.kind())
            }
            Self::FileDiscovery(extensions) => write!(f, "{} ({})", self.kind(), extensions.join(",")),
            Self::KeywordSearch(keyword) => write!(f, "{} ({keyword})", self.kind()),
            Self::Metadata | Self::ImageScraper | Self::TableExtractor => write!(f, "{}", self.kind()),
        }
    }
}

// Empty entries (".pdf,,") would match every href, so they are dropped.
fn parse_extensions(target: &str) -> Vec<String> {
    target
        .split(',')
        .map(|ext| ext.trim().to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("CSS Selector", ModeKind::CssSelector)]
    #[case("file discovery", ModeKind::FileDiscovery)]
    #[case("metadata", ModeKind::Metadata)]
    #[case("keyword-search", ModeKind::KeywordSearch)]
    #[case("Image Scraper", ModeKind::ImageScraper)]
    #[case("TABLE-EXTRACTOR", ModeKind::TableExtractor)]
    fn test_mode_kind_parsing(#[case] input: &str, #[case] expected: ModeKind) {
        assert_eq!(input.parse::<ModeKind>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let err = "Screenshot".parse::<ModeKind>().unwrap_err();
        assert!(matches!(err, ParsingError::UnknownMode { .. }));
    }

    #[rstest]
    #[case(ModeKind::CssSelector)]
    #[case(ModeKind::FileDiscovery)]
    #[case(ModeKind::KeywordSearch)]
    fn test_target_required(#[case] kind: ModeKind) {
        assert!(kind.requires_target());
        assert!(kind.with_target(None).is_err());
        assert!(kind.with_target(Some("   ")).is_err());
    }

    #[test]
    fn test_targetless_modes_ignore_target() {
        assert_eq!(
            ModeKind::Metadata.with_target(Some("ignored")).unwrap(),
            ExtractionMode::Metadata
        );
        assert_eq!(ModeKind::TableExtractor.with_target(None).unwrap(), ExtractionMode::TableExtractor);
    }

    #[test]
    fn test_everything_sentinel_is_case_insensitive() {
        assert_eq!(
            ModeKind::CssSelector.with_target(Some("EveryThing")).unwrap(),
            ExtractionMode::CssSelector(SelectorTarget::Everything)
        );
        assert_eq!(
            ModeKind::CssSelector.with_target(Some(".news")).unwrap(),
            ExtractionMode::CssSelector(SelectorTarget::Custom(".news".to_string()))
        );
    }

    #[rstest]
    #[case("p[")]
    #[case("a[href")]
    #[case("::")]
    fn test_malformed_selector_is_rejected(#[case] selector: &str) {
        let err = ModeKind::CssSelector.with_target(Some(selector)).unwrap_err();
        assert!(matches!(err, ParsingError::InvalidSelector { .. }));
        assert!(err.to_string().contains(selector));
    }

    #[test]
    fn test_extension_list_is_normalized() {
        let mode = ModeKind::FileDiscovery.with_target(Some(" .PDF, .zip ,,")).unwrap();
        assert_eq!(
            mode,
            ExtractionMode::FileDiscovery(vec![".pdf".to_string(), ".zip".to_string()])
        );
    }

    #[test]
    fn test_keyword_is_lowercased() {
        let mode = ModeKind::KeywordSearch.with_target(Some("Rust")).unwrap();
        assert_eq!(mode, ExtractionMode::KeywordSearch("rust".to_string()));
        assert_eq!(mode.record_type(), RecordType::KeywordMatch);
    }
}
