//! PDF intelligence report
//!
//! Layout happens in two steps. [`layout_pages`] places every line on a
//! page using a top-down cursor in millimetres, then [`render_pdf`] draws
//! the placed lines with the built-in Helvetica fonts. Keeping the layout
//! pure makes pagination testable without decoding PDF bytes.

#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument};

use super::text_encoding::to_latin1;
use super::{ReportError, ReportResult};
use crate::domain::record::PipelineResult;
use crate::infrastructure::config::{ReportConfig, defaults};

const PT_TO_MM: f32 = 0.3528;
/// Rough Helvetica advance width as a fraction of the font size
const REGULAR_CHAR_EM: f32 = 0.5;
const BOLD_CHAR_EM: f32 = 0.55;
/// Lines never start below this distance from the page bottom
const AUTO_BREAK_MARGIN_MM: f32 = 15.0;

const TITLE_SIZE_PT: f32 = 16.0;
const TITLE_HEIGHT_MM: f32 = 10.0;
const SEGMENT_SIZE_PT: f32 = 10.0;
const SEGMENT_HEIGHT_MM: f32 = 8.0;
const LABEL_SIZE_PT: f32 = 8.0;
const VALUE_SIZE_PT: f32 = 9.0;
const FIELD_HEIGHT_MM: f32 = 5.0;
const RECORD_GAP_MM: f32 = 4.0;

/// Page geometry and title of the report
#[derive(Debug, Clone, PartialEq)]
pub struct PdfLayout {
    pub title: String,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    /// A new page starts once the cursor passes this distance from the top
    pub page_break_threshold_mm: f32,
}

impl PdfLayout {
    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            title: config.title.clone(),
            page_width_mm: config.page_width_mm,
            page_height_mm: config.page_height_mm,
            margin_mm: config.margin_mm,
            page_break_threshold_mm: config.page_break_threshold_mm,
        }
    }

    fn usable_width(&self) -> f32 {
        (self.page_width_mm - 2.0 * self.margin_mm).max(1.0)
    }
}

impl Default for PdfLayout {
    fn default() -> Self {
        Self::from_config(&ReportConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
}

/// One line of text placed on a page
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x_mm: f32,
    /// Baseline, measured from the top of the page
    pub baseline_mm: f32,
    pub size_pt: f32,
    pub style: FontStyle,
}

fn char_width_mm(size_pt: f32, style: FontStyle) -> f32 {
    let em = match style {
        FontStyle::Regular => REGULAR_CHAR_EM,
        FontStyle::Bold => BOLD_CHAR_EM,
    };
    size_pt * PT_TO_MM * em
}

fn text_width_mm(text: &str, size_pt: f32, style: FontStyle) -> f32 {
    text.chars().count() as f32 * char_width_mm(size_pt, style)
}

fn capacity(width_mm: f32, size_pt: f32, style: FontStyle) -> usize {
    ((width_mm / char_width_mm(size_pt, style)).floor() as usize).max(1)
}

/// Greedy word wrap. Words longer than a line (URLs) are split.
fn wrap(text: &str, first_capacity: usize, rest_capacity: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    let limit = |lines: &Vec<String>| if lines.is_empty() { first_capacity } else { rest_capacity };

    for word in text.split(' ').filter(|w| !w.is_empty()) {
        let mut word: Vec<char> = word.chars().collect();

        loop {
            let cap = limit(&lines);
            let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };

            if needed <= cap {
                if current_len > 0 {
                    current.push(' ');
                    current_len += 1;
                }
                current.extend(word.iter());
                current_len += word.len();
                break;
            }

            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
                continue;
            }

            let rest = word.split_off(cap.min(word.len()));
            lines.push(word.into_iter().collect());
            word = rest;
            if word.is_empty() {
                break;
            }
        }
    }

    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

struct Cursor<'a> {
    layout: &'a PdfLayout,
    pages: Vec<Vec<PlacedLine>>,
    y_mm: f32,
}

impl<'a> Cursor<'a> {
    fn new(layout: &'a PdfLayout) -> Self {
        Self {
            layout,
            pages: vec![Vec::new()],
            y_mm: layout.margin_mm,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.y_mm = self.layout.margin_mm;
    }

    fn place(&mut self, text: String, x_mm: f32, size_pt: f32, style: FontStyle, height_mm: f32) {
        let baseline_mm = self.y_mm + height_mm * 0.75;
        if let Some(page) = self.pages.last_mut() {
            page.push(PlacedLine {
                text,
                x_mm,
                baseline_mm,
                size_pt,
                style,
            });
        }
    }

    fn ensure_room(&mut self, height_mm: f32) {
        let bottom = self.layout.page_height_mm - AUTO_BREAK_MARGIN_MM;
        if self.y_mm + height_mm > bottom && self.y_mm > self.layout.margin_mm {
            self.new_page();
        }
    }

    /// A full-width line; the cursor moves down by `height_mm`
    fn line(&mut self, text: String, size_pt: f32, style: FontStyle, height_mm: f32) {
        self.ensure_room(height_mm);
        self.place(text, self.layout.margin_mm, size_pt, style, height_mm);
        self.y_mm += height_mm;
    }

    fn centered_line(&mut self, text: String, size_pt: f32, style: FontStyle, height_mm: f32) {
        self.ensure_room(height_mm);
        let width = text_width_mm(&text, size_pt, style);
        let x_mm = ((self.layout.page_width_mm - width) / 2.0).max(self.layout.margin_mm);
        self.place(text, x_mm, size_pt, style, height_mm);
        self.y_mm += height_mm;
    }

    /// Bold `LABEL: ` followed by the wrapped value
    fn field(&mut self, label: &str, value: &str) {
        let label = format!("{label}: ");
        let label_width = text_width_mm(&label, LABEL_SIZE_PT, FontStyle::Bold);
        let usable = self.layout.usable_width();

        let first_capacity = capacity((usable - label_width).max(1.0), VALUE_SIZE_PT, FontStyle::Regular);
        let rest_capacity = capacity(usable, VALUE_SIZE_PT, FontStyle::Regular);
        let lines = wrap(value, first_capacity, rest_capacity);

        for (index, text) in lines.into_iter().enumerate() {
            self.ensure_room(FIELD_HEIGHT_MM);
            if index == 0 {
                self.place(label.clone(), self.layout.margin_mm, LABEL_SIZE_PT, FontStyle::Bold, FIELD_HEIGHT_MM);
                self.place(
                    text,
                    self.layout.margin_mm + label_width,
                    VALUE_SIZE_PT,
                    FontStyle::Regular,
                    FIELD_HEIGHT_MM,
                );
            } else {
                self.place(text, self.layout.margin_mm, VALUE_SIZE_PT, FontStyle::Regular, FIELD_HEIGHT_MM);
            }
            self.y_mm += FIELD_HEIGHT_MM;
        }
    }

    fn advance(&mut self, height_mm: f32) {
        self.y_mm += height_mm;
    }
}

/// Place every line of the report, page by page
pub fn layout_pages(result: &PipelineResult, layout: &PdfLayout) -> Vec<Vec<PlacedLine>> {
    let mut cursor = Cursor::new(layout);

    cursor.centered_line(to_latin1(&layout.title), TITLE_SIZE_PT, FontStyle::Bold, TITLE_HEIGHT_MM);
    cursor.advance(TITLE_HEIGHT_MM);

    for (index, record) in result.iter().enumerate() {
        let segment = format!("Segment #{} | {}", index + 1, record.record_type());
        cursor.line(to_latin1(&segment), SEGMENT_SIZE_PT, FontStyle::Bold, SEGMENT_HEIGHT_MM);

        for (name, value) in record.fields() {
            cursor.field(&name.to_uppercase(), &to_latin1(value));
        }

        cursor.advance(RECORD_GAP_MM);
        if cursor.y_mm > layout.page_break_threshold_mm {
            cursor.new_page();
        }
    }

    // A trailing break after the last record leaves an empty page behind
    if cursor.pages.len() > 1 && cursor.pages.last().is_some_and(Vec::is_empty) {
        cursor.pages.pop();
    }

    cursor.pages
}

fn pdf_error(error: impl std::fmt::Display) -> ReportError {
    ReportError::Pdf {
        reason: error.to_string(),
    }
}

/// Render the report as PDF bytes
pub fn render_pdf(result: &PipelineResult, layout: &PdfLayout) -> ReportResult<Vec<u8>> {
    let pages = layout_pages(result, layout);
    let page_width = Mm(layout.page_width_mm);
    let page_height = Mm(layout.page_height_mm);

    let (doc, first_page, first_layer) =
        PdfDocument::new(to_latin1(&layout.title), page_width, page_height, defaults::PDF_LAYER_NAME);
    let regular: IndirectFontRef = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
    let bold: IndirectFontRef = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?;

    for (index, lines) in pages.into_iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(page_width, page_height, defaults::PDF_LAYER_NAME);
            doc.get_page(page).get_layer(layer)
        };

        for line in lines {
            let font = match line.style {
                FontStyle::Regular => &regular,
                FontStyle::Bold => &bold,
            };
            layer.use_text(
                line.text,
                line.size_pt,
                Mm(line.x_mm),
                Mm(layout.page_height_mm - line.baseline_mm),
                font,
            );
        }
    }

    doc.save_to_bytes().map_err(pdf_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::aggregator::aggregate;
    use crate::domain::record::{ExtractedRecord, RecordType};

    fn records(count: usize, payload: &str) -> PipelineResult {
        aggregate([(0..count)
            .map(|i| ExtractedRecord::new(RecordType::Text, format!("{payload} {i}"), "https://a.com", "p"))
            .collect::<Vec<_>>()])
    }

    fn texts(pages: &[Vec<PlacedLine>]) -> Vec<&str> {
        pages.iter().flatten().map(|line| line.text.as_str()).collect()
    }

    #[test]
    fn test_empty_result_has_only_the_title() {
        let pages = layout_pages(&PipelineResult::default(), &PdfLayout::default());
        assert_eq!(pages.len(), 1);
        assert_eq!(texts(&pages), vec!["OMG Universal Data Pipeline Report"]);
        assert_eq!(pages[0][0].style, FontStyle::Bold);
    }

    #[test]
    fn test_segment_header_and_fields() {
        let pages = layout_pages(&records(1, "hello"), &PdfLayout::default());
        assert_eq!(
            texts(&pages),
            vec![
                "OMG Universal Data Pipeline Report",
                "Segment #1 | Text",
                "TYPE: ",
                "Text",
                "PAYLOAD: ",
                "hello 0",
                "SOURCE: ",
                "https://a.com",
                "NODE: ",
                "p",
            ]
        );
    }

    #[test]
    fn test_page_breaks_after_threshold() {
        let layout = PdfLayout::default();
        let pages = layout_pages(&records(40, "row"), &layout);
        assert!(pages.len() > 1);
        for page in &pages {
            for line in page {
                assert!(line.baseline_mm < layout.page_height_mm - AUTO_BREAK_MARGIN_MM + FIELD_HEIGHT_MM);
            }
        }
        // Each page after the first starts at the top margin with a segment header
        assert!(pages[1][0].text.starts_with("Segment #"));
    }

    #[test]
    fn test_long_values_wrap() {
        let long = "word ".repeat(200);
        let pages = layout_pages(&records(1, &long), &PdfLayout::default());
        let payload_lines = texts(&pages).iter().filter(|t| t.starts_with("word")).count();
        assert!(payload_lines > 1);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap("abcdefghij", 4, 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("ab cd ef", 5, 5), vec!["ab cd", "ef"]);
        assert_eq!(wrap("", 5, 5), vec![""]);
    }

    #[test]
    fn test_render_survives_unencodable_text() {
        let result = aggregate([vec![ExtractedRecord::new(
            RecordType::Text,
            "\u{201C}Smart\u{201D} quotes \u{2014} and emoji 🎉🚀",
            "https://a.com",
            "p",
        )]]);
        let bytes = render_pdf(&result, &PdfLayout::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
