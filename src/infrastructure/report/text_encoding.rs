//! Text normalization for the PDF report
//!
//! The built-in PDF fonts only cover Latin-1. Common typographic
//! characters are replaced by ASCII look-alikes first, then anything
//! still outside Latin-1 is dropped.

const SUBSTITUTIONS: &[(char, char)] = &[
    ('\u{2018}', '\''),
    ('\u{2019}', '\''),
    ('\u{201C}', '"'),
    ('\u{201D}', '"'),
    ('\u{2013}', '-'),
    ('\u{2014}', '-'),
    ('\u{00A0}', ' '),
    ('\u{2022}', '*'),
];

fn substitute(c: char) -> char {
    SUBSTITUTIONS
        .iter()
        .find_map(|&(from, to)| (from == c).then_some(to))
        .unwrap_or(c)
}

/// Text the report fonts can encode
pub fn to_latin1(text: &str) -> String {
    text.chars()
        .map(substitute)
        .filter(|&c| u32::from(c) <= 0xFF)
        .collect()
}
