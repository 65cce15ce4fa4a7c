//! Same-domain links discovered on one page

use std::collections::HashSet;

/// Insertion-ordered set of normalized URLs.
///
/// Order is the order anchors appear in the document, so taking the
/// first N links is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlFrontier {
    urls: Vec<String>,
    seen: HashSet<String>,
}

impl CrawlFrontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a URL, returning false if it was already present
    pub fn insert(&mut self, url: String) -> bool {
        if self.seen.contains(&url) {
            return false;
        }
        self.seen.insert(url.clone());
        self.urls.push(url);
        true
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    /// The first `limit` URLs in discovery order
    pub fn first(&self, limit: usize) -> &[String] {
        &self.urls[..limit.min(self.urls.len())]
    }
}

impl FromIterator<String> for CrawlFrontier {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut frontier = Self::new();
        for url in iter {
            frontier.insert(url);
        }
        frontier
    }
}
