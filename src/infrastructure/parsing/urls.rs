//! URL resolution and normalization helpers

use url::Url;

use super::{ParsingError, ParsingResult};

/// Parse an absolute http(s) URL entered by the operator
pub fn parse_page_url(raw: &str) -> ParsingResult<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParsingError::EmptyUrl);
    }

    let url = Url::parse(trimmed).map_err(|e| ParsingError::invalid_url(trimmed, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ParsingError::invalid_url(trimmed, format!("unsupported scheme '{other}'"))),
    }
}

/// Resolve `href` against `base`, as a browser would
pub fn resolve(base: Option<&Url>, href: &str) -> Option<Url> {
    match base {
        Some(base) => base.join(href.trim()).ok(),
        None => Url::parse(href.trim()).ok(),
    }
}

/// Resolve `href` against `base`, keeping it verbatim when that fails
pub fn resolve_or_verbatim(base: Option<&Url>, href: &str) -> String {
    resolve(base, href).map_or_else(|| href.to_string(), String::from)
}

/// Drop the fragment and any trailing slashes
pub fn normalize(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    let mut normalized = String::from(url);
    while normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Host and explicit port, the part two URLs must share to be "same domain"
pub fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Host shown to the operator, `Unknown` when there is none
pub fn display_host(raw: &str) -> String {
    Url::parse(raw.trim())
        .ok()
        .and_then(|url| host_key(&url))
        .unwrap_or_else(|| "Unknown".to_string())
}
