//! URL normalization and rule pattern matching
//!
//! Page URLs and absolute patterns go through the WHATWG parser, so a pattern
//! typed with spaces, non-ASCII path segments, dot segments or an IDN host
//! compares equal to the encoded `location.href` of the same page. Anything
//! that does not parse as an absolute URL is compared as a raw string.

use std::borrow::Cow;

use ::url::Url;

use crate::types::Rule;

// =============================================================================
// Parsing
// =============================================================================

/// Parse an absolute URL. Relative paths and bare hosts are rejected.
pub fn parse(url: &str) -> Option<Url> {
    Url::parse(url.trim()).ok()
}

/// `scheme://host[:port]/path` of a parsed URL. The port is only present
/// when it is not the scheme's default.
fn origin_and_path(url: &Url) -> String {
    let host = url.host_str().unwrap_or("");
    match url.port() {
        Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
        None => format!("{}://{}{}", url.scheme(), host, url.path()),
    }
}

/// Path component of an absolute URL, percent-encoded as the parser leaves it.
pub fn extract_path(url: &str) -> Option<String> {
    parse(url).map(|parsed| parsed.path().to_string())
}

// =============================================================================
// Normalization
// =============================================================================

/// Reduce a URL to `scheme://host/path`, dropping query and fragment.
///
/// Strings that do not parse come back unchanged.
pub fn normalize(url: &str) -> Cow<'_, str> {
    match parse(url) {
        Some(parsed) => Cow::Owned(origin_and_path(&parsed)),
        None => Cow::Borrowed(url),
    }
}

// =============================================================================
// Matching
// =============================================================================

/// Check a page URL against a single rule pattern.
///
/// Exactly one branch decides: exact normalized equality first, then a
/// trailing `*` prefix match, then a `/`-rooted path match.
pub fn matches(current_url: &str, pattern: &str) -> bool {
    let current = normalize(current_url);
    let normalized_pattern = normalize(pattern);

    if current == normalized_pattern {
        return true;
    }

    if let Some(prefix) = normalized_pattern.strip_suffix('*') {
        return current.starts_with(prefix);
    }

    if pattern.starts_with('/') {
        return match extract_path(current_url) {
            Some(path) => path.starts_with(pattern),
            None => false,
        };
    }

    false
}

/// A rule matches when any of its patterns matches. No patterns, no match.
pub fn matches_rule(rule: &Rule, current_url: &str) -> bool {
    matching_pattern(rule, current_url).is_some()
}

/// First pattern of `rule` that matches `current_url`.
pub fn matching_pattern<'r>(rule: &'r Rule, current_url: &str) -> Option<&'r str> {
    rule.urls
        .iter()
        .map(String::as_str)
        .find(|pattern| matches(current_url, pattern))
}

/// Whether a pattern is something the matcher can use: a rooted or
/// dot-relative path, or an absolute URL.
pub fn is_valid_pattern(pattern: &str) -> bool {
    pattern.starts_with('/') || pattern.starts_with("./") || parse(pattern).is_some()
}
