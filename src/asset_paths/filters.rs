use std::sync::OnceLock;

use regex::Regex;

fn web_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^https?://").expect("invalid http(s) regex"))
}

fn data_uri_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^data:").expect("invalid data URI regex"))
}

/// Determine whether a reference is already a loadable URL that needs no origin.
///
/// `http(s)` URLs and data URIs are returned as-is by the resolver.
pub fn is_absolute_url(value: &str) -> bool {
    web_url_pattern().is_match(value) || is_embedded_data(value)
}

/// Determine whether a reference carries its payload inline as a data URI.
pub fn is_embedded_data(value: &str) -> bool {
    data_uri_pattern().is_match(value)
}
