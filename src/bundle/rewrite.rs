//! Rewriting of `src` attribute values inside converted HTML documents.

use std::collections::HashSet;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::asset_paths::{file_name_key, path_key};

/// How an attribute value is matched against the original asset identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Compare filenames only, ignoring directories and query strings.
    #[default]
    FileName,
    /// Compare the whole relative path, ignoring leading `./` or `/` and query strings.
    FullPath,
}

impl MatchStrategy {
    fn key(self, reference: &str) -> String {
        match self {
            MatchStrategy::FileName => file_name_key(reference),
            MatchStrategy::FullPath => path_key(reference),
        }
    }
}

fn src_attribute_pattern() -> &'static Regex {
    use std::sync::OnceLock;

    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)(?P<lead>\s)src\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')"#)
            .expect("invalid src attribute regex")
    })
}

/// Replace `src` attribute values that reference one of the original identifiers.
///
/// Each `src="..."` (or single-quoted) attribute in `html` is visited once. The first pair in
/// `original_to_resolved` whose match key equals the attribute's key supplies the new value,
/// and the whole attribute is emitted as `src="<resolved>"`. Text outside attribute values is
/// never touched, and values that already equal a resolved URL are left alone, so running the
/// rewrite twice with the same mapping changes nothing.
pub fn rewrite_references(
    html: &str,
    original_to_resolved: &[(String, String)],
    strategy: MatchStrategy,
) -> String {
    if original_to_resolved.is_empty() {
        return html.to_string();
    }

    let keyed: Vec<(String, &str)> = original_to_resolved
        .iter()
        .filter(|(_, resolved)| !resolved.is_empty())
        .map(|(original, resolved)| (strategy.key(original), resolved.as_str()))
        .filter(|(key, _)| !key.is_empty())
        .collect();
    let already_resolved: HashSet<&str> = keyed.iter().map(|(_, resolved)| *resolved).collect();

    src_attribute_pattern()
        .replace_all(html, |caps: &Captures| {
            let whole = &caps[0];
            let value = caps
                .name("dq")
                .or_else(|| caps.name("sq"))
                .map(|m| m.as_str())
                .unwrap_or_default();

            if already_resolved.contains(value) {
                return whole.to_string();
            }

            let key = strategy.key(value);
            match keyed.iter().find(|(candidate, _)| *candidate == key) {
                Some((_, resolved)) => {
                    format!("{}src=\"{}\"", &caps["lead"], resolved.replace('"', "&quot;"))
                }
                None => whole.to_string(),
            }
        })
        .into_owned()
}
