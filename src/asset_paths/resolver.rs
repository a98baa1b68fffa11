use serde::{Deserialize, Serialize};

use super::filters::{is_absolute_url, is_embedded_data};
use super::names::normalise_separators;
use crate::models::AssetOrigin;

/// Maps a server-local path marker onto the public path the service actually serves.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PathRewrite {
    /// Prefix as reported by the service, e.g. `./output`.
    pub from: String,
    /// Public replacement, e.g. `/output`.
    pub to: String,
}

impl PathRewrite {
    /// Rewrite the `./output` working-directory marker to the served `/output` route.
    pub fn output_dir() -> Self {
        Self {
            from: "./output".into(),
            to: "/output".into(),
        }
    }

    fn apply(&self, path: &str) -> Option<String> {
        let rest = path.strip_prefix(self.from.as_str())?;
        if !(rest.is_empty() || rest.starts_with('/')) {
            return None;
        }
        Some(format!("{}{}", self.to, rest))
    }
}

/// Resolves asset paths against a fixed origin.
#[derive(Debug, Clone)]
pub struct PathResolver {
    origin: AssetOrigin,
    rewrites: Vec<PathRewrite>,
}

impl PathResolver {
    /// Create a resolver for an origin and its internal path markers.
    pub fn new(origin: AssetOrigin, rewrites: Vec<PathRewrite>) -> Self {
        Self { origin, rewrites }
    }

    /// Origin every relative path is joined onto.
    pub fn origin(&self) -> &AssetOrigin {
        &self.origin
    }

    /// Resolve a single path. See [`resolve`].
    pub fn resolve(&self, raw_path: &str) -> String {
        resolve(&self.origin, raw_path, &self.rewrites)
    }
}

/// Turn a possibly relative asset path into an absolute URL against `origin`.
///
/// Absolute `http(s)` URLs and data URIs are returned unchanged. Relative paths are joined
/// onto the origin with exactly one `/`, after internal markers such as `./output` have been
/// rewritten and any repeated copy of the origin inside the path has been collapsed. Blank
/// input yields an empty string, which callers treat as unresolvable.
pub fn resolve(origin: &AssetOrigin, raw_path: &str, rewrites: &[PathRewrite]) -> String {
    let trimmed = raw_path.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if is_absolute_url(trimmed) {
        if is_embedded_data(trimmed) {
            return raw_path.to_string();
        }
        return match trimmed
            .strip_prefix(origin.as_str())
            .and_then(|rest| repeated_origin_tail(origin, rest))
        {
            Some(tail) => join(origin, tail),
            None => raw_path.to_string(),
        };
    }

    let normalised = normalise_separators(trimmed);
    if let Some(authority) = normalised.strip_prefix("//") {
        let scheme = origin
            .as_str()
            .split_once("://")
            .map(|(scheme, _)| scheme)
            .unwrap_or("https");
        return format!("{scheme}://{authority}");
    }

    let rewritten = rewrites
        .iter()
        .find_map(|rewrite| rewrite.apply(&normalised))
        .unwrap_or(normalised);

    let relative = strip_relative_prefix(&rewritten);
    let relative = repeated_origin_tail(origin, relative).unwrap_or(relative);
    join(origin, relative)
}

fn join(origin: &AssetOrigin, relative: &str) -> String {
    format!("{}/{}", origin.as_str(), relative.trim_start_matches('/'))
}

fn strip_relative_prefix(path: &str) -> &str {
    let mut rest = path;
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        } else {
            return rest;
        }
    }
}

/// Locate the last copy of the origin authority inside `relative` and return what follows
/// it. The match must start a path segment and end at a segment boundary.
fn repeated_origin_tail<'a>(origin: &AssetOrigin, relative: &'a str) -> Option<&'a str> {
    let authority = origin.authority();
    if authority.is_empty() {
        return None;
    }

    relative
        .match_indices(authority)
        .filter(|(index, _)| *index == 0 || relative[..*index].ends_with('/'))
        .filter(|(index, _)| {
            let after = &relative[index + authority.len()..];
            after.is_empty() || after.starts_with(['/', '?', '#'])
        })
        .last()
        .map(|(index, _)| &relative[index + authority.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> AssetOrigin {
        AssetOrigin::parse("https://svc.example").unwrap()
    }

    fn defaults() -> Vec<PathRewrite> {
        vec![PathRewrite::output_dir()]
    }

    #[test]
    fn absolute_urls_are_unchanged() {
        for url in [
            "https://cdn.example/a.png",
            "http://svc.example/files/a.png?v=1",
            "https://svc.example/files/a.png",
            "data:image/png;base64,AAAA",
        ] {
            assert_eq!(resolve(&origin(), url, &defaults()), url);
        }
    }

    #[test]
    fn joins_with_exactly_one_separator() {
        let origin = origin();
        assert_eq!(
            resolve(&origin, "/files/a.png", &[]),
            "https://svc.example/files/a.png"
        );
        assert_eq!(
            resolve(&origin, "files/a.png", &[]),
            "https://svc.example/files/a.png"
        );
        let slashed = AssetOrigin::parse("https://svc.example/").unwrap();
        assert_eq!(
            resolve(&slashed, "/files/a.png", &[]),
            "https://svc.example/files/a.png"
        );
    }

    #[test]
    fn rewrites_internal_output_marker() {
        assert_eq!(
            resolve(&origin(), "./output/12/images/a.png", &defaults()),
            "https://svc.example/output/12/images/a.png"
        );
        assert_eq!(
            resolve(&origin(), ".\\output\\12\\images\\a.png", &defaults()),
            "https://svc.example/output/12/images/a.png"
        );
    }

    #[test]
    fn marker_must_end_at_a_segment_boundary() {
        let rewrites = vec![PathRewrite {
            from: "./output".into(),
            to: "/public".into(),
        }];
        assert_eq!(
            resolve(&origin(), "./outputs/a.png", &rewrites),
            "https://svc.example/outputs/a.png"
        );
    }

    #[test]
    fn collapses_duplicated_origin() {
        assert_eq!(
            resolve(&origin(), "svc.example/files/a.png", &defaults()),
            "https://svc.example/files/a.png"
        );
        assert_eq!(
            resolve(&origin(), "/https://svc.example/files/a.png", &defaults()),
            "https://svc.example/files/a.png"
        );
        assert_eq!(
            resolve(
                &origin(),
                "https://svc.example/https://svc.example/files/a.png",
                &defaults()
            ),
            "https://svc.example/files/a.png"
        );
    }

    #[test]
    fn lookalike_hosts_are_not_collapsed() {
        assert_eq!(
            resolve(&origin(), "svc.example.cdn/a.png", &defaults()),
            "https://svc.example/svc.example.cdn/a.png"
        );
    }

    #[test]
    fn relative_results_start_with_origin_once() {
        let origin = origin();
        for path in ["a.png", "/a.png", "./a.png", "svc.example/a.png", "x/svc.example/a.png"] {
            let resolved = resolve(&origin, path, &defaults());
            assert!(resolved.starts_with("https://svc.example/"), "{resolved}");
            assert_eq!(resolved.matches("svc.example").count(), 1, "{resolved}");
            assert!(!resolved["https://".len()..].contains("//"), "{resolved}");
        }
    }

    #[test]
    fn protocol_relative_paths_take_the_origin_scheme() {
        assert_eq!(
            resolve(&origin(), "//cdn.example/a.png", &defaults()),
            "https://cdn.example/a.png"
        );
    }

    #[test]
    fn blank_input_is_unresolvable() {
        assert_eq!(resolve(&origin(), "", &defaults()), "");
        assert_eq!(resolve(&origin(), "   ", &defaults()), "");
    }

    #[test]
    fn resolver_struct_delegates() {
        let resolver = PathResolver::new(origin(), defaults());
        assert_eq!(resolver.resolve("a.png"), "https://svc.example/a.png");
        assert_eq!(resolver.origin().as_str(), "https://svc.example");
    }
}
