/// Replace Windows separators so that paths reported by the service behave like URL paths.
pub fn normalise_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Derive the match key for an asset reference from its filename portion.
///
/// Directories, query strings and fragments are dropped, so `./img/logo.png?v=2` and
/// `/static/img/logo.png` both yield `logo.png`.
pub fn file_name_key(reference: &str) -> String {
    let path = strip_suffixes(reference);
    let normalised = normalise_separators(path);
    normalised
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Derive the match key for an asset reference from its full relative path.
///
/// Leading `./` and `/` segments, query strings and fragments are dropped so that
/// `./img/logo.png` and `/img/logo.png?v=1` compare equal.
pub fn path_key(reference: &str) -> String {
    let normalised = normalise_separators(strip_suffixes(reference));
    let mut rest = normalised.as_str();
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        } else {
            break;
        }
    }
    rest.to_string()
}

fn strip_suffixes(reference: &str) -> &str {
    let end = reference.find(['?', '#']).unwrap_or(reference.len());
    reference[..end].trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_ignores_directories_and_query() {
        assert_eq!(file_name_key("./img/logo.png"), "logo.png");
        assert_eq!(file_name_key("/static/img/logo.png?v=2#top"), "logo.png");
        assert_eq!(file_name_key("logo.png"), "logo.png");
    }

    #[test]
    fn normalises_backslashes_from_windows_inputs() {
        assert_eq!(file_name_key("output\\12\\images\\hero.jpg"), "hero.jpg");
        assert_eq!(normalise_separators("a\\b/c"), "a/b/c");
    }

    #[test]
    fn path_key_drops_relative_prefixes() {
        assert_eq!(path_key("./img/logo.png"), "img/logo.png");
        assert_eq!(path_key("/img/logo.png?v=1"), "img/logo.png");
        assert_eq!(path_key(".//img/logo.png"), "img/logo.png");
    }

    #[test]
    fn blank_reference_yields_empty_key() {
        assert_eq!(file_name_key(""), "");
        assert_eq!(path_key("?v=1"), "");
    }
}
