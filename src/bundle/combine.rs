//! Merging of named stylesheet and script fragments into single embeddable blobs.

/// Language of the fragments being combined, which decides the provenance comment syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentLanguage {
    /// Stylesheets, marked with `/* name */`.
    Css,
    /// Scripts, marked with `// name`.
    Js,
}

impl FragmentLanguage {
    fn marker(self, name: &str) -> String {
        let single_line = name.replace(['\r', '\n'], " ");
        match self {
            FragmentLanguage::Css => format!("/* {} */", single_line.replace("*/", "* /")),
            FragmentLanguage::Js => format!("// {single_line}"),
        }
    }
}

/// Combine fragments in the supplied order, each preceded by a comment naming its source.
///
/// Fragments are separated by a blank line. An empty slice yields an empty string.
pub fn combine_fragments(fragments: &[(String, String)], language: FragmentLanguage) -> String {
    fragments
        .iter()
        .map(|(name, content)| format!("{}\n{}", language.marker(name), content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
