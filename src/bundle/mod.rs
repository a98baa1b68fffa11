//! Helpers for turning converted documents and their assets into one embeddable bundle.

pub mod combine;
pub mod rewrite;

pub use combine::{FragmentLanguage, combine_fragments};
pub use rewrite::{MatchStrategy, rewrite_references};
