//! Helpers for resolving and normalising upstream asset paths into loadable URLs.
//!
//! The responsibilities are split so that classifying references, deriving match keys and
//! joining paths onto the asset origin can be tested independently. The resolver is shared by
//! the normalizer and by anything that needs to turn a service-relative path into a URL.

mod filters;
mod names;
mod resolver;

pub use filters::{is_absolute_url, is_embedded_data};
pub use names::{file_name_key, normalise_separators, path_key};
pub use resolver::{PathResolver, PathRewrite, resolve};
