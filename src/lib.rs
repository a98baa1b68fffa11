#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod asset_paths;
pub mod bundle;
pub mod client;
pub mod config;
pub mod error;
pub mod import;
pub mod models;
pub mod normalize;
pub mod sink;
pub mod surface;
pub mod wire;

pub use asset_paths::{PathResolver, PathRewrite};
pub use bundle::{FragmentLanguage, MatchStrategy, combine_fragments, rewrite_references};
pub use client::HttpConversionClient;
pub use config::ImporterConfig;
pub use error::{ImportError, Result};
pub use import::{ConversionService, ImportController};
pub use models::{AssetOrigin, AssetSource, ConversionJob, JobStatus, NormalizedBundle, RawBundle};
pub use normalize::{AssetFetcher, ConversionNormalizer};
pub use sink::{ByteSink, DataUriSink};
pub use surface::{DirectorySurface, EditingSurface};
