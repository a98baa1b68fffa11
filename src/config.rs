//! Importer configuration loader describing the conversion service and normalization policy.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::asset_paths::{PathResolver, PathRewrite};
use crate::bundle::MatchStrategy;
use crate::error::{ImportError, Result};
use crate::models::AssetOrigin;
use crate::wire::{ImageStrings, WireHints};

const DEFAULT_CONFIG_FILE: &str = "site-import.config.json";

/// Environment variable overriding [`ImporterConfig::service_url`].
pub const SERVICE_URL_ENV: &str = "SITE_IMPORT_SERVICE_URL";
/// Environment variable overriding [`ImporterConfig::asset_origin`].
pub const ASSET_ORIGIN_ENV: &str = "SITE_IMPORT_ASSET_ORIGIN";

/// Discoverable importer configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImporterConfig {
  /// Base URL of the conversion API.
  pub service_url: String,
  /// Base URL relative asset paths are resolved against. Empty means `service_url`.
  pub asset_origin: String,
  /// Endpoint accepting `{"url": ...}` and returning the created job.
  pub convert_path: String,
  /// Endpoint returning a job's current state. `{id}` is replaced by the job handle.
  pub status_path: String,
  /// Endpoint returning a completed job's bundle. `{id}` is replaced by the job handle.
  pub content_path: String,
  /// Server-local path markers rewritten before resolution.
  pub path_rewrites: Vec<PathRewrite>,
  /// How HTML `src` values are matched against image identifiers.
  pub match_strategy: MatchStrategy,
  /// Interpretation of bare strings in the `images` map.
  pub image_strings: ImageStrings,
  /// Delay between status checks while a job is pending.
  pub poll_interval_ms: u64,
  /// Optional cap on status checks before giving up.
  pub max_status_checks: Option<u32>,
  /// Per-request transport timeout.
  pub request_timeout_secs: u64,
}

impl Default for ImporterConfig {
  fn default() -> Self {
    Self {
      service_url: "http://localhost:8080".into(),
      asset_origin: String::new(),
      convert_path: "/api/templates/convert".into(),
      status_path: "/api/templates/{id}".into(),
      content_path: "/api/templates/{id}/content".into(),
      path_rewrites: vec![PathRewrite::output_dir()],
      match_strategy: MatchStrategy::FileName,
      image_strings: ImageStrings::Locator,
      poll_interval_ms: 1000,
      max_status_checks: None,
      request_timeout_secs: 30,
    }
  }
}

impl ImporterConfig {
  /// Attempt to load configuration from the provided directory.
  ///
  /// A missing configuration file yields the defaults; a present but unreadable or invalid
  /// one is an error.
  pub fn discover(dir: &Path) -> Result<Self> {
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    if !candidate.exists() {
      return Ok(Self::default());
    }
    Self::from_path(&candidate)
  }

  /// Read configuration from a specific JSON file.
  pub fn from_path(path: &Path) -> Result<Self> {
    let content = fs::read_to_string(path)
      .map_err(|err| ImportError::Config(format!("failed to read {}: {err}", path.display())))?;
    serde_json::from_str(&content)
      .map_err(|err| ImportError::Config(format!("failed to parse {}: {err}", path.display())))
  }

  /// Apply `SITE_IMPORT_*` environment overrides.
  pub fn apply_env(mut self) -> Self {
    if let Ok(value) = std::env::var(SERVICE_URL_ENV)
      && !value.trim().is_empty()
    {
      self.service_url = value;
    }
    if let Ok(value) = std::env::var(ASSET_ORIGIN_ENV)
      && !value.trim().is_empty()
    {
      self.asset_origin = value;
    }
    self
  }

  /// Validated service base URL without a trailing slash.
  pub fn service_base(&self) -> Result<AssetOrigin> {
    AssetOrigin::parse(&self.service_url)
  }

  /// Validated asset origin, falling back to the service URL.
  pub fn origin(&self) -> Result<AssetOrigin> {
    if self.asset_origin.trim().is_empty() {
      self.service_base()
    } else {
      AssetOrigin::parse(&self.asset_origin)
    }
  }

  /// Build the path resolver for this configuration.
  pub fn resolver(&self) -> Result<PathResolver> {
    Ok(PathResolver::new(self.origin()?, self.path_rewrites.clone()))
  }

  /// Wire decoding hints for this configuration.
  pub fn wire_hints(&self) -> WireHints {
    WireHints {
      image_strings: self.image_strings,
    }
  }

  /// Delay between status checks.
  pub fn poll_interval(&self) -> Duration {
    Duration::from_millis(self.poll_interval_ms)
  }

  /// Transport timeout for a single request.
  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }
}
