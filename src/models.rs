//! Data structures passed between the conversion service and the normalization pipeline.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ImportError, Result};

/// Lifecycle state of a conversion job as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
  /// Accepted but not started.
  Pending,
  /// Currently rendering or downloading assets.
  #[serde(alias = "in_progress")]
  Processing,
  /// Finished; the result handle can be fetched.
  #[serde(alias = "complete")]
  Completed,
  /// Finished with an error message.
  Failed,
}

impl JobStatus {
  /// Returns `true` once the job will no longer change state.
  pub fn is_terminal(self) -> bool {
    matches!(self, JobStatus::Completed | JobStatus::Failed)
  }
}

/// One conversion attempt. Read-only input to the pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConversionJob {
  /// Opaque result handle used to query status and fetch content.
  #[serde(deserialize_with = "handle_from_any")]
  pub id: String,
  /// URL that was submitted for conversion.
  #[serde(default, alias = "original_url")]
  pub source_url: String,
  /// Current status.
  pub status: JobStatus,
  /// Upstream error, populated for failed jobs.
  #[serde(default, deserialize_with = "nullable_message")]
  pub error_message: Option<String>,
  /// Server-side location of the converted HTML, when reported.
  #[serde(default)]
  pub html_path: Option<String>,
  /// Stringified JSON listing the converted asset files, when reported.
  #[serde(default)]
  pub file_paths: Option<String>,
}

impl ConversionJob {
  /// Message describing why the job failed, falling back to a generic description.
  pub fn failure_message(&self) -> String {
    self
      .error_message
      .as_deref()
      .map(str::trim)
      .filter(|message| !message.is_empty())
      .unwrap_or("Failed to process URL")
      .to_string()
  }
}

/// Envelope returned by the conversion endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversionResponse {
  /// Informational message from the service.
  #[serde(default)]
  pub message: Option<String>,
  /// The created or updated job.
  #[serde(alias = "template")]
  pub conversion: ConversionJob,
}

fn handle_from_any<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Handle {
    Number(i64),
    Text(String),
  }

  Ok(match Handle::deserialize(deserializer)? {
    Handle::Number(value) => value.to_string(),
    Handle::Text(value) => value,
  })
}

/// Accept a plain string, `null`, or a `{"String": .., "Valid": ..}` nullable-string object.
fn nullable_message<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Message {
    Text(String),
    Nullable {
      #[serde(rename = "String", default)]
      text: String,
      #[serde(rename = "Valid", default)]
      valid: bool,
    },
  }

  Ok(match Option::<Message>::deserialize(deserializer)? {
    Some(Message::Text(text)) => Some(text),
    Some(Message::Nullable { text, valid: true }) => Some(text),
    Some(Message::Nullable { valid: false, .. }) | None => None,
  })
}

/// Where the content of a single upstream asset lives.
///
/// Every upstream response shape is decoded into one of these variants, and the normalizer
/// dispatches on them in a single place.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AssetSource {
  /// A path or URL that must be resolved (and, for text assets, fetched).
  #[serde(alias = "by_locator")]
  Locator(String),
  /// Content supplied directly in the payload.
  Inline(String),
  /// Raw bytes that must go through a byte sink to obtain a URL.
  Bytes(Vec<u8>),
  /// A URL that is already absolute and loadable.
  #[serde(alias = "url")]
  ResolvedUrl(String),
}

/// Upstream payload prior to normalization. Consumed by exactly one normalization call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawBundle {
  /// Document markup, when delivered inline.
  pub html: Option<String>,
  /// Locator for the document markup when it must be fetched separately.
  pub html_locator: Option<String>,
  /// Stylesheets in upstream order, keyed by filename or original path.
  pub css: Vec<(String, AssetSource)>,
  /// Scripts in upstream order, keyed by filename or original path.
  pub js: Vec<(String, AssetSource)>,
  /// Images in upstream order, keyed by the reference used in the HTML.
  pub images: Vec<(String, AssetSource)>,
  /// Stringified JSON file-path manifest that must be parsed and fetched.
  pub file_manifest: Option<String>,
}

/// Canonical output handed to the editing surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedBundle {
  /// Document with every image reference rewritten to a resolved URL.
  pub html: String,
  /// All stylesheets combined into one fragment.
  pub css: String,
  /// All scripts combined into one fragment.
  pub js: String,
  /// Resolved image URLs, first-seen order, without duplicates.
  pub images: Vec<String>,
}

/// Base URL of the conversion service used to resolve relative asset paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetOrigin(String);

impl AssetOrigin {
  /// Validate and normalise an origin. Trailing slashes are dropped.
  pub fn parse(value: &str) -> Result<Self> {
    let trimmed = value.trim().trim_end_matches('/');
    let parsed = reqwest::Url::parse(trimmed)
      .map_err(|err| ImportError::Config(format!("invalid asset origin {value:?}: {err}")))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
      return Err(ImportError::Config(format!(
        "asset origin must be an absolute http(s) URL, got {value:?}"
      )));
    }
    Ok(Self(trimmed.to_string()))
  }

  /// Origin without a trailing slash.
  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Origin with the scheme removed, e.g. `svc.example:8080/base`.
  pub fn authority(&self) -> &str {
    self
      .0
      .split_once("://")
      .map(|(_, rest)| rest)
      .unwrap_or(&self.0)
  }
}

impl fmt::Display for AssetOrigin {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}
