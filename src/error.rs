//! Error taxonomy shared by every stage of an import.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ImportError>;

/// Failure surfaced to the caller of an import. Normalization is all-or-nothing, so any of
/// these means no bundle was produced.
#[derive(Debug, Error)]
pub enum ImportError {
  /// A required field (such as `html`) is missing or the payload could not be parsed.
  #[error("malformed bundle: {0}")]
  MalformedBundle(String),

  /// A secondary fetch for css, js, html or image content failed.
  #[error("failed to fetch asset {identifier}: {reason}")]
  AssetFetch {
    /// Identifier of the asset as it appeared in the upstream bundle.
    identifier: String,
    /// Human readable cause.
    reason: String,
  },

  /// The upstream conversion job ended in `failed` status.
  #[error("conversion failed: {0}")]
  ConversionFailed(String),

  /// Transport level failure talking to the conversion service.
  #[error("network error: {0}")]
  Network(String),

  /// Non-success HTTP status returned by the conversion service.
  #[error("API error (status {status}): {message}")]
  Api {
    /// HTTP status code.
    status: u16,
    /// Response body, if any.
    message: String,
  },

  /// The URL supplied for import was empty or unusable.
  #[error("invalid URL: {0}")]
  InvalidUrl(String),

  /// The editing surface rejected or failed to store the bundle.
  #[error("editing surface error: {0}")]
  Surface(String),

  /// Configuration could not be loaded or validated.
  #[error("configuration error: {0}")]
  Config(String),
}

impl ImportError {
  /// Build an [`ImportError::AssetFetch`] for the given identifier.
  pub fn asset_fetch(identifier: impl Into<String>, reason: impl ToString) -> Self {
    Self::AssetFetch {
      identifier: identifier.into(),
      reason: reason.to_string(),
    }
  }
}

impl From<reqwest::Error> for ImportError {
  fn from(err: reqwest::Error) -> Self {
    ImportError::Network(err.to_string())
  }
}
