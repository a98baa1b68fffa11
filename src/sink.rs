//! Substitution point for image assets delivered as raw bytes.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};

use crate::error::Result;

/// Turns raw asset bytes into a loadable URL.
///
/// The pipeline never persists bytes itself; deployments that store uploads elsewhere plug in
/// their own implementation.
#[async_trait]
pub trait ByteSink: Send + Sync {
  /// Store `bytes` for the asset originally referenced as `name` and return its URL.
  async fn store(&self, name: &str, bytes: &[u8]) -> Result<String>;
}

/// Default sink that embeds bytes as a base64 `data:` URI.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUriSink;

#[async_trait]
impl ByteSink for DataUriSink {
  async fn store(&self, name: &str, bytes: &[u8]) -> Result<String> {
    Ok(data_uri(name, bytes))
  }
}

/// Encode bytes as a data URI, guessing the MIME type from the asset name's extension.
pub fn data_uri(name: &str, bytes: &[u8]) -> String {
  let encoded = general_purpose::STANDARD.encode(bytes);
  format!("data:{};base64,{encoded}", mime_for(name))
}

fn mime_for(name: &str) -> &'static str {
  let clean = name.split(['?', '#']).next().unwrap_or_default();
  let extension = clean
    .rsplit_once('.')
    .map(|(_, ext)| ext.to_ascii_lowercase())
    .unwrap_or_default();

  match extension.as_str() {
    "png" => "image/png",
    "jpg" | "jpeg" => "image/jpeg",
    "gif" => "image/gif",
    "svg" => "image/svg+xml",
    "webp" => "image/webp",
    "avif" => "image/avif",
    "ico" => "image/x-icon",
    "bmp" => "image/bmp",
    _ => "application/octet-stream",
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn encodes_known_image_types() {
    assert_eq!(data_uri("a.png", &[0, 1, 2]), "data:image/png;base64,AAEC");
    assert!(data_uri("img/Photo.JPG?v=1", b"x").starts_with("data:image/jpeg;base64,"));
  }

  #[test]
  fn unknown_extensions_fall_back_to_octet_stream() {
    assert!(data_uri("blob", b"x").starts_with("data:application/octet-stream;base64,"));
  }

  #[tokio::test]
  async fn data_uri_sink_returns_embedded_url() {
    let url = DataUriSink.store("logo.svg", b"<svg/>").await.unwrap();
    assert_eq!(url, "data:image/svg+xml;base64,PHN2Zy8+");
  }
}
