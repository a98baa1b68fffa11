//! Decoding of the conversion service's content payload into a [`RawBundle`].
//!
//! The service has shipped several shapes over time: inline content keyed by filename, byte
//! arrays, base64 strings, pre-resolved URLs, lists of paths and an explicit tagged form. All
//! of them are decoded here into [`AssetSource`] values so that the normalizer only ever sees
//! one representation.

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::asset_paths::is_absolute_url;
use crate::error::{ImportError, Result};
use crate::models::{AssetSource, RawBundle};

/// How bare strings inside the `images` map are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStrings {
  /// Strings are paths to resolve against the asset origin.
  #[default]
  Locator,
  /// Strings are base64-encoded file contents.
  Base64,
}

/// Decoding options that cannot be inferred from the payload itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct WireHints {
  /// Interpretation of bare image strings.
  pub image_strings: ImageStrings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssetKind {
  Text,
  Image,
}

/// Decode a content payload. A payload delivered as a JSON string is parsed once more.
pub fn decode_raw_bundle(payload: Value, hints: &WireHints) -> Result<RawBundle> {
  let payload = match payload {
    Value::String(text) => serde_json::from_str(&text).map_err(|err| {
      ImportError::MalformedBundle(format!("invalid response format from server: {err}"))
    })?,
    other => other,
  };

  let Value::Object(mut fields) = payload else {
    return Err(ImportError::MalformedBundle(
      "content payload must be a JSON object".into(),
    ));
  };

  Ok(RawBundle {
    html: optional_string(&mut fields, "html")?,
    html_locator: optional_string(&mut fields, "html_path")?,
    css: decode_map(fields.remove("css"), AssetKind::Text, hints, "css")?,
    js: decode_map(fields.remove("js"), AssetKind::Text, hints, "js")?,
    images: decode_map(fields.remove("images"), AssetKind::Image, hints, "images")?,
    file_manifest: match fields.remove("file_paths") {
      None | Some(Value::Null) => None,
      Some(Value::String(text)) => Some(text),
      Some(other) => Some(other.to_string()),
    },
  })
}

fn optional_string(fields: &mut Map<String, Value>, key: &str) -> Result<Option<String>> {
  match fields.remove(key) {
    None | Some(Value::Null) => Ok(None),
    Some(Value::String(text)) => Ok(Some(text)),
    Some(_) => Err(ImportError::MalformedBundle(format!(
      "`{key}` must be a string"
    ))),
  }
}

fn decode_map(
  value: Option<Value>,
  kind: AssetKind,
  hints: &WireHints,
  field: &str,
) -> Result<Vec<(String, AssetSource)>> {
  match value {
    None | Some(Value::Null) => Ok(Vec::new()),
    Some(Value::Object(entries)) => entries
      .into_iter()
      .map(|(name, value)| {
        let source = decode_source(&name, value, kind, hints, field)?;
        Ok((name, source))
      })
      .collect(),
    Some(Value::Array(paths)) => paths
      .into_iter()
      .map(|path| match path {
        Value::String(path) => Ok((path.clone(), locator_or_url(path))),
        _ => Err(ImportError::MalformedBundle(format!(
          "`{field}` path list must contain only strings"
        ))),
      })
      .collect(),
    Some(_) => Err(ImportError::MalformedBundle(format!(
      "`{field}` must be an object or a list of paths"
    ))),
  }
}

fn decode_source(
  name: &str,
  value: Value,
  kind: AssetKind,
  hints: &WireHints,
  field: &str,
) -> Result<AssetSource> {
  match value {
    Value::String(text) => classify_string(name, text, kind, hints),
    Value::Array(items) => items
      .iter()
      .map(|item| item.as_u64().and_then(|byte| u8::try_from(byte).ok()))
      .collect::<Option<Vec<u8>>>()
      .map(AssetSource::Bytes)
      .ok_or_else(|| {
        ImportError::MalformedBundle(format!("{field} entry {name} is not a byte array"))
      }),
    Value::Object(_) => serde_json::from_value(value).map_err(|err| {
      ImportError::MalformedBundle(format!("{field} entry {name} has unknown shape: {err}"))
    }),
    _ => Err(ImportError::MalformedBundle(format!(
      "{field} entry {name} has unsupported type"
    ))),
  }
}

fn classify_string(
  name: &str,
  text: String,
  kind: AssetKind,
  hints: &WireHints,
) -> Result<AssetSource> {
  if is_absolute_url(&text) {
    return Ok(AssetSource::ResolvedUrl(text));
  }

  match (kind, hints.image_strings) {
    (AssetKind::Text, _) => Ok(AssetSource::Inline(text)),
    (AssetKind::Image, ImageStrings::Locator) => Ok(AssetSource::Locator(text)),
    (AssetKind::Image, ImageStrings::Base64) => general_purpose::STANDARD
      .decode(text.trim())
      .map(AssetSource::Bytes)
      .map_err(|err| {
        ImportError::MalformedBundle(format!("image {name} is not valid base64: {err}"))
      }),
  }
}

/// Classify an entry of a path list: absolute URLs are used as-is, everything else is fetched.
pub(crate) fn locator_or_url(path: String) -> AssetSource {
  if is_absolute_url(&path) {
    AssetSource::ResolvedUrl(path)
  } else {
    AssetSource::Locator(path)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn decode(value: Value) -> Result<RawBundle> {
    decode_raw_bundle(value, &WireHints::default())
  }

  #[test]
  fn decodes_inline_content_map_in_upstream_order() {
    let raw = decode(json!({
      "html": "<p>hi</p>",
      "css": {"z.css": "a{}", "a.css": "b{}"},
      "js": {"app.js": "run()"},
      "images": {"logo.png": "/output/1/logo.png", "cdn.png": "https://cdn/x.png"}
    }))
    .unwrap();

    assert_eq!(raw.html.as_deref(), Some("<p>hi</p>"));
    assert_eq!(raw.css, vec![
      ("z.css".to_string(), AssetSource::Inline("a{}".into())),
      ("a.css".to_string(), AssetSource::Inline("b{}".into())),
    ]);
    assert_eq!(raw.js, vec![("app.js".to_string(), AssetSource::Inline("run()".into()))]);
    assert_eq!(raw.images, vec![
      ("logo.png".to_string(), AssetSource::Locator("/output/1/logo.png".into())),
      ("cdn.png".to_string(), AssetSource::ResolvedUrl("https://cdn/x.png".into())),
    ]);
  }

  #[test]
  fn parses_double_encoded_payload() {
    let inner = json!({"html": "<p>x</p>", "css": {}, "js": {}, "images": {}}).to_string();
    let raw = decode(Value::String(inner)).unwrap();
    assert_eq!(raw.html.as_deref(), Some("<p>x</p>"));
  }

  #[test]
  fn rejects_unparsable_string_payload() {
    let err = decode(Value::String("not json".into())).unwrap_err();
    assert!(matches!(err, ImportError::MalformedBundle(_)));
  }

  #[test]
  fn decodes_byte_arrays_and_rejects_out_of_range_values() {
    let raw = decode(json!({"html": "", "images": {"a.png": [137, 80, 78, 71]}})).unwrap();
    assert_eq!(raw.images[0].1, AssetSource::Bytes(vec![137, 80, 78, 71]));

    let err = decode(json!({"html": "", "images": {"a.png": [300]}})).unwrap_err();
    assert!(matches!(err, ImportError::MalformedBundle(_)));
  }

  #[test]
  fn base64_hint_decodes_image_strings() {
    let hints = WireHints {
      image_strings: ImageStrings::Base64,
    };
    let raw = decode_raw_bundle(json!({"html": "", "images": {"a.png": "AAEC"}}), &hints).unwrap();
    assert_eq!(raw.images[0].1, AssetSource::Bytes(vec![0, 1, 2]));
  }

  #[test]
  fn accepts_tagged_contract_entries() {
    let raw = decode(json!({
      "html": "",
      "css": {"remote.css": {"kind": "locator", "value": "/output/1/remote.css"}}
    }))
    .unwrap();
    assert_eq!(raw.css[0].1, AssetSource::Locator("/output/1/remote.css".into()));
  }

  #[test]
  fn accepts_path_lists_and_file_manifest() {
    let raw = decode(json!({
      "html_path": "output/1/index.html",
      "css": ["output/1/site.css"],
      "file_paths": {"images": ["output/1/a.png"]}
    }))
    .unwrap();
    assert_eq!(raw.html, None);
    assert_eq!(raw.html_locator.as_deref(), Some("output/1/index.html"));
    assert_eq!(raw.css, vec![(
      "output/1/site.css".to_string(),
      AssetSource::Locator("output/1/site.css".into())
    )]);
    assert_eq!(raw.file_manifest.as_deref(), Some(r#"{"images":["output/1/a.png"]}"#));
  }

  #[test]
  fn rejects_non_string_html() {
    let err = decode(json!({"html": 5})).unwrap_err();
    assert!(matches!(err, ImportError::MalformedBundle(_)));
  }
}
