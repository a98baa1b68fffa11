//! Conversion of any supported upstream bundle shape into one [`NormalizedBundle`].

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::asset_paths::{PathResolver, is_absolute_url};
use crate::bundle::{FragmentLanguage, MatchStrategy, combine_fragments, rewrite_references};
use crate::error::{ImportError, Result};
use crate::models::{AssetSource, NormalizedBundle, RawBundle};
use crate::sink::ByteSink;
use crate::wire::locator_or_url;

/// Fetches the text content behind an absolute URL.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
  /// Return the body at `url` as text.
  async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// What a resolved asset is needed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssetRole {
  /// CSS, JS or HTML: the content itself is required.
  Text,
  /// Images: only a loadable URL is required.
  Image,
}

/// File listing carried as stringified JSON by path-list style payloads.
#[derive(Debug, Default, Deserialize)]
struct FileManifest {
  #[serde(default)]
  css: Vec<String>,
  #[serde(default)]
  js: Vec<String>,
  #[serde(default)]
  images: Vec<String>,
}

/// Orchestrates path resolution, reference rewriting and fragment combination.
pub struct ConversionNormalizer {
  resolver: PathResolver,
  strategy: MatchStrategy,
  fetcher: Arc<dyn AssetFetcher>,
  sink: Arc<dyn ByteSink>,
}

impl ConversionNormalizer {
  /// Create a normalizer using the file-name match strategy.
  pub fn new(
    resolver: PathResolver,
    fetcher: Arc<dyn AssetFetcher>,
    sink: Arc<dyn ByteSink>,
  ) -> Self {
    Self {
      resolver,
      strategy: MatchStrategy::default(),
      fetcher,
      sink,
    }
  }

  /// Override how HTML references are matched against image identifiers.
  pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
    self.strategy = strategy;
    self
  }

  /// Normalize a raw bundle. Either every asset resolves or the whole call fails.
  pub async fn normalize(&self, raw: RawBundle) -> Result<NormalizedBundle> {
    let RawBundle {
      html,
      html_locator,
      mut css,
      mut js,
      mut images,
      file_manifest,
    } = raw;

    if let Some(manifest) = file_manifest {
      let listed = parse_file_manifest(&manifest)?;
      append_listed(&mut css, listed.css);
      append_listed(&mut js, listed.js);
      append_listed(&mut images, listed.images);
    }

    let html = match (html, html_locator) {
      (Some(html), _) if !html.trim().is_empty() => html,
      (_, Some(locator)) if !locator.trim().is_empty() => {
        self
          .resolve_source("html", AssetSource::Locator(locator), AssetRole::Text)
          .await?
      }
      _ => {
        return Err(ImportError::MalformedBundle(
          "bundle does not contain any html".into(),
        ));
      }
    };

    let mut original_to_resolved = Vec::with_capacity(images.len());
    let mut image_urls = Vec::new();
    let mut seen = HashSet::new();
    for (original, source) in images {
      let url = self
        .resolve_source(&original, source, AssetRole::Image)
        .await?;
      if url.is_empty() {
        tracing::warn!(image = %original, "Skipping unresolvable image reference");
        continue;
      }
      tracing::debug!(image = %original, url = %url, "Resolved image");
      if seen.insert(url.clone()) {
        image_urls.push(url.clone());
      }
      original_to_resolved.push((original, url));
    }

    let html = rewrite_references(&html, &original_to_resolved, self.strategy);
    let css = self.materialize(css).await?;
    let js = self.materialize(js).await?;

    tracing::info!(
      stylesheets = css.len(),
      scripts = js.len(),
      images = image_urls.len(),
      "Normalized converted bundle"
    );

    Ok(NormalizedBundle {
      html,
      css: combine_fragments(&css, FragmentLanguage::Css),
      js: combine_fragments(&js, FragmentLanguage::Js),
      images: image_urls,
    })
  }

  async fn materialize(&self, entries: Vec<(String, AssetSource)>) -> Result<Vec<(String, String)>> {
    let mut fragments = Vec::with_capacity(entries.len());
    for (name, source) in entries {
      let content = self.resolve_source(&name, source, AssetRole::Text).await?;
      fragments.push((name, content));
    }
    Ok(fragments)
  }

  /// Single dispatch point over every upstream asset shape.
  async fn resolve_source(&self, name: &str, source: AssetSource, role: AssetRole) -> Result<String> {
    match (source, role) {
      (AssetSource::Inline(text), AssetRole::Text) => Ok(text),
      (AssetSource::Bytes(bytes), AssetRole::Text) => String::from_utf8(bytes).map_err(|err| {
        ImportError::MalformedBundle(format!("{name} is not valid UTF-8: {err}"))
      }),
      (AssetSource::Locator(path), AssetRole::Text) => {
        let url = self.resolver.resolve(&path);
        if url.is_empty() {
          return Err(ImportError::asset_fetch(name, "empty locator"));
        }
        self.fetch(name, &url).await
      }
      (AssetSource::ResolvedUrl(url), AssetRole::Text) => self.fetch(name, &url).await,
      (AssetSource::Locator(path), AssetRole::Image) => Ok(self.resolver.resolve(&path)),
      (AssetSource::ResolvedUrl(url), AssetRole::Image) => Ok(self.resolver.resolve(&url)),
      (AssetSource::Inline(text), AssetRole::Image) if is_absolute_url(&text) => {
        Ok(self.resolver.resolve(&text))
      }
      (AssetSource::Inline(text), AssetRole::Image) => self.sink.store(name, text.as_bytes()).await,
      (AssetSource::Bytes(bytes), AssetRole::Image) => self.sink.store(name, &bytes).await,
    }
  }

  async fn fetch(&self, name: &str, url: &str) -> Result<String> {
    tracing::debug!(asset = name, url, "Fetching asset content");
    self.fetcher.fetch_text(url).await.map_err(|err| match err {
      ImportError::AssetFetch { .. } => err,
      other => ImportError::asset_fetch(name, other),
    })
  }
}

fn parse_file_manifest(manifest: &str) -> Result<FileManifest> {
  if manifest.trim().is_empty() {
    return Ok(FileManifest::default());
  }
  serde_json::from_str(manifest).map_err(|err| ImportError::asset_fetch("file_paths", err))
}

fn append_listed(entries: &mut Vec<(String, AssetSource)>, paths: Vec<String>) {
  for path in paths {
    if entries.iter().any(|(name, _)| *name == path) {
      continue;
    }
    entries.push((path.clone(), locator_or_url(path)));
  }
}
