//! Adapters that receive a normalized bundle for rendering or storage.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ImportError, Result};

/// Target that accepts a fully normalized bundle.
///
/// Implementations are handed a bundle only after normalization succeeded; they never see
/// partial results.
pub trait EditingSurface {
  /// Replace the surface content with the given document, styles, scripts and image URLs.
  fn load(&mut self, html: &str, css: &str, js: &str, images: &[String]) -> Result<()>;
}

/// Surface that writes the bundle into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySurface {
  root: PathBuf,
}

impl DirectorySurface {
  /// Name of the written HTML document.
  pub const HTML_FILE: &'static str = "index.html";
  /// Name of the combined stylesheet.
  pub const CSS_FILE: &'static str = "styles.css";
  /// Name of the combined script.
  pub const JS_FILE: &'static str = "scripts.js";
  /// Name of the JSON list of resolved image URLs.
  pub const IMAGES_FILE: &'static str = "images.json";

  /// Create a surface rooted at `root`. The directory is created on first load.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Directory the bundle is written to.
  pub fn root(&self) -> &Path {
    &self.root
  }

  fn write(&self, name: &str, contents: &str) -> Result<()> {
    let target = self.root.join(name);
    fs::write(&target, contents)
      .map_err(|err| ImportError::Surface(format!("failed to write {}: {err}", target.display())))
  }
}

impl EditingSurface for DirectorySurface {
  fn load(&mut self, html: &str, css: &str, js: &str, images: &[String]) -> Result<()> {
    fs::create_dir_all(&self.root).map_err(|err| {
      ImportError::Surface(format!("failed to create {}: {err}", self.root.display()))
    })?;

    let images_json = serde_json::to_string_pretty(images)
      .map_err(|err| ImportError::Surface(format!("failed to encode image list: {err}")))?;

    self.write(Self::HTML_FILE, html)?;
    self.write(Self::CSS_FILE, css)?;
    self.write(Self::JS_FILE, js)?;
    self.write(Self::IMAGES_FILE, &images_json)?;

    tracing::info!(root = %self.root.display(), images = images.len(), "Wrote imported bundle");
    Ok(())
  }
}
