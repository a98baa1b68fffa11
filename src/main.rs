use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use site_importer::{DataUriSink, DirectorySurface, ImportController, ImporterConfig};

/// Convert a live page through the conversion service and write the normalized bundle.
#[derive(Debug, Parser)]
#[command(name = "site-import", version, about)]
struct Cli {
  /// Page to import.
  url: String,

  /// Configuration file; defaults to `site-import.config.json` in the working directory.
  #[arg(long)]
  config: Option<PathBuf>,

  /// Directory the normalized bundle is written to.
  #[arg(long, default_value = "imported")]
  out: PathBuf,

  /// Override the conversion service base URL.
  #[arg(long)]
  service_url: Option<String>,

  /// Override the origin relative asset paths are resolved against.
  #[arg(long)]
  asset_origin: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env().add_directive("site_importer=info".parse()?))
    .init();

  let cli = Cli::parse();

  let config = match &cli.config {
    Some(path) => ImporterConfig::from_path(path)
      .with_context(|| format!("failed to load {}", path.display()))?,
    None => {
      let cwd = std::env::current_dir().context("failed to determine working directory")?;
      ImporterConfig::discover(&cwd).context("failed to load importer configuration")?
    }
  };
  let mut config = config.apply_env();
  if let Some(service_url) = cli.service_url {
    config.service_url = service_url;
  }
  if let Some(asset_origin) = cli.asset_origin {
    config.asset_origin = asset_origin;
  }

  let controller = ImportController::from_config(&config, Arc::new(DataUriSink))
    .context("failed to set up importer")?;
  let mut surface = DirectorySurface::new(&cli.out);

  let bundle = controller
    .import_into(&cli.url, &mut surface)
    .await
    .with_context(|| format!("failed to import {}", cli.url))?;

  println!(
    "Imported {} into {} ({} images)",
    cli.url,
    surface.root().display(),
    bundle.images.len()
  );
  Ok(())
}
