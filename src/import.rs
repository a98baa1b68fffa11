//! End-to-end import: submit a URL, wait for the conversion, normalize and deliver.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::HttpConversionClient;
use crate::config::ImporterConfig;
use crate::error::{ImportError, Result};
use crate::models::{ConversionJob, JobStatus, NormalizedBundle, RawBundle};
use crate::normalize::ConversionNormalizer;
use crate::sink::ByteSink;
use crate::surface::EditingSurface;
use crate::wire::{WireHints, decode_raw_bundle};

/// Remote conversion service boundary.
#[async_trait]
pub trait ConversionService: Send + Sync {
  /// Request conversion of `url`. The returned job may already be terminal.
  async fn submit(&self, url: &str) -> Result<ConversionJob>;
  /// Current state of a previously submitted job.
  async fn status(&self, job_id: &str) -> Result<ConversionJob>;
  /// Raw content payload of a completed job.
  async fn fetch_content(&self, job_id: &str) -> Result<Value>;
}

/// Drives one import per call. Holds no per-import state, so concurrent imports through the
/// same controller are independent.
pub struct ImportController {
  service: Arc<dyn ConversionService>,
  normalizer: ConversionNormalizer,
  hints: WireHints,
  poll_interval: Duration,
  max_status_checks: Option<u32>,
}

impl ImportController {
  /// Create a controller polling once per second without a check limit.
  pub fn new(service: Arc<dyn ConversionService>, normalizer: ConversionNormalizer) -> Self {
    Self {
      service,
      normalizer,
      hints: WireHints::default(),
      poll_interval: Duration::from_secs(1),
      max_status_checks: None,
    }
  }

  /// Build a controller talking HTTP to the configured service.
  pub fn from_config(config: &ImporterConfig, sink: Arc<dyn ByteSink>) -> Result<Self> {
    let client = Arc::new(HttpConversionClient::new(config)?);
    let normalizer = ConversionNormalizer::new(config.resolver()?, client.clone(), sink)
      .with_strategy(config.match_strategy);

    Ok(
      Self::new(client, normalizer)
        .with_polling(config.poll_interval(), config.max_status_checks)
        .with_wire_hints(config.wire_hints()),
    )
  }

  /// Override the status polling policy.
  pub fn with_polling(mut self, interval: Duration, max_status_checks: Option<u32>) -> Self {
    self.poll_interval = interval;
    self.max_status_checks = max_status_checks;
    self
  }

  /// Override payload decoding hints.
  pub fn with_wire_hints(mut self, hints: WireHints) -> Self {
    self.hints = hints;
    self
  }

  /// Convert `url` and return the normalized bundle.
  ///
  /// Dropping the returned future abandons any in-flight request; nothing is delivered
  /// anywhere until the whole pipeline has succeeded.
  pub async fn import_from_url(&self, url: &str) -> Result<NormalizedBundle> {
    let url = url.trim();
    if url.is_empty() {
      return Err(ImportError::InvalidUrl("Please enter a URL".into()));
    }

    let submitted = self.service.submit(url).await?;
    tracing::info!(job_id = %submitted.id, status = ?submitted.status, "Conversion job submitted");

    let job = self.await_completion(submitted).await?;
    if job.status == JobStatus::Failed {
      let message = job.failure_message();
      tracing::warn!(job_id = %job.id, error = %message, "Conversion job failed");
      return Err(ImportError::ConversionFailed(message));
    }

    let payload = self.service.fetch_content(&job.id).await?;
    let raw = with_job_fallbacks(decode_raw_bundle(payload, &self.hints)?, &job);
    self.normalizer.normalize(raw).await
  }

  /// Import `url` and hand the result to `surface`. The surface is untouched on failure.
  pub async fn import_into<S>(&self, url: &str, surface: &mut S) -> Result<NormalizedBundle>
  where
    S: EditingSurface + ?Sized,
  {
    let bundle = self.import_from_url(url).await?;
    surface.load(&bundle.html, &bundle.css, &bundle.js, &bundle.images)?;
    Ok(bundle)
  }

  async fn await_completion(&self, mut job: ConversionJob) -> Result<ConversionJob> {
    let mut checks = 0u32;
    while !job.status.is_terminal() {
      if let Some(max) = self.max_status_checks
        && checks >= max
      {
        return Err(ImportError::Network(format!(
          "conversion job {} still {:?} after {checks} status checks",
          job.id, job.status
        )));
      }

      tokio::time::sleep(self.poll_interval).await;
      checks += 1;
      job = self.service.status(&job.id).await?;
      tracing::debug!(job_id = %job.id, status = ?job.status, checks, "Polled conversion job");
    }
    Ok(job)
  }
}

/// Fill in the HTML location and file listing reported on the job when the content payload
/// carries nothing of its own.
fn with_job_fallbacks(mut raw: RawBundle, job: &ConversionJob) -> RawBundle {
  if raw.html.is_none() && raw.html_locator.is_none() {
    raw.html_locator = job.html_path.clone();
  }
  let carries_assets = !raw.css.is_empty() || !raw.js.is_empty() || !raw.images.is_empty();
  if raw.file_manifest.is_none() && !carries_assets {
    raw.file_manifest = job.file_paths.clone();
  }
  raw
}
