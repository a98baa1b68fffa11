//! HTTP client for the conversion service.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ImporterConfig;
use crate::error::{ImportError, Result};
use crate::import::ConversionService;
use crate::models::{ConversionJob, ConversionResponse};
use crate::normalize::AssetFetcher;

/// REST client for the conversion API; also fetches secondary asset content.
pub struct HttpConversionClient {
    client: reqwest::Client,
    base_url: String,
    convert_path: String,
    status_path: String,
    content_path: String,
}

impl HttpConversionClient {
    /// Build a client from the importer configuration.
    pub fn new(config: &ImporterConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.service_base()?.as_str().to_string(),
            convert_path: config.convert_path.clone(),
            status_path: config.status_path.clone(),
            content_path: config.content_path.clone(),
        })
    }

    fn endpoint(&self, template: &str, job_id: Option<&str>) -> String {
        let path = match job_id {
            Some(id) => template.replace("{id}", id),
            None => template.to_string(),
        };
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().await?;
        let resp = check_status(resp).await?;
        Ok(resp.text().await?)
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(ImportError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Accept either a bare job object or one wrapped in a `conversion`/`template` envelope.
fn decode_job(body: &str) -> Result<ConversionJob> {
    let value: Value = serde_json::from_str(body).map_err(|err| {
        ImportError::MalformedBundle(format!("invalid conversion job payload: {err}"))
    })?;

    let job = if value.get("conversion").is_some() || value.get("template").is_some() {
        serde_json::from_value::<ConversionResponse>(value).map(|resp| resp.conversion)
    } else {
        serde_json::from_value::<ConversionJob>(value)
    };

    job.map_err(|err| ImportError::MalformedBundle(format!("invalid conversion job payload: {err}")))
}

#[async_trait]
impl ConversionService for HttpConversionClient {
    async fn submit(&self, url: &str) -> Result<ConversionJob> {
        let endpoint = self.endpoint(&self.convert_path, None);
        tracing::info!(url, endpoint = endpoint.as_str(), "Submitting conversion request");

        let resp = self
            .client
            .post(&endpoint)
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await?;
        let body = check_status(resp).await?.text().await?;
        decode_job(&body)
    }

    async fn status(&self, job_id: &str) -> Result<ConversionJob> {
        let endpoint = self.endpoint(&self.status_path, Some(job_id));
        let body = self.get_text(&endpoint).await?;
        decode_job(&body)
    }

    async fn fetch_content(&self, job_id: &str) -> Result<Value> {
        let endpoint = self.endpoint(&self.content_path, Some(job_id));
        tracing::info!(job_id, endpoint = endpoint.as_str(), "Fetching converted content");

        let body = self.get_text(&endpoint).await?;
        serde_json::from_str(&body).map_err(|err| {
            ImportError::MalformedBundle(format!("invalid response format from server: {err}"))
        })
    }
}

#[async_trait]
impl AssetFetcher for HttpConversionClient {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.get_text(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobStatus;
    use mockito::{Matcher, Server};

    fn build_client(url: String) -> HttpConversionClient {
        let config = ImporterConfig {
            service_url: url,
            request_timeout_secs: 5,
            ..ImporterConfig::default()
        };
        HttpConversionClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn submit_posts_url_and_decodes_envelope() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/templates/convert")
            .match_body(Matcher::Json(serde_json::json!({"url": "https://example.com"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"message":"ok","conversion":{"id":9,"original_url":"https://example.com","status":"in_progress"}}"#,
            )
            .create_async()
            .await;

        let job = build_client(server.url())
            .submit("https://example.com")
            .await
            .expect("job should be decoded");

        mock.assert_async().await;
        assert_eq!(job.id, "9");
        assert_eq!(job.status, JobStatus::Processing);
    }

    #[tokio::test]
    async fn status_accepts_bare_job_objects() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/templates/9")
            .with_status(200)
            .with_body(r#"{"id":"9","status":"failed","error_message":"timeout"}"#)
            .create_async()
            .await;

        let job = build_client(server.url()).status("9").await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.failure_message(), "timeout");
    }

    #[tokio::test]
    async fn non_success_status_maps_to_api_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/templates/9/content")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let err = build_client(server.url()).fetch_content("9").await.unwrap_err();
        match err {
            ImportError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn content_that_is_not_json_is_malformed() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/templates/9/content")
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let err = build_client(server.url()).fetch_content("9").await.unwrap_err();
        assert!(matches!(err, ImportError::MalformedBundle(_)));
    }

    #[tokio::test]
    async fn fetch_text_returns_body() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/output/9/site.css")
            .with_status(200)
            .with_body("p{}")
            .create_async()
            .await;

        let client = build_client(server.url());
        let body = client
            .fetch_text(&format!("{}/output/9/site.css", server.url()))
            .await
            .unwrap();
        assert_eq!(body, "p{}");
    }
}
