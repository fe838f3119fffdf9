use std::future::Future;

use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::FormError;
use crate::model::VideoMetadata;

/// Source of video metadata for a validated URL.
pub trait MetadataService {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<VideoMetadata, FormError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpMetadataService {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpMetadataService {
    pub fn new(config: &ClientConfig) -> Result<Self, FormError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|error| FormError::config(format!("Could not build HTTP client: {error}")))?;

        Ok(Self::with_client(client, config.metadata_endpoint.clone()))
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }
}

impl MetadataService for HttpMetadataService {
    async fn fetch(&self, url: &str) -> Result<VideoMetadata, FormError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .form(&[("url", url)])
            .send()
            .await
            .map_err(|error| {
                warn!("Metadata request to {} failed: {error}", self.endpoint);
                FormError::service_generic()
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|error| {
            warn!("Could not read metadata response body: {error}");
            FormError::service_generic()
        })?;

        let value: serde_json::Value = serde_json::from_slice(&body).map_err(|error| {
            warn!("Metadata response ({status}) is not JSON: {error}");
            FormError::service_generic()
        })?;

        if !status.is_success() {
            debug!("Metadata service answered {status}: {value}");
            return Err(service_error(&value));
        }

        serde_json::from_value(value.clone()).map_err(|error| {
            warn!("Metadata response has an unexpected shape: {error}");
            service_error(&value)
        })
    }
}

/// The server's `error` text when it sent one, the generic message otherwise.
fn service_error(body: &serde_json::Value) -> FormError {
    body.get("error")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map_or_else(FormError::service_generic, FormError::service)
}
