//! Report upload to the CSV endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::error::{DialerError, Result};

/// Destination for finished CSV reports.
///
/// Writes are keyed by filename, so re-uploading the same name overwrites.
#[async_trait]
pub trait ReportUploader: Send + Sync {
    async fn upload(&self, filename: &str, csv: &str) -> Result<()>;
}

/// `PUT {base}/{filename}` with a `text/csv` body
pub struct HttpUploader {
    client: Client,
    base_url: Url,
}

impl HttpUploader {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| DialerError::Validation(format!("invalid reports url {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(DialerError::Validation(format!("reports url cannot be a base: {}", base_url)));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DialerError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, base_url })
    }

    /// Target URL with the filename percent-encoded as one path segment
    pub fn target_url(&self, filename: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(filename);
        }
        url
    }
}

#[async_trait]
impl ReportUploader for HttpUploader {
    async fn upload(&self, filename: &str, csv: &str) -> Result<()> {
        let target = self.target_url(filename);
        log::debug!("Uploading report to {}", target);

        let response = self
            .client
            .put(target)
            .header(reqwest::header::CONTENT_TYPE, "text/csv")
            .body(csv.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DialerError::Network(format!("Upload failed with status {}", status)));
        }
        log::info!("Uploaded report {}", filename);
        Ok(())
    }
}
