//! HTTP transport for sending batches.

use crate::config::Config;
use crate::hit::Batch;
use crate::Error;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::{debug, warn};
use url::Url;

/// HTTP transport for posting batches to the collection endpoint.
///
/// One client is shared by every dispatch. It keeps no cookies and no idle
/// connections, so each request stands alone.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(0)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Post one batch. Anything but `200 OK` is an error.
    pub async fn send(&self, batch: &Batch) -> Result<(), Error> {
        debug!(
            endpoint = %self.endpoint,
            hit_count = batch.len(),
            "sending hits"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .header(CACHE_CONTROL, "no-cache")
            .body(batch.body().to_owned())
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = %status, "collector rejected batch");
            return Err(Error::Status(status));
        }

        debug!(hit_count = batch.len(), "hits sent successfully");

        Ok(())
    }
}
