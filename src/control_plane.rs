use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::{
    error::{DeliveryError, FetchError},
    resource::SyncPayload,
    status::StatusDocument,
};

/// Destination of status documents produced by watches.
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn deliver(&self, document: &StatusDocument) -> Result<(), DeliveryError>;
}

/// HTTP client for the control plane: polls desired state and posts status.
#[derive(Clone)]
pub struct ControlPlaneClient {
    http: reqwest::Client,
    poll_url: String,
    status_url: String,
}

impl ControlPlaneClient {
    pub fn new(
        poll_url: impl Into<String>,
        status_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            poll_url: poll_url.into(),
            status_url: status_url.into(),
        })
    }

    /// Reads the desired state once. No retries; the caller skips the tick on error.
    pub async fn fetch(&self) -> Result<SyncPayload, FetchError> {
        let resp = self.http.get(&self.poll_url).send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status()));
        }
        let body = resp.bytes().await?;
        let payload: SyncPayload = serde_json::from_slice(&body)?;
        debug!(
            items = payload.items.len(),
            page = %payload.page,
            total = %payload.total,
            "fetched payload"
        );
        Ok(payload)
    }
}

#[async_trait]
impl StatusSink for ControlPlaneClient {
    async fn deliver(&self, document: &StatusDocument) -> Result<(), DeliveryError> {
        let resp = self
            .http
            .post(&self.status_url)
            .json(document)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(DeliveryError::Status(resp.status()));
        }
        Ok(())
    }
}
