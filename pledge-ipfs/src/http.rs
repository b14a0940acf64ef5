//! HTTP pinning-service client
//!
//! Uploads go to `{api_endpoint}/upload` with a bearer token; reads go through
//! a public gateway.

use std::time::Duration;

use pledge_types::{ContentReference, Payload};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::gateway::gateway_url;
use crate::{ContentStore, Result, StoreError};

/// Configuration for the pinning service and gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpStoreConfig {
    pub api_endpoint: String,
    pub gateway: String,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for HttpStoreConfig {
    fn default() -> Self {
        Self {
            api_endpoint: "https://api.nft.storage".to_string(),
            gateway: "nftstorage.link".to_string(),
            api_token: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    ok: bool,
    value: Option<UploadValue>,
    error: Option<UploadFailure>,
}

#[derive(Debug, Deserialize)]
struct UploadValue {
    cid: String,
}

#[derive(Debug, Deserialize)]
struct UploadFailure {
    message: String,
}

pub struct HttpContentStore {
    config: HttpStoreConfig,
    http_client: reqwest::Client,
}

impl HttpContentStore {
    pub fn new(config: HttpStoreConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, http_client })
    }

    pub fn gateway(&self) -> &str {
        &self.config.gateway
    }

    pub fn upload_url(&self) -> String {
        format!("{}/upload", self.config.api_endpoint.trim_end_matches('/'))
    }

    async fn upload(&self, payload: &Payload) -> Result<ContentReference> {
        let api_token = self.config.api_token.as_ref().ok_or_else(|| {
            StoreError::Config("IPFS API token not configured".to_string())
        })?;

        let body = payload
            .to_bytes()
            .map_err(|e| StoreError::Upload(e.to_string()))?;

        tracing::info!("Uploading {} bytes ({:?}) to IPFS", body.len(), payload.kind());

        let resp = self
            .http_client
            .post(self.upload_url())
            .bearer_auth(api_token)
            .header("Content-Type", payload.content_type())
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::Upload(format!("Request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Upload(format!("Upload rejected ({}): {}", status, body)));
        }

        let result: UploadResponse = resp
            .json()
            .await
            .map_err(|e| StoreError::Upload(format!("Failed to parse response: {}", e)))?;

        parse_upload_response(result)
    }

    async fn fetch(&self, reference: &ContentReference) -> Result<Vec<u8>> {
        let url = gateway_url(reference, &self.config.gateway);
        tracing::debug!("Fetching {}", url);

        let resp = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| StoreError::Resolution(format!("Request failed: {}", e)))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(reference.to_string()));
        }
        if !resp.status().is_success() {
            return Err(StoreError::Resolution(format!("Gateway returned {} for {}", resp.status(), url)));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| StoreError::Resolution(format!("Failed to read body: {}", e)))?;

        Ok(bytes.to_vec())
    }
}

fn parse_upload_response(result: UploadResponse) -> Result<ContentReference> {
    if !result.ok {
        let message = result
            .error
            .map(|e| e.message)
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(StoreError::Upload(message));
    }

    let value = result
        .value
        .ok_or_else(|| StoreError::Upload("Response missing CID".to_string()))?;

    let reference = ContentReference::from_cid(&value.cid)?;
    tracing::info!("Uploaded! {}", reference);
    Ok(reference)
}

impl ContentStore for HttpContentStore {
    async fn store(&self, payload: &Payload, cancel: &CancellationToken) -> Result<ContentReference> {
        cancel
            .run_until_cancelled(self.upload(payload))
            .await
            .ok_or(StoreError::Cancelled)?
    }

    async fn resolve(&self, reference: &ContentReference, cancel: &CancellationToken) -> Result<Vec<u8>> {
        cancel
            .run_until_cancelled(self.fetch(reference))
            .await
            .ok_or(StoreError::Cancelled)?
    }
}
