//! Pledge IPFS adapter
//!
//! Uploads payloads to a content-addressed store and resolves `ipfs://`
//! references back to bytes through an HTTP gateway.
//!
//! - [`HttpContentStore`] talks to a pinning service and a public gateway
//! - [`MemoryContentStore`] keeps everything in process (tests, offline mode)

mod gateway;
mod http;
mod memory;

pub use gateway::ipfs_uri_to_http_uri;
pub use http::{HttpContentStore, HttpStoreConfig};
pub use memory::MemoryContentStore;

use std::future::Future;

use pledge_types::{ContentReference, Payload, TypesError};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Largest file accepted for upload (exclusive)
pub const MAX_FILE_BYTES: usize = 2 * 1024 * 1024;

/// Content-addressed store abstraction
pub trait ContentStore: Send + Sync {
    /// Upload a payload and return its reference
    fn store(
        &self,
        payload: &Payload,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<ContentReference>> + Send;

    /// Fetch the bytes behind a reference
    fn resolve(
        &self,
        reference: &ContentReference,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("File too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("Resolution failed: {0}")]
    Resolution(String),

    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("Invalid content reference: {0}")]
    InvalidReference(#[from] TypesError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cancelled")]
    Cancelled,
}

impl StoreError {
    /// Errors that mean "not available yet" rather than "broken"
    pub fn is_resolution(&self) -> bool {
        matches!(self, StoreError::Resolution(_) | StoreError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Reject files at or above [`MAX_FILE_BYTES`] before they are uploaded
pub fn validate_file_size(size: usize) -> Result<()> {
    if size >= MAX_FILE_BYTES {
        return Err(StoreError::TooLarge { size, limit: MAX_FILE_BYTES });
    }
    Ok(())
}

/// Result of a read that may race the indexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability<T> {
    Ready(T),
    Pending,
}

impl<T> Availability<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Availability::Ready(value) => Some(value),
            Availability::Pending => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Availability::Pending)
    }
}

/// Resolve a reference. Content that is not available yet comes back as
/// [`Availability::Pending`]; every other failure is an error.
pub async fn resolve_or_pending<S: ContentStore>(
    store: &S,
    reference: &ContentReference,
    cancel: &CancellationToken,
) -> Result<Availability<Vec<u8>>> {
    match store.resolve(reference, cancel).await {
        Ok(bytes) => Ok(Availability::Ready(bytes)),
        Err(e) if e.is_resolution() => {
            tracing::debug!("{} not available yet: {}", reference, e);
            Ok(Availability::Pending)
        }
        Err(e) => Err(e),
    }
}

/// Resolve a reference and decode it as JSON
pub async fn resolve_json<S: ContentStore, T: DeserializeOwned>(
    store: &S,
    reference: &ContentReference,
    cancel: &CancellationToken,
) -> Result<T> {
    let bytes = store.resolve(reference, cancel).await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| StoreError::Resolution(format!("{} is not valid JSON: {}", reference, e)))
}
