//! In-process content store
//!
//! CIDs are derived from the SHA-256 of the content, so storing the same bytes
//! twice yields the same reference. They are not real multihash CIDs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use pledge_types::{ContentReference, Payload};
use sha2::{Digest, Sha256};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{ContentStore, Result, StoreError};

pub struct MemoryContentStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    store_calls: AtomicUsize,
    resolve_calls: AtomicUsize,
    failure: Mutex<Option<String>>,
    paused: watch::Sender<bool>,
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            store_calls: AtomicUsize::new(0),
            resolve_calls: AtomicUsize::new(0),
            failure: Mutex::new(None),
            paused: watch::Sender::new(false),
        }
    }

    pub fn cid_for(bytes: &[u8]) -> String {
        let digest = Sha256::digest(bytes);
        format!("bafk{}", hex::encode(digest))
    }

    /// Make every following upload fail with `message`
    pub fn fail_uploads(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.into());
    }

    /// Hold uploads until [`release_uploads`](Self::release_uploads)
    pub fn pause_uploads(&self) {
        self.paused.send_replace(true);
    }

    pub fn release_uploads(&self) {
        self.paused.send_replace(false);
    }

    pub fn store_calls(&self) -> usize {
        self.store_calls.load(Ordering::SeqCst)
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn wait_until_released(&self) {
        let mut paused = self.paused.subscribe();
        // Sender lives in self, so the channel cannot close here.
        let _ = paused.wait_for(|paused| !*paused).await;
    }
}

impl ContentStore for MemoryContentStore {
    async fn store(&self, payload: &Payload, cancel: &CancellationToken) -> Result<ContentReference> {
        self.store_calls.fetch_add(1, Ordering::SeqCst);

        cancel
            .run_until_cancelled(self.wait_until_released())
            .await
            .ok_or(StoreError::Cancelled)?;

        if let Some(message) = self.failure.lock().unwrap_or_else(|e| e.into_inner()).clone() {
            return Err(StoreError::Upload(message));
        }

        let bytes = payload
            .to_bytes()
            .map_err(|e| StoreError::Upload(e.to_string()))?;
        let cid = Self::cid_for(&bytes);

        tracing::debug!("Stored {} bytes as {}", bytes.len(), cid);
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(cid.clone(), bytes);

        Ok(ContentReference::from_cid(&cid)?)
    }

    async fn resolve(&self, reference: &ContentReference, cancel: &CancellationToken) -> Result<Vec<u8>> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);

        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        if reference.location() != reference.cid() {
            return Err(StoreError::NotFound(reference.to_string()));
        }

        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(reference.cid())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(reference.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roundtrip_file_and_json() {
        let store = MemoryContentStore::new();
        let cancel = CancellationToken::new();

        let file = Payload::File { name: Some("proof.png".to_string()), bytes: vec![1, 2, 3, 4] };
        let reference = store.store(&file, &cancel).await.unwrap();
        assert_eq!(store.resolve(&reference, &cancel).await.unwrap(), vec![1, 2, 3, 4]);

        let json = Payload::Json(serde_json::json!({ "message": "gm" }));
        let reference = store.store(&json, &cancel).await.unwrap();
        let bytes = store.resolve(&reference, &cancel).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, serde_json::json!({ "message": "gm" }));
    }

    #[tokio::test]
    async fn test_same_content_same_reference() {
        let store = MemoryContentStore::new();
        let cancel = CancellationToken::new();
        let payload = Payload::File { name: None, bytes: b"same".to_vec() };

        let a = store.store(&payload, &cancel).await.unwrap();
        let b = store.store(&payload, &cancel).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
        assert_eq!(store.store_calls(), 2);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryContentStore::new();
        store.fail_uploads("network down");

        let err = store
            .store(&Payload::Json(serde_json::json!(1)), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Upload(ref m) if m == "network down"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_paused_upload() {
        let store = MemoryContentStore::new();
        store.pause_uploads();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = store
            .store(&Payload::Json(serde_json::json!(1)), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Cancelled));
    }
}
