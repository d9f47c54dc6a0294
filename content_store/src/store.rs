// content_store/src/store.rs

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use models::hashing::sha256_hex;
use models::{EhrError, EhrResult};
use tokio::sync::Mutex as TokioMutex;

/// Content-addressed blob store holding the bulky clinical payloads.
/// Identical bytes always produce the same content id, so `put` is safe to
/// repeat. A missing id on `get` is terminal; there is nothing to retry.
#[async_trait]
pub trait ContentStore: Send + Sync + Debug {
    async fn put(&self, bytes: Vec<u8>) -> EhrResult<String>;

    async fn get(&self, cid: &str) -> EhrResult<Vec<u8>>;
}

/// In-process store addressing blobs by their SHA-256 digest.
#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    blobs: TokioMutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        InMemoryContentStore::default()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn put(&self, bytes: Vec<u8>) -> EhrResult<String> {
        let cid = sha256_hex(&bytes);
        self.blobs.lock().await.insert(cid.clone(), bytes);
        Ok(cid)
    }

    async fn get(&self, cid: &str) -> EhrResult<Vec<u8>> {
        self.blobs
            .lock()
            .await
            .get(cid)
            .cloned()
            .ok_or_else(|| EhrError::ContentNotFound(cid.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use models::EhrError;

    use super::{ContentStore, InMemoryContentStore};

    #[tokio::test]
    async fn identical_bytes_yield_identical_cid() {
        let store = InMemoryContentStore::new();
        let first = store.put(b"payload".to_vec()).await.unwrap();
        let second = store.put(b"payload".to_vec()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.get(&first).await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn different_bytes_yield_different_cid() {
        let store = InMemoryContentStore::new();
        let a = store.put(b"one".to_vec()).await.unwrap();
        let b = store.put(b"two".to_vec()).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn unknown_cid_is_content_not_found() {
        let store = InMemoryContentStore::new();
        let err = store.get("deadbeef").await.unwrap_err();
        assert!(matches!(err, EhrError::ContentNotFound(_)));
    }
}
