// content_store/src/cached.rs

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use models::EhrResult;

use crate::store::ContentStore;

/// Read-through cache over any content store. Content ids are immutable,
/// so cached blobs never go stale.
#[derive(Debug, Clone)]
pub struct CachedContentStore {
    inner: Arc<dyn ContentStore>,
    cache: MokaCache<String, Vec<u8>>,
}

impl CachedContentStore {
    pub fn new(inner: Arc<dyn ContentStore>, capacity: u64) -> Self {
        CachedContentStore {
            inner,
            cache: MokaCache::new(capacity),
        }
    }
}

#[async_trait]
impl ContentStore for CachedContentStore {
    async fn put(&self, bytes: Vec<u8>) -> EhrResult<String> {
        let cid = self.inner.put(bytes.clone()).await?;
        self.cache.insert(cid.clone(), bytes).await;
        Ok(cid)
    }

    async fn get(&self, cid: &str) -> EhrResult<Vec<u8>> {
        if let Some(bytes) = self.cache.get(cid).await {
            return Ok(bytes);
        }
        let bytes = self.inner.get(cid).await?;
        self.cache.insert(cid.to_string(), bytes.clone()).await;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use models::EhrResult;

    use super::CachedContentStore;
    use crate::store::{ContentStore, InMemoryContentStore};

    #[derive(Debug)]
    struct CountingStore {
        inner: InMemoryContentStore,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl ContentStore for CountingStore {
        async fn put(&self, bytes: Vec<u8>) -> EhrResult<String> {
            self.inner.put(bytes).await
        }

        async fn get(&self, cid: &str) -> EhrResult<Vec<u8>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.get(cid).await
        }
    }

    #[tokio::test]
    async fn repeated_reads_hit_the_cache() {
        let counting = Arc::new(CountingStore {
            inner: InMemoryContentStore::new(),
            fetches: AtomicUsize::new(0),
        });
        let cached = CachedContentStore::new(counting.clone(), 64);

        let cid = cached.put(b"blob".to_vec()).await.unwrap();
        for _ in 0..3 {
            assert_eq!(cached.get(&cid).await.unwrap(), b"blob");
        }
        assert_eq!(counting.fetches.load(Ordering::SeqCst), 0);
    }
}
