// ledger/src/store.rs

use std::collections::BTreeMap;
use std::fmt::Debug;

use async_trait::async_trait;
use log::debug;
use models::{EhrError, EhrResult};
use tokio::sync::Mutex as TokioMutex;

/// Key-value boundary to the permissioned ledger's world state. The
/// consensus and commit machinery behind it is an external collaborator;
/// the core only sees get/put/delete/exists plus an ordered prefix scan.
///
/// A `put` may be rejected with `EhrError::ReadConflict` when a concurrent
/// writer invalidated the read set; callers submit through
/// [`crate::retry::submit_with_retry`].
#[async_trait]
pub trait LedgerStore: Send + Sync + Debug {
    async fn get(&self, key: &str) -> EhrResult<Option<Vec<u8>>>;

    async fn put(&self, key: &str, value: Vec<u8>) -> EhrResult<()>;

    async fn delete(&self, key: &str) -> EhrResult<()>;

    async fn exists(&self, key: &str) -> EhrResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// All entries whose key starts with `prefix`, in key order.
    async fn scan_prefix(&self, prefix: &str) -> EhrResult<Vec<(String, Vec<u8>)>>;
}

/// World state held in an ordered map, for tests and single-process demos.
/// Single-writer by construction, so it never raises a read conflict.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: TokioMutex<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        InMemoryLedger::default()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.is_empty()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn get(&self, key: &str) -> EhrResult<Option<Vec<u8>>> {
        Ok(self.state.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> EhrResult<()> {
        debug!("ledger put: {key} ({} bytes)", value.len());
        self.state.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> EhrResult<()> {
        let removed = self.state.lock().await.remove(key);
        if removed.is_none() {
            return Err(EhrError::Ledger(format!("delete of missing key {key}")));
        }
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &str) -> EhrResult<Vec<(String, Vec<u8>)>> {
        let state = self.state.lock().await;
        Ok(state
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}
