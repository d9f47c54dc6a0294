// ledger/src/entity.rs

use std::marker::PhantomData;
use std::sync::Arc;

use log::warn;
use models::{EhrError, EhrResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::store::LedgerStore;

/// Typed CRUD over one entity kind's keyspace. Each entity kind gets its own
/// namespace prefix; values are single JSON documents, one per key, exactly
/// as the chaincode world state holds them.
pub struct EntityStore<T> {
    ledger: Arc<dyn LedgerStore>,
    namespace: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for EntityStore<T> {
    fn clone(&self) -> Self {
        EntityStore {
            ledger: self.ledger.clone(),
            namespace: self.namespace,
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for EntityStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore")
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl<T: Serialize + DeserializeOwned> EntityStore<T> {
    pub fn new(ledger: Arc<dyn LedgerStore>, namespace: &'static str) -> Self {
        EntityStore {
            ledger,
            namespace,
            _marker: PhantomData,
        }
    }

    fn key(&self, id: &str) -> String {
        format!("{}/{}", self.namespace, id)
    }

    pub async fn get(&self, id: &str) -> EhrResult<Option<T>> {
        match self.ledger.get(&self.key(id)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn exists(&self, id: &str) -> EhrResult<bool> {
        self.ledger.exists(&self.key(id)).await
    }

    pub async fn put(&self, id: &str, entity: &T) -> EhrResult<()> {
        let bytes = serde_json::to_vec(entity)?;
        self.ledger.put(&self.key(id), bytes).await
    }

    /// Insert-only write; rejects an id that is already present.
    pub async fn put_new(&self, id: &str, entity: &T) -> EhrResult<()> {
        if self.exists(id).await? {
            return Err(EhrError::AlreadyExists(self.key(id)));
        }
        self.put(id, entity).await
    }

    pub async fn delete(&self, id: &str) -> EhrResult<()> {
        self.ledger.delete(&self.key(id)).await
    }

    /// Every entity in the namespace, in key order. Undecodable values are
    /// skipped with a warning rather than failing the scan.
    pub async fn list(&self) -> EhrResult<Vec<T>> {
        self.list_prefix("").await
    }

    /// Entities whose id starts with `id_prefix`, in key order.
    pub async fn list_prefix(&self, id_prefix: &str) -> EhrResult<Vec<T>> {
        let scan_key = format!("{}/{}", self.namespace, id_prefix);
        let mut entities = Vec::new();
        for (key, bytes) in self.ledger.scan_prefix(&scan_key).await? {
            match serde_json::from_slice(&bytes) {
                Ok(entity) => entities.push(entity),
                Err(err) => warn!("skipping undecodable entry at {key}: {err}"),
            }
        }
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use models::EhrError;
    use serde::{Deserialize, Serialize};

    use super::EntityStore;
    use crate::store::InMemoryLedger;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        id: String,
        label: String,
    }

    fn store() -> EntityStore<Sample> {
        EntityStore::new(Arc::new(InMemoryLedger::new()), "sample")
    }

    #[tokio::test]
    async fn put_new_rejects_duplicates() {
        let store = store();
        let sample = Sample {
            id: "s1".into(),
            label: "first".into(),
        };
        store.put_new("s1", &sample).await.unwrap();
        let err = store.put_new("s1", &sample).await.unwrap_err();
        assert!(matches!(err, EhrError::AlreadyExists(_)));
        assert_eq!(store.get("s1").await.unwrap(), Some(sample));
    }

    #[tokio::test]
    async fn list_prefix_scopes_to_id_prefix() {
        let store = store();
        for id in ["p1:d1", "p1:d2", "p2:d1"] {
            let sample = Sample {
                id: id.into(),
                label: "x".into(),
            };
            store.put(id, &sample).await.unwrap();
        }
        let hits = store.list_prefix("p1:").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|s| s.id.starts_with("p1:")));
        assert_eq!(store.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn missing_entity_reads_as_none() {
        let store = store();
        assert_eq!(store.get("nope").await.unwrap(), None);
        assert!(!store.exists("nope").await.unwrap());
    }
}
