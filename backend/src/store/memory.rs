use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::DocumentStore;
use crate::error::StoreError;
use crate::query::Document;

#[derive(Debug, Default)]
struct CollectionData {
    order: Vec<String>,
    docs: HashMap<String, Document>,
}

#[derive(Debug, Default)]
struct Inner {
    collections: HashMap<String, CollectionData>,
    /// (collection, field, value) -> owning document id
    unique: HashMap<(String, String, String), String>,
}

/// In-process store used by tests and `--memory` runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn unique_key(collection: &str, field: &str, value: &str) -> (String, String, String) {
    (collection.to_string(), field.to_string(), value.to_string())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, id: &str, doc: &Document) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let data = inner.collections.entry(collection.to_string()).or_default();
        if data.docs.contains_key(id) {
            return Err(StoreError::DuplicateId {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        data.order.push(id.to_string());
        data.docs.insert(id.to_string(), doc.clone());
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .get(collection)
            .and_then(|data| data.docs.get(id))
            .cloned())
    }

    async fn replace(
        &self,
        collection: &str,
        id: &str,
        doc: &Document,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let slot = inner
            .collections
            .get_mut(collection)
            .and_then(|data| data.docs.get_mut(id));
        Ok(match slot {
            Some(existing) => {
                *existing = doc.clone();
                true
            }
            None => false,
        })
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(data) = inner.collections.get_mut(collection) else {
            return Ok(None);
        };
        let removed = data.docs.remove(id);
        if removed.is_some() {
            data.order.retain(|existing| existing != id);
        }
        Ok(removed)
    }

    async fn all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .get(collection)
            .map(|data| {
                data.order
                    .iter()
                    .filter_map(|id| data.docs.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn reserve(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        id: &str,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let owner = inner
            .unique
            .entry(unique_key(collection, field, value))
            .or_insert_with(|| id.to_string());
        Ok(owner.as_str() == id)
    }

    async fn release(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        id: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let key = unique_key(collection, field, value);
        if inner.unique.get(&key).is_some_and(|owner| owner == id) {
            inner.unique.remove(&key);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
