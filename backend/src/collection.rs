//! ORM-style operations over one collection of a [`DocumentStore`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::StoreError;
use crate::query::{Document, Filter, ListQuery, Projection, Schema};
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct Collection {
    store: Arc<dyn DocumentStore>,
    name: &'static str,
    schema: Schema,
}

impl Collection {
    pub fn new(store: Arc<dyn DocumentStore>, name: &'static str) -> Self {
        Self {
            store,
            name,
            schema: &[],
        }
    }

    /// Declares typed fields whose `where` operands are cast before matching.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    pub async fn find(&self, query: &ListQuery) -> Result<Vec<Document>, StoreError> {
        let mut query = query.clone();
        query.filter.cast(self.schema);
        let documents = self.store.all(self.name).await?;
        Ok(query.apply(documents))
    }

    pub async fn count(&self, filter: &Filter) -> Result<usize, StoreError> {
        let mut filter = filter.clone();
        filter.cast(self.schema);
        let documents = self.store.all(self.name).await?;
        Ok(documents.iter().filter(|doc| filter.matches(doc)).count())
    }

    pub async fn find_by_id(
        &self,
        id: &str,
        projection: &Projection,
    ) -> Result<Option<Document>, StoreError> {
        let found = self.store.get(self.name, id).await?;
        Ok(found.map(|doc| projection.apply(doc)))
    }

    pub async fn get<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>, StoreError> {
        self.store
            .get(self.name, id)
            .await?
            .map(|doc| serde_json::from_value(Value::Object(doc)).map_err(StoreError::from))
            .transpose()
    }

    pub async fn insert<T: Serialize>(&self, id: &str, value: &T) -> Result<(), StoreError> {
        let doc = self.to_document(id, value)?;
        self.store.insert(self.name, id, &doc).await
    }

    /// Returns false when no document with `id` exists.
    pub async fn replace<T: Serialize>(&self, id: &str, value: &T) -> Result<bool, StoreError> {
        let doc = self.to_document(id, value)?;
        self.store.replace(self.name, id, &doc).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>, StoreError> {
        self.store
            .delete(self.name, id)
            .await?
            .map(|doc| serde_json::from_value(Value::Object(doc)).map_err(StoreError::from))
            .transpose()
    }

    /// Appends `value` to the array `field` of document `id` unless already present.
    /// Returns false when the document does not exist.
    pub async fn add_to_set(&self, id: &str, field: &str, value: Value) -> Result<bool, StoreError> {
        let Some(mut doc) = self.store.get(self.name, id).await? else {
            return Ok(false);
        };

        let slot = doc
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        match slot {
            Value::Array(items) if items.contains(&value) => return Ok(true),
            Value::Array(items) => items.push(value),
            other => *other = Value::Array(vec![value]),
        }
        self.store.replace(self.name, id, &doc).await
    }

    /// Removes `value` from the array `field` of every document holding it.
    /// Returns how many documents changed.
    pub async fn pull_all(&self, field: &str, value: &Value) -> Result<usize, StoreError> {
        let filter = Filter::field_eq(field, value.clone());
        let mut modified = 0;

        for mut doc in self.store.all(self.name).await? {
            if !filter.matches(&doc) {
                continue;
            }
            let Some(id) = document_id(&doc) else {
                continue;
            };
            if let Some(Value::Array(items)) = doc.get_mut(field) {
                items.retain(|item| item != value);
            }
            if self.store.replace(self.name, &id, &doc).await? {
                modified += 1;
            }
        }
        Ok(modified)
    }

    /// Sets the fields in `changes` on every document matching `filter`.
    /// Returns how many documents changed.
    pub async fn update_many(&self, filter: &Filter, changes: &Document) -> Result<usize, StoreError> {
        let mut modified = 0;

        for mut doc in self.store.all(self.name).await? {
            if !filter.matches(&doc) {
                continue;
            }
            let Some(id) = document_id(&doc) else {
                continue;
            };
            for (field, value) in changes {
                doc.insert(field.clone(), value.clone());
            }
            if self.store.replace(self.name, &id, &doc).await? {
                modified += 1;
            }
        }
        Ok(modified)
    }

    /// Claims a unique value for `id`. False when another document owns it.
    pub async fn reserve_unique(&self, field: &str, value: &str, id: &str) -> Result<bool, StoreError> {
        self.store.reserve(self.name, field, value, id).await
    }

    pub async fn release_unique(&self, field: &str, value: &str, id: &str) -> Result<(), StoreError> {
        self.store.release(self.name, field, value, id).await
    }

    fn to_document<T: Serialize>(&self, id: &str, value: &T) -> Result<Document, StoreError> {
        match serde_json::to_value(value)? {
            Value::Object(doc) => Ok(doc),
            _ => Err(StoreError::NotAnObject {
                collection: self.name.to_string(),
                id: id.to_string(),
            }),
        }
    }
}

fn document_id(doc: &Document) -> Option<String> {
    doc.get("_id").and_then(Value::as_str).map(str::to_string)
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Collection")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}
