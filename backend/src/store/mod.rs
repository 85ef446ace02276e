//! Document storage backends.
//!
//! A store holds named collections of JSON documents keyed by id, plus
//! per-field unique indexes. Query evaluation happens above this layer in
//! [`Collection`](crate::collection::Collection).

mod memory;
mod redis_store;

use async_trait::async_trait;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

use crate::error::StoreError;
use crate::query::Document;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document. Fails with `DuplicateId` if the id is taken.
    async fn insert(&self, collection: &str, id: &str, doc: &Document) -> Result<(), StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Overwrites an existing document. Returns false when it does not exist.
    async fn replace(&self, collection: &str, id: &str, doc: &Document)
        -> Result<bool, StoreError>;

    /// Removes a document, returning what was stored.
    async fn delete(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Every document in the collection, in insertion order.
    async fn all(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Claims `value` of the unique `field` for document `id`.
    ///
    /// Returns true if the value is now (or already was) owned by `id`,
    /// false if another document holds it.
    async fn reserve(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        id: &str,
    ) -> Result<bool, StoreError>;

    /// Drops the claim on `value` if `id` still holds it.
    async fn release(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        id: &str,
    ) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
