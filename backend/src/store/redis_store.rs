use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use serde_json::Value;

use super::DocumentStore;
use crate::error::StoreError;
use crate::query::Document;

/// Redis-backed document store.
///
/// Layout, with `P` the configured key prefix and `C` the collection:
/// * `P C:{id}` - the document as a JSON string
/// * `P C:ids` - sorted set of ids scored by insertion sequence
/// * `P C:seq` - insertion counter
/// * `P C:unique:{field}` - hash of unique value -> owning id
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
    key_prefix: String,
}

impl RedisStore {
    pub async fn connect(url: &str, key_prefix: impl Into<String>) -> Result<Self, StoreError> {
        let client = Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self {
            conn,
            key_prefix: key_prefix.into(),
        })
    }

    fn doc_key(&self, collection: &str, id: &str) -> String {
        format_key(&self.key_prefix, collection, id)
    }

    fn ids_key(&self, collection: &str) -> String {
        format_key(&self.key_prefix, collection, "ids")
    }

    fn seq_key(&self, collection: &str) -> String {
        format_key(&self.key_prefix, collection, "seq")
    }

    fn unique_key(&self, collection: &str, field: &str) -> String {
        format_key(&self.key_prefix, collection, &format!("unique:{field}"))
    }
}

fn format_key(prefix: &str, collection: &str, suffix: &str) -> String {
    format!("{prefix}{collection}:{suffix}")
}

fn decode(collection: &str, id: &str, raw: &str) -> Result<Document, StoreError> {
    match serde_json::from_str(raw)? {
        Value::Object(doc) => Ok(doc),
        _ => Err(StoreError::NotAnObject {
            collection: collection.to_string(),
            id: id.to_string(),
        }),
    }
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn insert(&self, collection: &str, id: &str, doc: &Document) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let doc_json = serde_json::to_string(doc)?;

        let written: Option<String> = redis::cmd("SET")
            .arg(self.doc_key(collection, id))
            .arg(doc_json)
            .arg("NX")
            .query_async(&mut conn)
            .await?;
        if written.is_none() {
            return Err(StoreError::DuplicateId {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }

        let seq: i64 = conn.incr(self.seq_key(collection), 1).await?;
        conn.zadd::<_, _, _, ()>(self.ids_key(collection), id, seq)
            .await?;
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(self.doc_key(collection, id)).await?;
        raw.map(|raw| decode(collection, id, &raw)).transpose()
    }

    async fn replace(
        &self,
        collection: &str,
        id: &str,
        doc: &Document,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let doc_json = serde_json::to_string(doc)?;

        let written: Option<String> = redis::cmd("SET")
            .arg(self.doc_key(collection, id))
            .arg(doc_json)
            .arg("XX")
            .query_async(&mut conn)
            .await?;
        Ok(written.is_some())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let mut conn = self.conn.clone();
        let key = self.doc_key(collection, id);

        let (raw, _, _): (Option<String>, i64, i64) = redis::pipe()
            .atomic()
            .get(&key)
            .del(&key)
            .zrem(self.ids_key(collection), id)
            .query_async(&mut conn)
            .await?;
        raw.map(|raw| decode(collection, id, &raw)).transpose()
    }

    async fn all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn.zrange(self.ids_key(collection), 0, -1).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| self.doc_key(collection, id)).collect();
        let raws: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await?;

        // An id without a document is a delete caught mid-pipeline; skip it.
        ids.iter()
            .zip(raws)
            .filter_map(|(id, raw)| raw.map(|raw| decode(collection, id, &raw)))
            .collect()
    }

    async fn reserve(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        id: &str,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let key = self.unique_key(collection, field);

        let claimed: bool = conn.hset_nx(&key, value, id).await?;
        if claimed {
            return Ok(true);
        }
        let owner: Option<String> = conn.hget(&key, value).await?;
        Ok(owner.as_deref() == Some(id))
    }

    async fn release(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        id: &str,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let key = self.unique_key(collection, field);

        let owner: Option<String> = conn.hget(&key, value).await?;
        if owner.as_deref() == Some(id) {
            conn.hdel::<_, _, ()>(&key, value).await?;
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RedisStore")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}
