#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use backend::config::QueryConfig;
use backend::error::StoreError;
use backend::query::Document;
use backend::{create_router, AppState, DocumentStore, MemoryStore};
use tower::ServiceExt;

pub struct TestApp {
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }

    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn id(&self) -> String {
        self.data()["_id"]
            .as_str()
            .expect("response data should carry an _id")
            .to_string()
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_limits(QueryConfig::default())
    }

    pub fn with_limits(limits: QueryConfig) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), limits)
    }

    pub fn with_store(store: Arc<dyn DocumentStore>, limits: QueryConfig) -> Self {
        let state = AppState::new(store, limits);
        Self {
            router: create_router(state),
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("valid request"))
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("readable body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };
        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    pub async fn create_user(&self, name: &str, email: &str) -> String {
        let response = self
            .post("/api/users", json!({ "name": name, "email": email }))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.id()
    }

    pub async fn create_task(&self, body: Value) -> String {
        let response = self.post("/api/tasks", body).await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.id()
    }

    pub async fn pending_tasks(&self, user_id: &str) -> Vec<String> {
        let response = self.get(&format!("/api/users/{user_id}")).await;
        assert_eq!(response.status, StatusCode::OK);
        serde_json::from_value(response.data()["pendingTasks"].clone()).unwrap()
    }
}

/// Store operations a [`FailingStore`] can be told to break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Insert,
    Get,
    Replace,
    Delete,
    All,
    Reserve,
    Release,
    Ping,
}

/// An in-memory store whose chosen operations fail like a dropped connection.
pub struct FailingStore {
    inner: MemoryStore,
    failing: Vec<Op>,
}

impl FailingStore {
    pub fn new(failing: &[Op]) -> Self {
        Self {
            inner: MemoryStore::new(),
            failing: failing.to_vec(),
        }
    }

    fn check(&self, op: Op) -> Result<(), StoreError> {
        if self.failing.contains(&op) {
            let err = redis::RedisError::from((redis::ErrorKind::IoError, "connection refused"));
            return Err(StoreError::from(err));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn insert(&self, collection: &str, id: &str, doc: &Document) -> Result<(), StoreError> {
        self.check(Op::Insert)?;
        self.inner.insert(collection, id, doc).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.check(Op::Get)?;
        self.inner.get(collection, id).await
    }

    async fn replace(
        &self,
        collection: &str,
        id: &str,
        doc: &Document,
    ) -> Result<bool, StoreError> {
        self.check(Op::Replace)?;
        self.inner.replace(collection, id, doc).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.check(Op::Delete)?;
        self.inner.delete(collection, id).await
    }

    async fn all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        self.check(Op::All)?;
        self.inner.all(collection).await
    }

    async fn reserve(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        id: &str,
    ) -> Result<bool, StoreError> {
        self.check(Op::Reserve)?;
        self.inner.reserve(collection, field, value, id).await
    }

    async fn release(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        id: &str,
    ) -> Result<(), StoreError> {
        self.check(Op::Release)?;
        self.inner.release(collection, field, value, id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check(Op::Ping)?;
        self.inner.ping().await
    }
}

/// Builds a query string from `(key, value)` pairs, percent-encoding values.
pub fn query(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}
