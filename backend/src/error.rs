//! Error types for the storage layer and the HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use shared::{ApiResponse, InputError};
use thiserror::Error;

use crate::query::QueryError;

/// Errors from a [`DocumentStore`](crate::store::DocumentStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document '{id}' already exists in '{collection}'")]
    DuplicateId { collection: String, id: String },

    #[error("Document '{id}' in '{collection}' is not a JSON object")]
    NotAnObject { collection: String, id: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Errors returned by route handlers, rendered as the `{message, data}` envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Invalid query parameter.")]
    Query(#[from] QueryError),

    #[error("Invalid request body.")]
    Body(String),

    #[error("Email already exists.")]
    DuplicateEmail,

    #[error("{0}")]
    NotFound(&'static str),

    /// A store failure, carrying the per-route message clients see.
    #[error("{message}")]
    Store {
        message: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    pub fn store(message: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Store { message, source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Input(_) | Self::Query(_) | Self::Body(_) | Self::DuplicateEmail => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn data(&self) -> Value {
        match self {
            Self::Query(err) => json!({ "error": err.to_string() }),
            Self::Body(detail) => json!({ "error": detail }),
            Self::Store { source, .. } => json!({ "error": source.to_string() }),
            _ => json!({}),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let Self::Store { message, source } = &self {
            tracing::error!(error = %source, "{message}");
        }
        let body = ApiResponse::new(self.to_string(), self.data());
        (status, Json(body)).into_response()
    }
}
