use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::json;

use super::respond;
use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Response {
    let version = env!("CARGO_PKG_VERSION");
    match state.store.ping().await {
        Ok(()) => respond(
            StatusCode::OK,
            "OK",
            json!({ "status": "healthy", "version": version }),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "store ping failed");
            respond(
                StatusCode::SERVICE_UNAVAILABLE,
                "Store unavailable",
                json!({ "status": "unavailable", "version": version }),
            )
        }
    }
}
