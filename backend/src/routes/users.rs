use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use shared::{new_id, User, UserInput};

use super::{json_body, respond};
use crate::bookkeeping;
use crate::error::ApiError;
use crate::query::{projection_from_params, ListQuery};
use crate::state::AppState;

const NOT_FOUND: &str = "User not found";
const SERVER_ERROR: &str = "Server error";
const EMAIL: &str = "email";

pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let query = ListQuery::from_params(&params, state.limits.user_limit)?;

    if query.count {
        let count = state
            .users
            .count(&query.filter)
            .await
            .map_err(ApiError::store(SERVER_ERROR))?;
        return Ok(respond(StatusCode::OK, "OK", count));
    }

    let users = state
        .users
        .find(&query)
        .await
        .map_err(ApiError::store(SERVER_ERROR))?;
    Ok(respond(StatusCode::OK, "OK", users))
}

pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<UserInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let user = json_body(payload)?.into_user(new_id(), Utc::now())?;

    let claimed = state
        .users
        .reserve_unique(EMAIL, &user.email, &user.id)
        .await
        .map_err(ApiError::store(SERVER_ERROR))?;
    if !claimed {
        return Err(ApiError::DuplicateEmail);
    }

    if let Err(err) = state.users.insert(&user.id, &user).await {
        // The user was never written, so give the email back.
        release_email(&state, &user.email, &user.id).await;
        return Err(ApiError::store(SERVER_ERROR)(err));
    }

    tracing::info!(user = %user.id, "user created");
    Ok(respond(StatusCode::CREATED, "User created", user))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let projection = projection_from_params(&params)?;
    let user = state
        .users
        .find_by_id(&id, &projection)
        .await
        .map_err(ApiError::store(SERVER_ERROR))?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;

    Ok(respond(StatusCode::OK, "OK", user))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UserInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let probe = json_body(payload)?.into_user(id.clone(), Utc::now())?;

    let existing: User = state
        .users
        .get(&id)
        .await
        .map_err(ApiError::store(SERVER_ERROR))?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;
    let user = User {
        date_created: existing.date_created,
        ..probe
    };

    let email_changed = user.email != existing.email;
    if email_changed {
        let claimed = state
            .users
            .reserve_unique(EMAIL, &user.email, &user.id)
            .await
            .map_err(ApiError::store(SERVER_ERROR))?;
        if !claimed {
            return Err(ApiError::DuplicateEmail);
        }
    }

    let replaced = state.users.replace(&id, &user).await;
    if !matches!(replaced, Ok(true)) {
        // The stored user still has the old email.
        if email_changed {
            release_email(&state, &user.email, &id).await;
        }
        return Err(match replaced {
            Err(err) => ApiError::store(SERVER_ERROR)(err),
            _ => ApiError::NotFound(NOT_FOUND),
        });
    }

    if email_changed {
        state
            .users
            .release_unique(EMAIL, &existing.email, &id)
            .await
            .map_err(ApiError::store(SERVER_ERROR))?;
    }

    tracing::info!(user = %user.id, "user updated");
    Ok(respond(StatusCode::OK, "User updated", user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let deleted: User = state
        .users
        .delete(&id)
        .await
        .map_err(ApiError::store(SERVER_ERROR))?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;

    state
        .users
        .release_unique(EMAIL, &deleted.email, &deleted.id)
        .await
        .map_err(ApiError::store(SERVER_ERROR))?;
    bookkeeping::unassign_tasks(&state.tasks, &deleted.id)
        .await
        .map_err(ApiError::store(SERVER_ERROR))?;

    tracing::info!(user = %deleted.id, "user deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Best-effort release of an email claimed by a write that did not land.
async fn release_email(state: &AppState, email: &str, id: &str) {
    if let Err(err) = state.users.release_unique(EMAIL, email, id).await {
        tracing::warn!(error = %err, user = %id, %email, "email reservation left behind");
    }
}
