use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use shared::{new_id, Task, TaskInput, User};

use super::{json_body, respond};
use crate::bookkeeping;
use crate::error::{ApiError, StoreError};
use crate::query::{projection_from_params, ListQuery};
use crate::state::AppState;

const NOT_FOUND: &str = "Task not found.";
const LIST_FAILED: &str = "can't retrive tasks.";

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let query = ListQuery::from_params(&params, state.limits.task_limit)?;

    if query.count {
        let count = state
            .tasks
            .count(&query.filter)
            .await
            .map_err(ApiError::store(LIST_FAILED))?;
        return Ok(respond(StatusCode::OK, "Count of matching tasks.", count));
    }

    let tasks = state
        .tasks
        .find(&query)
        .await
        .map_err(ApiError::store(LIST_FAILED))?;
    Ok(respond(StatusCode::OK, "Tasks successfully retrieved.", tasks))
}

pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<TaskInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let input = json_body(payload)?;
    let fill_name = input.wants_assignee_name();
    let mut task = input.into_task(new_id(), Utc::now())?;

    if fill_name {
        fill_assignee_name(&state, &mut task)
            .await
            .map_err(ApiError::store("can't create task."))?;
    }

    state
        .tasks
        .insert(&task.id, &task)
        .await
        .map_err(ApiError::store("can't create task."))?;
    bookkeeping::add_pending(&state.users, &task)
        .await
        .map_err(ApiError::store("can't create task."))?;

    tracing::info!(task = %task.id, "task created");
    Ok(respond(StatusCode::CREATED, "Task created successfully.", task))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let projection = projection_from_params(&params)?;
    let task = state
        .tasks
        .find_by_id(&id, &projection)
        .await
        .map_err(ApiError::store("can't fetch task."))?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;

    Ok(respond(StatusCode::OK, "Task retrieved successfully.", task))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TaskInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let input = json_body(payload)?;
    let fill_name = input.wants_assignee_name();
    // Validate before the lookup so a bad body is a 400 even for unknown ids.
    let probe = input.clone().into_task(id.clone(), Utc::now())?;

    let existing: Task = state
        .tasks
        .get(&id)
        .await
        .map_err(ApiError::store("can't update task."))?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;
    let mut task = Task {
        date_created: existing.date_created,
        ..probe
    };

    if fill_name {
        fill_assignee_name(&state, &mut task)
            .await
            .map_err(ApiError::store("can't update task."))?;
    }

    let replaced = state
        .tasks
        .replace(&id, &task)
        .await
        .map_err(ApiError::store("can't update task."))?;
    if !replaced {
        return Err(ApiError::NotFound(NOT_FOUND));
    }
    bookkeeping::resync_pending(&state.users, &task)
        .await
        .map_err(ApiError::store("can't update task."))?;

    tracing::info!(task = %task.id, "task updated");
    Ok(respond(StatusCode::OK, "Task updated successfully.", task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let deleted: Task = state
        .tasks
        .delete(&id)
        .await
        .map_err(ApiError::store("can't delete task."))?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;

    bookkeeping::remove_pending(&state.users, &deleted.id)
        .await
        .map_err(ApiError::store("can't delete task."))?;

    tracing::info!(task = %deleted.id, "task deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Copies the assignee's name onto the task when the user exists.
async fn fill_assignee_name(
    state: &AppState,
    task: &mut Task,
) -> Result<(), StoreError> {
    if let Some(user) = state.users.get::<User>(&task.assigned_user).await? {
        task.assigned_user_name = user.name;
    }
    Ok(())
}
