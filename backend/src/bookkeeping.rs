//! Cross-collection consistency steps.
//!
//! A task id sits in a user's `pendingTasks` exactly when the task is
//! assigned to that user and not completed. These helpers restore that
//! after each write. They run one after another with no transaction, so a
//! failure partway leaves the collections out of step until the next write
//! touching the same task.

use serde_json::{json, Value};
use shared::{Task, UNASSIGNED};

use crate::collection::Collection;
use crate::error::StoreError;
use crate::query::{Document, Filter};

const PENDING_TASKS: &str = "pendingTasks";
const ASSIGNED_USER: &str = "assignedUser";
const ASSIGNED_USER_NAME: &str = "assignedUserName";

/// Adds the task to its assignee's pending list when it is open.
pub async fn add_pending(users: &Collection, task: &Task) -> Result<(), StoreError> {
    if !task.is_pending_for_assignee() {
        return Ok(());
    }
    let added = users
        .add_to_set(&task.assigned_user, PENDING_TASKS, Value::String(task.id.clone()))
        .await?;
    if added {
        tracing::debug!(task = %task.id, user = %task.assigned_user, "added pending task");
    } else {
        tracing::debug!(task = %task.id, user = %task.assigned_user, "assigned user not found");
    }
    Ok(())
}

/// Removes the task id from every user's pending list.
pub async fn remove_pending(users: &Collection, task_id: &str) -> Result<usize, StoreError> {
    let modified = users
        .pull_all(PENDING_TASKS, &Value::String(task_id.to_string()))
        .await?;
    tracing::debug!(task = %task_id, users = modified, "removed pending task");
    Ok(modified)
}

/// Recomputes pending-list membership for a task after it changed.
pub async fn resync_pending(users: &Collection, task: &Task) -> Result<(), StoreError> {
    remove_pending(users, &task.id).await?;
    add_pending(users, task).await
}

/// Clears the assignment on every task that pointed at a deleted user.
pub async fn unassign_tasks(tasks: &Collection, user_id: &str) -> Result<usize, StoreError> {
    let filter = Filter::field_eq(ASSIGNED_USER, Value::String(user_id.to_string()));
    let mut changes = Document::new();
    changes.insert(ASSIGNED_USER.to_string(), json!(""));
    changes.insert(ASSIGNED_USER_NAME.to_string(), json!(UNASSIGNED));

    let modified = tasks.update_many(&filter, &changes).await?;
    tracing::debug!(user = %user_id, tasks = modified, "unassigned tasks of deleted user");
    Ok(modified)
}
