use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timestamp;
use crate::InputError;

/// Display name stored on tasks that have no assignee.
pub const UNASSIGNED: &str = "unassigned";

fn unassigned() -> String {
    UNASSIGNED.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "timestamp")]
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    /// Id of the assigned user, empty when unassigned.
    #[serde(default)]
    pub assigned_user: String,
    #[serde(default = "unassigned")]
    pub assigned_user_name: String,
    #[serde(with = "timestamp")]
    pub date_created: DateTime<Utc>,
}

impl Task {
    pub fn is_assigned(&self) -> bool {
        !self.assigned_user.is_empty()
    }

    /// Whether this task belongs in its assignee's `pendingTasks`.
    pub fn is_pending_for_assignee(&self) -> bool {
        self.is_assigned() && !self.completed
    }
}

/// A deadline as sent by clients: epoch milliseconds or a date string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeadlineInput {
    Millis(i64),
    Text(String),
}

impl DeadlineInput {
    fn is_blank(&self) -> bool {
        match self {
            Self::Millis(millis) => *millis == 0,
            Self::Text(text) => text.trim().is_empty(),
        }
    }

    fn resolve(&self) -> Result<DateTime<Utc>, InputError> {
        match self {
            Self::Millis(millis) => timestamp::from_millis(*millis)
                .ok_or_else(|| InputError::InvalidDeadline(millis.to_string())),
            Self::Text(text) => timestamp::parse_timestamp(text)
                .ok_or_else(|| InputError::InvalidDeadline(text.clone())),
        }
    }
}

/// Body accepted by task create and replace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<DeadlineInput>,
    pub completed: Option<bool>,
    pub assigned_user: Option<String>,
    pub assigned_user_name: Option<String>,
}

impl TaskInput {
    /// Builds the stored task, filling defaults for every optional field.
    pub fn into_task(self, id: String, date_created: DateTime<Utc>) -> Result<Task, InputError> {
        let name = self.name.filter(|name| !name.is_empty());
        let deadline = self.deadline.filter(|deadline| !deadline.is_blank());
        let (Some(name), Some(deadline)) = (name, deadline) else {
            return Err(InputError::TaskFieldsMissing);
        };

        Ok(Task {
            id,
            name,
            description: self.description.unwrap_or_default(),
            deadline: deadline.resolve()?,
            completed: self.completed.unwrap_or(false),
            assigned_user: self.assigned_user.unwrap_or_default(),
            assigned_user_name: self
                .assigned_user_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(unassigned),
            date_created,
        })
    }

    /// True when the client left `assignedUserName` for the server to fill.
    pub fn wants_assignee_name(&self) -> bool {
        self.assigned_user.as_deref().is_some_and(|user| !user.is_empty())
            && self
                .assigned_user_name
                .as_deref()
                .map_or(true, str::is_empty)
    }
}
