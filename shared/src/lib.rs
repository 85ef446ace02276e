//! Wire types shared by the taskboard server and its clients.

mod task;
mod timestamp;
mod user;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use task::{DeadlineInput, Task, TaskInput, UNASSIGNED};
pub use timestamp::{format_timestamp, parse_timestamp};
pub use user::{User, UserInput};

/// Envelope wrapping every JSON response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// Rejections raised while turning a request body into a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Task must have a name and deadline.")]
    TaskFieldsMissing,

    #[error("Invalid deadline.")]
    InvalidDeadline(String),

    #[error("Name and email are required.")]
    UserFieldsMissing,
}

/// Generates a fresh document id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
