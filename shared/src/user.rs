use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timestamp;
use crate::InputError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    /// Ids of incomplete tasks assigned to this user.
    #[serde(default)]
    pub pending_tasks: Vec<String>,
    #[serde(with = "timestamp")]
    pub date_created: DateTime<Utc>,
}

/// Body accepted by user create and replace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub pending_tasks: Option<Vec<String>>,
}

impl UserInput {
    pub fn into_user(self, id: String, date_created: DateTime<Utc>) -> Result<User, InputError> {
        let name = self.name.filter(|name| !name.is_empty());
        let email = self.email.filter(|email| !email.is_empty());
        let (Some(name), Some(email)) = (name, email) else {
            return Err(InputError::UserFieldsMissing);
        };

        Ok(User {
            id,
            name,
            email,
            pending_tasks: self.pending_tasks.unwrap_or_default(),
            date_created,
        })
    }
}
