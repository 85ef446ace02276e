use std::sync::Arc;

use crate::collection::Collection;
use crate::config::QueryConfig;
use crate::query::{FieldKind, Schema};
use crate::store::DocumentStore;

pub const TASKS: &str = "tasks";
pub const USERS: &str = "users";

const TASK_FIELDS: Schema = &[
    ("deadline", FieldKind::Timestamp),
    ("dateCreated", FieldKind::Timestamp),
    ("completed", FieldKind::Boolean),
];
const USER_FIELDS: Schema = &[("dateCreated", FieldKind::Timestamp)];

/// Shared handler state: the store and the two collections on top of it.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub tasks: Collection,
    pub users: Collection,
    pub limits: QueryConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, limits: QueryConfig) -> Self {
        Self {
            tasks: Collection::new(Arc::clone(&store), TASKS).with_schema(TASK_FIELDS),
            users: Collection::new(Arc::clone(&store), USERS).with_schema(USER_FIELDS),
            store,
            limits,
        }
    }
}
