//! Taskboard server: a REST API over task and user documents.
//!
//! Tasks and users live in two collections of a [`DocumentStore`]. List
//! endpoints take Mongo-style `where`/`sort`/`select` JSON plus paging, and
//! writes keep each user's `pendingTasks` in step with task assignments.

pub mod bookkeeping;
pub mod collection;
pub mod config;
pub mod error;
pub mod query;
pub mod routes;
pub mod state;
pub mod store;

pub use config::Config;
pub use routes::create_router;
pub use state::AppState;
pub use store::{DocumentStore, MemoryStore, RedisStore};
