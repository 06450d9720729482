//! Persistence for FlowPlan: record types, the application state object and
//! a JSON-file store holding the `goals`, `tasks` and `events` collections.

pub mod config;
pub mod models;
pub mod queries;
pub mod store;

pub use config::StoreConfig;
pub use models::{AppState, Event, Goal, Priority, Scope, Subtask, Task};
pub use store::Store;
