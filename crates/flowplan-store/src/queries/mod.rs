//! Operations over the in-memory [`crate::models::AppState`].
//!
//! None of these touch the disk; callers persist with
//! [`crate::store::Store::save`] once a mutation has succeeded.

pub mod events;
pub mod goals;
pub mod tasks;
