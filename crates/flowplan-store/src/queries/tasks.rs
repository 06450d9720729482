//! Checklist operations.

use anyhow::{Result, bail};

use crate::models::{AppState, Task};

/// Add a user-created task at the front of the checklist.
pub fn insert_task(state: &mut AppState, task: Task) -> Result<()> {
    if task.text.trim().is_empty() {
        bail!("task text must not be empty");
    }
    if state.tasks.iter().any(|t| t.id == task.id) {
        bail!("task {} already exists", task.id);
    }
    state.tasks.insert(0, task);
    Ok(())
}

/// Flip the done flag of a task. Returns the new value.
pub fn toggle_task(state: &mut AppState, id: &str) -> Result<bool> {
    match state.tasks.iter_mut().find(|t| t.id == id) {
        Some(task) => {
            task.done = !task.done;
            Ok(task.done)
        }
        None => bail!("task {id} not found"),
    }
}

/// Remove a task and return it.
pub fn remove_task(state: &mut AppState, id: &str) -> Result<Task> {
    match state.tasks.iter().position(|t| t.id == id) {
        Some(pos) => Ok(state.tasks.remove(pos)),
        None => bail!("task {id} not found"),
    }
}

/// List tasks in checklist order, optionally hiding completed ones.
pub fn list_tasks(state: &AppState, include_done: bool) -> Vec<&Task> {
    state
        .tasks
        .iter()
        .filter(|t| include_done || !t.done)
        .collect()
}
