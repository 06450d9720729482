//! Goal records and the cascade that removes everything derived from them.

use tracing::info;

use crate::models::{AppState, Event, Goal, Scope, Task};

/// What a goal deletion removed.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedGoal {
    pub goal: Goal,
    pub tasks_removed: usize,
    pub events_removed: usize,
}

/// Add a goal together with its derived tasks and placed events.
///
/// New records go to the front of each collection (newest first).
pub fn insert_goal(state: &mut AppState, goal: Goal, tasks: Vec<Task>, events: Vec<Event>) {
    state.tasks.splice(0..0, tasks);
    state.events.splice(0..0, events);
    state.goals.insert(0, goal);
}

/// Fetch a goal by its ID.
pub fn get_goal<'a>(state: &'a AppState, id: &str) -> Option<&'a Goal> {
    state.goals.iter().find(|g| g.id == id)
}

/// List goals, newest first, optionally restricted to one scope.
pub fn list_goals(state: &AppState, scope: Option<Scope>) -> Vec<&Goal> {
    state
        .goals
        .iter()
        .filter(|g| scope.is_none_or(|s| g.scope == s))
        .collect()
}

/// Delete a goal, the tasks derived from it and the events tagged with it.
///
/// Returns `None` when no goal has that ID; nothing is removed in that case.
pub fn delete_goal(state: &mut AppState, id: &str) -> Option<DeletedGoal> {
    let pos = state.goals.iter().position(|g| g.id == id)?;
    let goal = state.goals.remove(pos);

    let tasks_before = state.tasks.len();
    state.tasks.retain(|t| !t.is_derived_from(&goal.id));
    let tasks_removed = tasks_before - state.tasks.len();

    let events_before = state.events.len();
    state
        .events
        .retain(|e| e.goal_id.as_deref() != Some(goal.id.as_str()));
    let events_removed = events_before - state.events.len();

    info!(
        goal = %goal.id,
        tasks_removed,
        events_removed,
        "goal deleted"
    );

    Some(DeletedGoal {
        goal,
        tasks_removed,
        events_removed,
    })
}
