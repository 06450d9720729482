//! Goal assembly: plan a draft, derive its records and persist them.

use anyhow::{Context, Result};
use chrono::Utc;
use flowplan_store::queries::goals::{DeletedGoal, delete_goal, insert_goal};
use flowplan_store::{Event, Goal, Store, Task};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::service::{GoalDraft, Planner};

/// Everything a successful `create_goal` added.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedGoal {
    pub goal: Goal,
    pub tasks: Vec<Task>,
    pub events: Vec<Event>,
    /// Subtask IDs that found no slot.
    pub unscheduled: Vec<String>,
}

/// Runs load → plan → save for goals against one store.
///
/// Runs in the same process are serialized; separate processes sharing a
/// data directory are not coordinated.
pub struct GoalService {
    store: Store,
    planner: Planner,
    lock: Mutex<()>,
}

impl GoalService {
    pub fn new(store: Store, planner: Planner) -> Self {
        Self {
            store,
            planner,
            lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    /// Plan `draft` and persist the goal, its tasks and its events.
    ///
    /// Returns `Ok(None)` without touching the store when the title is blank.
    /// A [`PlanError`](super::PlanError) is returned as the error's source
    /// and nothing is saved in that case. Subtasks that found no slot are
    /// still saved, without a date.
    pub async fn create_goal(&self, draft: &GoalDraft) -> Result<Option<CreatedGoal>> {
        if draft.is_blank() {
            debug!("create_goal: blank title, nothing to do");
            return Ok(None);
        }
        let _guard = self.lock.lock().await;

        let mut state = self.store.load();
        let outcome = self.planner.plan(draft, &state.events).await?;

        let goal_id = self.planner.ids().next_id("goal");
        let tasks: Vec<Task> = outcome
            .subtasks
            .iter()
            .map(|s| Task {
                id: Task::derived_id(&goal_id, &s.id),
                text: s.text.clone(),
                done: false,
                due: s.date.unwrap_or(draft.due),
                estimate_hours: s.duration_hours,
            })
            .collect();
        let events: Vec<Event> = outcome
            .events
            .into_iter()
            .map(|e| Event {
                goal_id: Some(goal_id.clone()),
                ..e
            })
            .collect();
        let goal = Goal {
            id: goal_id,
            scope: draft.scope,
            title: draft.title.trim().to_string(),
            description: draft.description.clone(),
            due: draft.due,
            priority: draft.priority,
            subtasks: outcome.subtasks,
            planned: true,
            created_at: Utc::now(),
        };

        insert_goal(&mut state, goal.clone(), tasks.clone(), events.clone());
        self.store
            .save(&state)
            .with_context(|| format!("failed to save goal {}", goal.id))?;

        info!(
            goal = %goal.id,
            subtasks = goal.subtasks.len(),
            events = events.len(),
            "goal planned"
        );
        Ok(Some(CreatedGoal {
            goal,
            tasks,
            events,
            unscheduled: outcome.unscheduled,
        }))
    }

    /// Persist a goal with no subtasks, tasks or events.
    pub async fn add_unplanned(&self, draft: &GoalDraft) -> Result<Option<Goal>> {
        if draft.is_blank() {
            return Ok(None);
        }
        let _guard = self.lock.lock().await;

        let mut state = self.store.load();
        let goal = Goal {
            id: self.planner.ids().next_id("goal"),
            scope: draft.scope,
            title: draft.title.trim().to_string(),
            description: draft.description.clone(),
            due: draft.due,
            priority: draft.priority,
            subtasks: Vec::new(),
            planned: false,
            created_at: Utc::now(),
        };
        insert_goal(&mut state, goal.clone(), Vec::new(), Vec::new());
        self.store
            .save(&state)
            .with_context(|| format!("failed to save goal {}", goal.id))?;
        info!(goal = %goal.id, "goal added without planning");
        Ok(Some(goal))
    }

    /// Delete a goal with its tasks and events. `Ok(None)` for unknown IDs.
    pub async fn delete_goal(&self, id: &str) -> Result<Option<DeletedGoal>> {
        let _guard = self.lock.lock().await;

        let mut state = self.store.load();
        let Some(deleted) = delete_goal(&mut state, id) else {
            return Ok(None);
        };
        self.store
            .save(&state)
            .with_context(|| format!("failed to save after deleting goal {id}"))?;
        Ok(Some(deleted))
    }
}
