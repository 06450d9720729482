use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Planning horizon of a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Daily,
    Weekly,
    Monthly,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        };
        f.write_str(s)
    }
}

impl FromStr for Scope {
    type Err = ScopeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(ScopeParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Scope`] string.
#[derive(Debug, Clone)]
pub struct ScopeParseError(pub String);

impl fmt::Display for ScopeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid scope: {:?} (expected daily, weekly, or monthly)",
            self.0
        )
    }
}

impl std::error::Error for ScopeParseError {}

// ---------------------------------------------------------------------------

/// Priority a user assigns to a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        };
        f.write_str(s)
    }
}

impl FromStr for Priority {
    type Err = PriorityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            other => Err(PriorityParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Priority`] string.
#[derive(Debug, Clone)]
pub struct PriorityParseError(pub String);

impl fmt::Display for PriorityParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid priority: {:?} (expected low, normal, or high)",
            self.0
        )
    }
}

impl std::error::Error for PriorityParseError {}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A user goal and the subtasks it was decomposed into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub scope: Scope,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due: NaiveDate,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    /// Whether the subtasks came out of a planning run.
    #[serde(default)]
    pub planned: bool,
    pub created_at: DateTime<Utc>,
}

/// One decomposed unit of work owned by a [`Goal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    /// Unique within the owning goal only.
    pub id: String,
    pub text: String,
    pub duration_hours: f64,
    #[serde(default, rename = "dateStr", skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// A checklist item.
///
/// Tasks derived from a subtask carry the id `<goalId>-<subtaskId>`; that
/// prefix is the only link back to the goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub done: bool,
    pub due: NaiveDate,
    #[serde(default = "default_estimate")]
    pub estimate_hours: f64,
}

fn default_estimate() -> f64 {
    1.0
}

impl Task {
    /// Id of a task derived from `subtask_id` of `goal_id`.
    pub fn derived_id(goal_id: &str, subtask_id: &str) -> String {
        format!("{goal_id}-{subtask_id}")
    }

    /// Whether this task was derived from a subtask of `goal_id`.
    pub fn is_derived_from(&self, goal_id: &str) -> bool {
        self.id
            .strip_prefix(goal_id)
            .is_some_and(|rest| rest.starts_with('-'))
    }
}

/// One placed block of work on the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(rename = "dateStr")]
    pub date: NaiveDate,
    pub start_hour: u32,
    /// Whole hours.
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<String>,
}

impl Event {
    /// Exclusive end hour of the event, saturating on corrupt records.
    pub fn end_hour(&self) -> u32 {
        self.start_hour.saturating_add(self.duration)
    }
}

/// Everything the application persists, held in memory between saves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub goals: Vec<Goal>,
    pub tasks: Vec<Task>,
    pub events: Vec<Event>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_round_trips_through_strings() {
        for scope in [Scope::Daily, Scope::Weekly, Scope::Monthly] {
            assert_eq!(scope.to_string().parse::<Scope>().unwrap(), scope);
        }
        assert!("yearly".parse::<Scope>().is_err());
    }

    #[test]
    fn priority_defaults_to_normal() {
        assert_eq!(Priority::default(), Priority::Normal);
        let err = "urgent".parse::<Priority>().unwrap_err();
        assert!(err.to_string().contains("urgent"));
    }

    #[test]
    fn derived_task_prefix_does_not_match_longer_goal_ids() {
        let task = Task {
            id: Task::derived_id("goal-10", "1"),
            text: "x".into(),
            done: false,
            due: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            estimate_hours: 1.0,
        };
        assert!(task.is_derived_from("goal-10"));
        assert!(!task.is_derived_from("goal-1"));
    }

    #[test]
    fn event_serializes_with_storage_field_names() {
        let event = Event {
            id: "ev-1".into(),
            title: "Write".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            start_hour: 9,
            duration: 2,
            goal_id: Some("goal-1".into()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["dateStr"], "2024-03-15");
        assert_eq!(json["startHour"], 9);
        assert_eq!(json["goalId"], "goal-1");
        assert_eq!(event.end_hour(), 11);

        let corrupt = Event {
            duration: u32::MAX,
            ..event
        };
        assert_eq!(corrupt.end_hour(), u32::MAX);
    }
}
