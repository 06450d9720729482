//! Shared test utilities for FlowPlan integration tests.
//!
//! Each test gets its own data directory under a [`TempDir`]; the directory
//! (and every collection in it) disappears when the guard is dropped.

use chrono::{NaiveDate, Utc};
use tempfile::TempDir;

use flowplan_store::{Event, Goal, Priority, Scope, Store, StoreConfig, Subtask};

/// Open a store in a fresh temporary directory.
///
/// Keep the returned [`TempDir`] alive for as long as the store is used.
pub fn temp_store() -> (Store, TempDir) {
    let dir = TempDir::new().expect("failed to create temp data directory");
    let store = Store::open(StoreConfig::new(dir.path())).expect("failed to open temp store");
    (store, dir)
}

/// Parse a `YYYY-MM-DD` literal.
pub fn ymd(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_else(|e| panic!("bad date {s:?}: {e}"))
}

/// An event on `date` occupying `[start_hour, start_hour + duration)`.
pub fn event_at(id: &str, date: &str, start_hour: u32, duration: u32) -> Event {
    Event {
        id: id.to_string(),
        title: format!("busy {id}"),
        date: ymd(date),
        start_hour,
        duration,
        goal_id: None,
    }
}

/// A goal with the given subtasks and no other detail.
pub fn goal_with_subtasks(id: &str, due: &str, subtasks: &[(&str, &str)]) -> Goal {
    Goal {
        id: id.to_string(),
        scope: Scope::Weekly,
        title: format!("goal {id}"),
        description: String::new(),
        due: ymd(due),
        priority: Priority::Normal,
        subtasks: subtasks
            .iter()
            .map(|(sid, text)| Subtask {
                id: sid.to_string(),
                text: text.to_string(),
                duration_hours: 1.0,
                date: None,
            })
            .collect(),
        planned: true,
        created_at: Utc::now(),
    }
}

/// Panic if any two events on the same date overlap.
///
/// Intervals are half-open, so back-to-back events are fine.
pub fn assert_no_overlaps(events: &[Event]) {
    for (i, a) in events.iter().enumerate() {
        for b in &events[i + 1..] {
            if a.date != b.date {
                continue;
            }
            let disjoint = a.end_hour() <= b.start_hour || b.end_hour() <= a.start_hour;
            assert!(
                disjoint,
                "events overlap on {}: {} [{}, {}) and {} [{}, {})",
                a.date,
                a.id,
                a.start_hour,
                a.end_hour(),
                b.id,
                b.start_hour,
                b.end_hour()
            );
        }
    }
}
