//! Calendar event lookups.

use chrono::NaiveDate;

use crate::models::{AppState, Event};

/// Events on `date`, ordered by start hour.
pub fn events_on(state: &AppState, date: NaiveDate) -> Vec<&Event> {
    let mut events: Vec<&Event> = state.events.iter().filter(|e| e.date == date).collect();
    events.sort_by_key(|e| e.start_hour);
    events
}

/// Events dated within `[first, last]`, ordered by date then start hour.
pub fn events_between(state: &AppState, first: NaiveDate, last: NaiveDate) -> Vec<&Event> {
    let mut events: Vec<&Event> = state
        .events
        .iter()
        .filter(|e| e.date >= first && e.date <= last)
        .collect();
    events.sort_by_key(|e| (e.date, e.start_hour));
    events
}

/// Events tagged with `goal_id`, ordered by date then start hour.
pub fn events_for_goal<'a>(state: &'a AppState, goal_id: &str) -> Vec<&'a Event> {
    let mut events: Vec<&Event> = state
        .events
        .iter()
        .filter(|e| e.goal_id.as_deref() == Some(goal_id))
        .collect();
    events.sort_by_key(|e| (e.date, e.start_hour));
    events
}
