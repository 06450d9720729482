use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};

use flowplan_core::calendar::week_bounds;
use flowplan_core::export::{export_file_name, serialize};
use flowplan_store::queries::events::events_between;
use flowplan_store::{Event, Store};

const CALENDAR_NAME: &str = "FlowPlan";

/// Export the events of the week containing `date` as an `.ics` file.
///
/// Nothing is written when the week has no events. Returns the written path.
pub fn run_export(store: &Store, date: NaiveDate, output: Option<&str>) -> Result<Option<PathBuf>> {
    let (monday, sunday) = week_bounds(date);
    let state = store.load();
    let events: Vec<Event> = events_between(&state, monday, sunday)
        .into_iter()
        .cloned()
        .collect();

    if events.is_empty() {
        println!("No events between {monday} and {sunday}; nothing exported.");
        return Ok(None);
    }

    let dir = output.map(Path::new).unwrap_or_else(|| Path::new("."));
    let path = dir.join(export_file_name(monday, sunday));
    let document = serialize(&events, Utc::now(), CALENDAR_NAME);
    std::fs::write(&path, document)
        .with_context(|| format!("cannot write export file: {}", path.display()))?;

    println!("Exported {} events to {}", events.len(), path.display());
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowplan_core::export::parse;
    use flowplan_test_utils::{event_at, temp_store, ymd};

    #[test]
    fn exports_only_the_requested_week() {
        let (store, dir) = temp_store();
        let mut state = store.load();
        state.events.push(event_at("in", "2024-03-13", 9, 2));
        state.events.push(event_at("sunday", "2024-03-17", 13, 1));
        state.events.push(event_at("next-week", "2024-03-18", 9, 1));
        store.save(&state).unwrap();

        let out = tempfile::TempDir::new().unwrap();
        let path = run_export(&store, ymd("2024-03-15"), out.path().to_str())
            .unwrap()
            .unwrap();
        assert_eq!(
            path.file_name().unwrap(),
            "FlowPlan-2024-03-11_to_2024-03-17.ics"
        );

        let parsed = parse(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let ids: Vec<&str> = parsed.iter().map(|e| e.event_id()).collect();
        assert_eq!(ids, vec!["in", "sunday"]);
        drop(dir);
    }

    #[test]
    fn empty_week_writes_nothing() {
        let (store, _dir) = temp_store();
        let out = tempfile::TempDir::new().unwrap();
        let written = run_export(&store, ymd("2024-03-15"), out.path().to_str()).unwrap();
        assert!(written.is_none());
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
    }
}
