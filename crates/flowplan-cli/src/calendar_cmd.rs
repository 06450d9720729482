use anyhow::Result;
use chrono::NaiveDate;

use flowplan_core::calendar::week_bounds;
use flowplan_store::queries::events::events_between;
use flowplan_store::{AppState, Store};

/// Show the events of the Monday-Sunday week containing `date`.
pub fn run_calendar(store: &Store, date: NaiveDate) -> Result<()> {
    let state = store.load();
    print_week(&state, date);
    Ok(())
}

/// Print the week containing `date`, one block per day that has events.
pub fn print_week(state: &AppState, date: NaiveDate) {
    let (monday, sunday) = week_bounds(date);
    let events = events_between(state, monday, sunday);

    println!("Week of {monday} to {sunday}");
    if events.is_empty() {
        println!("  No events.");
        return;
    }

    let mut current: Option<NaiveDate> = None;
    for event in events {
        if current != Some(event.date) {
            println!("  {} {}", event.date.format("%a"), event.date);
            current = Some(event.date);
        }
        println!(
            "    {:02}:00-{:02}:00  {}",
            event.start_hour,
            event.end_hour(),
            event.title
        );
    }
}
