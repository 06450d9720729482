//! Candidate working dates for a goal's scope.

use chrono::{Datelike, NaiveDate};

use flowplan_store::Scope;

use super::{is_working_day, next_day, week_bounds};

/// Ordered dates a goal's subtasks may be scheduled into.
///
/// - `Daily`: the due date alone, weekend or not.
/// - `Weekly`: Monday to Friday of the week containing `due`.
/// - `Monthly`: working days from the first of the month through `due`,
///   extended past `due` until there are at least `subtask_count` of them.
pub fn build_candidate_dates(scope: Scope, due: NaiveDate, subtask_count: usize) -> Vec<NaiveDate> {
    match scope {
        Scope::Daily => vec![due],
        Scope::Weekly => {
            let (monday, _) = week_bounds(due);
            monday
                .iter_days()
                .take(7)
                .filter(|d| is_working_day(*d))
                .collect()
        }
        Scope::Monthly => {
            let first = due.with_day(1).unwrap_or(due);
            let mut dates: Vec<NaiveDate> = first
                .iter_days()
                .take_while(|d| *d <= due)
                .filter(|d| is_working_day(*d))
                .collect();

            let mut cursor = next_day(due);
            while dates.len() < subtask_count {
                if is_working_day(cursor) {
                    dates.push(cursor);
                }
                let next = next_day(cursor);
                if next == cursor {
                    break;
                }
                cursor = next;
            }
            dates
        }
    }
}
