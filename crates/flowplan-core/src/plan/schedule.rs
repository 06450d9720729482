//! Placement of subtasks onto the work calendar.
//!
//! Subtasks are placed strictly in input order, and every placement joins
//! the working event set before the next subtask is tried. Earlier subtasks
//! therefore claim earlier slots, and no two events produced by one run can
//! collide with each other or with the existing events.

use std::fmt;

use chrono::NaiveDate;
use flowplan_store::{Event, Subtask};
use tracing::{debug, warn};

use crate::calendar::{WorkCalendar, find_slot, is_working_day, next_day};
use crate::ids::IdGenerator;

use super::estimate::scheduling_hours;

/// Default number of calendar days searched past the candidate dates.
pub const DEFAULT_OVERFLOW_DAYS: u32 = 60;

/// Narrative grouping of a goal's subtasks into thirds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Discover,
    Build,
    Wrap,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Discover => "Discover",
            Self::Build => "Build",
            Self::Wrap => "Wrap",
        };
        f.write_str(s)
    }
}

impl Phase {
    /// Phase of the `index`-th of `count` subtasks.
    pub fn for_position(index: usize, count: usize) -> Self {
        let per_phase = count.div_ceil(3).max(1);
        match index / per_phase {
            0 => Self::Discover,
            1 => Self::Build,
            _ => Self::Wrap,
        }
    }
}

/// A subtask ready for placement.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSubtask {
    pub id: String,
    pub text: String,
    pub duration_hours: f64,
    pub date: Option<NaiveDate>,
    pub phase: Option<Phase>,
}

impl PlanSubtask {
    /// Title of the event this subtask becomes.
    pub fn event_title(&self) -> String {
        match self.phase {
            Some(phase) => format!("{phase} • {}", self.text),
            None => self.text.clone(),
        }
    }
}

/// Label every subtask with its phase.
pub fn assign_phases(subtasks: &mut [PlanSubtask]) {
    let count = subtasks.len();
    for (i, subtask) in subtasks.iter_mut().enumerate() {
        subtask.phase = Some(Phase::for_position(i, count));
    }
}

/// Tunables for a scheduling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    pub calendar: WorkCalendar,
    /// Calendar days searched after the last candidate date (weekends count).
    pub overflow_days: u32,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            calendar: WorkCalendar::default(),
            overflow_days: DEFAULT_OVERFLOW_DAYS,
        }
    }
}

/// Result of a scheduling run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleOutcome {
    /// Every input subtask in input order; placed ones carry their date.
    pub subtasks: Vec<Subtask>,
    /// Newly created events, in placement order.
    pub events: Vec<Event>,
    /// IDs of subtasks that found no slot within the overflow bound.
    pub unscheduled: Vec<String>,
}

/// Place `subtasks` onto `candidate_dates`, overflowing onto later working
/// days when the candidates are full.
pub fn schedule(
    subtasks: &[PlanSubtask],
    candidate_dates: &[NaiveDate],
    existing: &[Event],
    options: &SchedulerOptions,
    ids: &dyn IdGenerator,
) -> ScheduleOutcome {
    let mut working: Vec<Event> = existing.to_vec();
    let mut outcome = ScheduleOutcome::default();

    for subtask in subtasks {
        let hours = scheduling_hours(subtask.duration_hours);

        let placement = candidate_dates
            .iter()
            .copied()
            .find_map(|date| try_place(&options.calendar, date, hours, &working))
            .or_else(|| {
                let last = candidate_dates.last()?;
                overflow_dates(*last, options.overflow_days)
                    .find_map(|date| try_place(&options.calendar, date, hours, &working))
            });

        match placement {
            Some((date, start_hour)) => {
                let event = Event {
                    id: ids.next_id("ev"),
                    title: subtask.event_title(),
                    date,
                    start_hour,
                    duration: hours,
                    goal_id: None,
                };
                debug!(subtask = %subtask.id, %date, start_hour, hours, "subtask placed");
                working.push(event.clone());
                outcome.events.push(event);
                outcome.subtasks.push(Subtask {
                    id: subtask.id.clone(),
                    text: subtask.text.clone(),
                    duration_hours: subtask.duration_hours,
                    date: Some(date),
                });
            }
            None => {
                warn!(
                    subtask = %subtask.id,
                    hours,
                    overflow_days = options.overflow_days,
                    "no slot found, subtask left unscheduled"
                );
                outcome.unscheduled.push(subtask.id.clone());
                outcome.subtasks.push(Subtask {
                    id: subtask.id.clone(),
                    text: subtask.text.clone(),
                    duration_hours: subtask.duration_hours,
                    date: None,
                });
            }
        }
    }

    outcome
}

fn try_place(
    calendar: &WorkCalendar,
    date: NaiveDate,
    hours: u32,
    working: &[Event],
) -> Option<(NaiveDate, u32)> {
    find_slot(calendar, hours, working.iter().filter(|e| e.date == date))
        .map(|start_hour| (date, start_hour))
}

/// Working days among the `bound` calendar days following `last`.
fn overflow_dates(last: NaiveDate, bound: u32) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(next_day(last)), |d| Some(next_day(*d)))
        .take(bound as usize)
        .filter(|d| is_working_day(*d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sub(id: usize, hours: f64) -> PlanSubtask {
        PlanSubtask {
            id: id.to_string(),
            text: format!("step {id}"),
            duration_hours: hours,
            date: None,
            phase: None,
        }
    }

    #[test]
    fn eight_hours_on_a_daily_goal_overflow_to_next_weekday() {
        let subtasks: Vec<PlanSubtask> = (1..=8).map(|i| sub(i, 1.0)).collect();
        let ids = SequentialIds::new();
        // 2024-03-15 is a Friday, so overflow skips the weekend.
        let out = schedule(&subtasks, &[d("2024-03-15")], &[], &SchedulerOptions::default(), &ids);

        assert_eq!(out.events.len(), 8);
        let on_due = out.events.iter().filter(|e| e.date == d("2024-03-15")).count();
        assert_eq!(on_due, 7);
        assert_eq!(out.events[7].date, d("2024-03-18"));
        assert_eq!(out.events[7].start_hour, 9);

        let hours: Vec<u32> = out.events[..7].iter().map(|e| e.start_hour).collect();
        assert_eq!(hours, vec![9, 10, 11, 13, 14, 15, 16]);
        assert!(out.unscheduled.is_empty());
    }

    #[test]
    fn earlier_subtasks_claim_earlier_slots() {
        let subtasks = vec![sub(1, 2.0), sub(2, 1.0)];
        let ids = SequentialIds::new();
        let out = schedule(&subtasks, &[d("2024-03-15")], &[], &SchedulerOptions::default(), &ids);
        assert_eq!((out.events[0].start_hour, out.events[0].duration), (9, 2));
        assert_eq!((out.events[1].start_hour, out.events[1].duration), (11, 1));
    }

    #[test]
    fn sub_hour_estimates_take_a_whole_hour() {
        let ids = SequentialIds::new();
        let out = schedule(&[sub(1, 1.5)], &[d("2024-03-15")], &[], &SchedulerOptions::default(), &ids);
        assert_eq!(out.events[0].duration, 2);
        assert_eq!(out.subtasks[0].duration_hours, 1.5);
    }

    #[test]
    fn candidate_dates_are_tried_in_order() {
        let existing: Vec<Event> = [(9, 3), (13, 4)]
            .iter()
            .enumerate()
            .map(|(i, (start, len))| Event {
                id: format!("busy-{i}"),
                title: "busy".into(),
                date: d("2024-03-11"),
                start_hour: *start,
                duration: *len,
                goal_id: None,
            })
            .collect();
        let ids = SequentialIds::new();
        let out = schedule(
            &[sub(1, 1.0)],
            &[d("2024-03-11"), d("2024-03-12")],
            &existing,
            &SchedulerOptions::default(),
            &ids,
        );
        assert_eq!(out.events[0].date, d("2024-03-12"));
    }

    #[test]
    fn impossible_subtask_is_left_unscheduled() {
        let ids = SequentialIds::new();
        let out = schedule(
            &[sub(1, 5.0), sub(2, 1.0)],
            &[d("2024-03-15")],
            &[],
            &SchedulerOptions::default(),
            &ids,
        );
        assert_eq!(out.unscheduled, vec!["1".to_string()]);
        assert_eq!(out.events.len(), 1);
        assert_eq!(out.subtasks.len(), 2);
        assert_eq!(out.subtasks[0].date, None);
        assert_eq!(out.subtasks[1].date, Some(d("2024-03-15")));
    }

    #[test]
    fn overflow_bound_limits_the_search() {
        let options = SchedulerOptions {
            overflow_days: 2,
            ..SchedulerOptions::default()
        };
        let subtasks: Vec<PlanSubtask> = (1..=8).map(|i| sub(i, 1.0)).collect();
        let ids = SequentialIds::new();
        // Friday due date: the two overflow days are Saturday and Sunday.
        let out = schedule(&subtasks, &[d("2024-03-15")], &[], &options, &ids);
        assert_eq!(out.events.len(), 7);
        assert_eq!(out.unscheduled, vec!["8".to_string()]);
    }

    #[test]
    fn phases_split_into_thirds() {
        let mut subtasks: Vec<PlanSubtask> = (1..=7).map(|i| sub(i, 1.0)).collect();
        assign_phases(&mut subtasks);
        let phases: Vec<Phase> = subtasks.iter().map(|s| s.phase.unwrap()).collect();
        use Phase::*;
        assert_eq!(phases, vec![Discover, Discover, Discover, Build, Build, Build, Wrap]);
        assert_eq!(subtasks[0].event_title(), "Discover • step 1");
    }

    #[test]
    fn single_subtask_is_discover() {
        assert_eq!(Phase::for_position(0, 1), Phase::Discover);
        assert_eq!(Phase::for_position(1, 2), Phase::Build);
    }

    #[test]
    fn empty_candidates_leave_everything_unscheduled() {
        let ids = SequentialIds::new();
        let out = schedule(&[sub(1, 1.0)], &[], &[], &SchedulerOptions::default(), &ids);
        assert!(out.events.is_empty());
        assert_eq!(out.unscheduled.len(), 1);
    }
}
