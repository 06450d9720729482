//! Planner facade: remote services first, local algorithms as fallback.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use flowplan_store::{Event, Priority, Scope, Subtask};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::calendar::{CalendarError, WorkCalendar, build_candidate_dates, overlaps};
use crate::ids::IdGenerator;
use crate::remote::{
    PlanGoalRequest, PlanningService, RemoteError, RemoteSubtask, ScheduleRequest, ScheduleTask,
    ScheduledItem, SchedulingService, parse_hour,
};

use super::estimate::{estimate, scheduling_hours};
use super::schedule::{
    DEFAULT_OVERFLOW_DAYS, PlanSubtask, ScheduleOutcome, SchedulerOptions, assign_phases, schedule,
};
use super::segment::{DEFAULT_MAX_PHRASES, segment};

/// Result of a planning run: the goal's subtasks and the events placed for them.
pub type PlanOutcome = ScheduleOutcome;

/// Errors that abort a planning run. Nothing is persisted when one is raised.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalDraft {
    pub title: String,
    pub description: String,
    pub due: NaiveDate,
    pub scope: Scope,
    pub priority: Priority,
}

impl GoalDraft {
    pub fn new(title: impl Into<String>, due: NaiveDate, scope: Scope) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            due,
            scope,
            priority: Priority::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Whitespace-only titles never produce a goal.
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty()
    }
}

/// Tunables of the planner.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerOptions {
    pub calendar: WorkCalendar,
    pub max_phrases: usize,
    pub overflow_days: u32,
    pub locale: Option<String>,
    pub timezone: String,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            calendar: WorkCalendar::default(),
            max_phrases: DEFAULT_MAX_PHRASES,
            overflow_days: DEFAULT_OVERFLOW_DAYS,
            locale: None,
            timezone: "UTC".to_string(),
        }
    }
}

impl PlannerOptions {
    fn scheduler(&self) -> SchedulerOptions {
        SchedulerOptions {
            calendar: self.calendar,
            overflow_days: self.overflow_days,
        }
    }
}

/// Use the remote result when there is a usable one, the local computation
/// otherwise.
///
/// `remote` is `None` when no service is configured.
pub fn or_fallback<T>(
    remote: Option<Result<T, RemoteError>>,
    stage: &str,
    local: impl FnOnce() -> T,
) -> T {
    match remote {
        Some(Ok(value)) => {
            info!(stage, backend = "remote", "stage served");
            value
        }
        Some(Err(err)) => {
            warn!(stage, error = %err, "remote service failed, falling back to local");
            local()
        }
        None => {
            debug!(stage, backend = "local", "no remote service configured");
            local()
        }
    }
}

/// Turns goal drafts into subtasks and calendar events.
pub struct Planner {
    planning: Option<Arc<dyn PlanningService>>,
    scheduling: Option<Arc<dyn SchedulingService>>,
    ids: Arc<dyn IdGenerator>,
    options: PlannerOptions,
}

impl Planner {
    /// A planner running only the local algorithms.
    pub fn local(ids: Arc<dyn IdGenerator>, options: PlannerOptions) -> Self {
        Self {
            planning: None,
            scheduling: None,
            ids,
            options,
        }
    }

    pub fn with_planning(mut self, service: Arc<dyn PlanningService>) -> Self {
        self.planning = Some(service);
        self
    }

    pub fn with_scheduling(mut self, service: Arc<dyn SchedulingService>) -> Self {
        self.scheduling = Some(service);
        self
    }

    pub fn options(&self) -> &PlannerOptions {
        &self.options
    }

    pub fn ids(&self) -> &Arc<dyn IdGenerator> {
        &self.ids
    }

    /// Decompose `draft` and place its subtasks around `existing` events.
    pub async fn plan(&self, draft: &GoalDraft, existing: &[Event]) -> Result<PlanOutcome, PlanError> {
        self.options.calendar.validate()?;

        let remote_subtasks = match &self.planning {
            Some(service) => Some(self.remote_subtasks(service.as_ref(), draft).await),
            None => None,
        };
        let mut subtasks = or_fallback(remote_subtasks, "plan", || self.local_subtasks(draft));

        let candidates = build_candidate_dates(draft.scope, draft.due, subtasks.len());
        debug!(
            subtasks = subtasks.len(),
            candidates = candidates.len(),
            "candidate dates built"
        );

        let remote_schedule = match &self.scheduling {
            Some(service) => Some(
                self.remote_schedule(service.as_ref(), draft, &subtasks, &candidates, existing)
                    .await,
            ),
            None => None,
        };
        let outcome = or_fallback(remote_schedule, "schedule", || {
            assign_phases(&mut subtasks);
            schedule(
                &subtasks,
                &candidates,
                existing,
                &self.options.scheduler(),
                self.ids.as_ref(),
            )
        });

        info!(
            subtasks = outcome.subtasks.len(),
            events = outcome.events.len(),
            unscheduled = outcome.unscheduled.len(),
            "planning run complete"
        );
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Subtasks
    // -----------------------------------------------------------------------

    async fn remote_subtasks(
        &self,
        service: &dyn PlanningService,
        draft: &GoalDraft,
    ) -> Result<Vec<PlanSubtask>, RemoteError> {
        let request = PlanGoalRequest {
            title: draft.title.clone(),
            description: draft.description.clone(),
            due: draft.due,
            scope: draft.scope,
            locale: self.options.locale.clone(),
        };
        let raw = service.plan_goal(&request).await?;
        let subtasks = normalize(raw, self.options.max_phrases);
        if subtasks.is_empty() {
            return Err(RemoteError::InvalidResponse(
                "planning service returned no usable subtasks".to_string(),
            ));
        }
        Ok(subtasks)
    }

    fn local_subtasks(&self, draft: &GoalDraft) -> Vec<PlanSubtask> {
        local_subtasks(&draft.title, &draft.description, self.options.max_phrases)
    }

    // -----------------------------------------------------------------------
    // Schedule
    // -----------------------------------------------------------------------

    async fn remote_schedule(
        &self,
        service: &dyn SchedulingService,
        draft: &GoalDraft,
        subtasks: &[PlanSubtask],
        candidates: &[NaiveDate],
        existing: &[Event],
    ) -> Result<ScheduleOutcome, RemoteError> {
        let start_date = candidates.first().copied().unwrap_or(draft.due);
        let request = ScheduleRequest {
            tasks: subtasks
                .iter()
                .map(|s| ScheduleTask {
                    id: s.id.clone(),
                    title: s.text.clone(),
                    duration_hours: s.duration_hours,
                    date: s.date,
                })
                .collect(),
            start_date,
            work_hours: self.options.calendar.work_hours_range(),
            timezone: self.options.timezone.clone(),
        };

        let items = service.schedule(&request).await?;
        if items.is_empty() {
            return Err(RemoteError::InvalidResponse(
                "scheduling service returned an empty schedule".to_string(),
            ));
        }
        accept_remote_schedule(
            &items,
            subtasks,
            existing,
            &self.options.calendar,
            &draft.title,
            self.ids.as_ref(),
        )
    }
}

/// Segment and estimate a goal without any remote help.
pub fn local_subtasks(title: &str, description: &str, max_phrases: usize) -> Vec<PlanSubtask> {
    let raw = segment(title, description, max_phrases)
        .into_iter()
        .map(|text| RemoteSubtask {
            id: None,
            duration_hours: Some(estimate(&text)),
            text,
            date_str: None,
        })
        .collect();
    normalize(raw, max_phrases)
}

/// Clean up raw subtasks: cap the count, fill in ids, drop blank text,
/// round durations up to whole hours and drop unparseable dates.
pub fn normalize(raw: Vec<RemoteSubtask>, max_phrases: usize) -> Vec<PlanSubtask> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for item in raw {
        if out.len() == max_phrases {
            break;
        }
        let text = item.text.trim();
        if text.is_empty() {
            continue;
        }

        let position = out.len() + 1;
        let id = item
            .id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty() && !seen.contains(id))
            .unwrap_or_else(|| unused_id(position, &seen));
        seen.insert(id.clone());

        let hours = item
            .duration_hours
            .filter(|h| h.is_finite() && *h > 0.0)
            .unwrap_or_else(|| estimate(text));

        out.push(PlanSubtask {
            id,
            text: text.to_string(),
            duration_hours: f64::from(scheduling_hours(hours)),
            date: item
                .date_str
                .as_deref()
                .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()),
            phase: None,
        });
    }
    out
}

fn unused_id(position: usize, seen: &HashSet<String>) -> String {
    (position..)
        .map(|n| n.to_string())
        .find(|candidate| !seen.contains(candidate))
        .unwrap_or_default()
}

/// Convert a remote schedule into events, rejecting it when it breaks the
/// hour grid or collides with existing events or with itself.
fn accept_remote_schedule(
    items: &[ScheduledItem],
    subtasks: &[PlanSubtask],
    existing: &[Event],
    calendar: &WorkCalendar,
    goal_title: &str,
    ids: &dyn IdGenerator,
) -> Result<ScheduleOutcome, RemoteError> {
    let invalid = |msg: String| RemoteError::InvalidResponse(msg);
    let mut placed: Vec<(&ScheduledItem, NaiveDate, u32, u32)> = Vec::new();
    let mut claimed = HashSet::new();

    for item in items {
        if !subtasks.iter().any(|s| s.id == item.id) {
            return Err(invalid(format!("unknown subtask id {:?}", item.id)));
        }
        if !claimed.insert(item.id.as_str()) {
            return Err(invalid(format!("subtask {:?} scheduled twice", item.id)));
        }
        let date = NaiveDate::parse_from_str(item.date_str.trim(), "%Y-%m-%d")
            .map_err(|_| invalid(format!("bad date {:?}", item.date_str)))?;
        let start = parse_hour(&item.start_time)
            .ok_or_else(|| invalid(format!("bad start time {:?}", item.start_time)))?;
        let duration = item_duration(item, start);
        let end = start.checked_add(duration);

        if let Some(end_time) = item.end_time.as_deref() {
            if parse_hour(end_time).is_none_or(|stated| Some(stated) != end) {
                return Err(invalid(format!(
                    "{} ends at {end_time:?}, not {duration}h after {start}:00",
                    item.id
                )));
            }
        }

        let in_grid = end.is_some_and(|end| {
            calendar
                .blocks()
                .iter()
                .any(|(block_start, block_end)| start >= *block_start && end <= *block_end)
        });
        if !in_grid {
            return Err(invalid(format!(
                "{} at {start}:00 for {duration}h is outside working hours",
                item.id
            )));
        }

        let collides = existing
            .iter()
            .filter(|e| e.date == date)
            .any(|e| overlaps(start, duration, e.start_hour, e.duration))
            || placed
                .iter()
                .any(|(_, d, s, len)| *d == date && overlaps(start, duration, *s, *len));
        if collides {
            return Err(invalid(format!("{} on {date} overlaps another event", item.id)));
        }

        placed.push((item, date, start, duration));
    }

    let mut outcome = ScheduleOutcome::default();
    for (item, date, start_hour, duration) in &placed {
        let label = if item.title.trim().is_empty() {
            subtasks
                .iter()
                .find(|s| s.id == item.id)
                .map(|s| s.text.as_str())
                .unwrap_or_default()
        } else {
            item.title.trim()
        };
        outcome.events.push(Event {
            id: ids.next_id("ev"),
            title: format!("{goal_title} — {label}"),
            date: *date,
            start_hour: *start_hour,
            duration: *duration,
            goal_id: None,
        });
    }

    for subtask in subtasks {
        let date = placed
            .iter()
            .find(|(item, ..)| item.id == subtask.id)
            .map(|(_, date, ..)| *date);
        if date.is_none() {
            warn!(subtask = %subtask.id, "remote schedule left subtask unplaced");
            outcome.unscheduled.push(subtask.id.clone());
        }
        outcome.subtasks.push(Subtask {
            id: subtask.id.clone(),
            text: subtask.text.clone(),
            duration_hours: subtask.duration_hours,
            date,
        });
    }
    Ok(outcome)
}

/// Whole hours of a remote placement: the rounded duration, else the span
/// to `endTime`, else one hour.
fn item_duration(item: &ScheduledItem, start: u32) -> u32 {
    if item.duration_hours.is_finite() && item.duration_hours > 0.0 {
        return (item.duration_hours.round() as u32).max(1);
    }
    item.end_time
        .as_deref()
        .and_then(parse_hour)
        .filter(|end| *end > start)
        .map(|end| end - start)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn raw(id: Option<&str>, text: &str, hours: Option<f64>, date: Option<&str>) -> RemoteSubtask {
        RemoteSubtask {
            id: id.map(str::to_string),
            text: text.to_string(),
            duration_hours: hours,
            date_str: date.map(str::to_string),
        }
    }

    fn item(id: &str, date: &str, start: &str, hours: f64) -> ScheduledItem {
        ScheduledItem {
            id: id.into(),
            title: format!("item {id}"),
            date_str: date.into(),
            start_time: start.into(),
            end_time: None,
            duration_hours: hours,
        }
    }

    fn plan_subtask(id: &str, hours: f64) -> PlanSubtask {
        PlanSubtask {
            id: id.into(),
            text: format!("text {id}"),
            duration_hours: hours,
            date: None,
            phase: None,
        }
    }

    struct FixedSchedule(Vec<ScheduledItem>);

    #[async_trait]
    impl SchedulingService for FixedSchedule {
        async fn schedule(&self, _: &ScheduleRequest) -> Result<Vec<ScheduledItem>, RemoteError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct RecordingPlanner(Mutex<Vec<PlanGoalRequest>>);

    #[async_trait]
    impl PlanningService for RecordingPlanner {
        async fn plan_goal(&self, request: &PlanGoalRequest) -> Result<Vec<RemoteSubtask>, RemoteError> {
            self.0.lock().unwrap().push(request.clone());
            Ok(vec![raw(Some("a"), "Research", Some(2.0), None)])
        }
    }

    #[test]
    fn normalize_fills_ids_and_rounds() {
        let out = normalize(
            vec![
                raw(None, "  first ", Some(1.5), Some("2024-03-12")),
                raw(Some("x"), "second", None, Some("not a date")),
                raw(Some("x"), "third", Some(0.2), None),
                raw(None, "   ", Some(3.0), None),
            ],
            DEFAULT_MAX_PHRASES,
        );
        assert_eq!(out.len(), 3);
        assert_eq!((out[0].id.as_str(), out[0].text.as_str()), ("1", "first"));
        assert_eq!(out[0].duration_hours, 2.0);
        assert_eq!(out[0].date, Some(d("2024-03-12")));
        assert_eq!(out[1].id, "x");
        assert_eq!(out[1].duration_hours, 1.0);
        assert_eq!(out[1].date, None);
        // Duplicate id falls back to the position.
        assert_eq!(out[2].id, "3");
        assert_eq!(out[2].duration_hours, 1.0);
    }

    #[test]
    fn normalize_caps_count() {
        let many = (0..10).map(|i| raw(None, &format!("step {i}"), None, None)).collect();
        assert_eq!(normalize(many, 4).len(), 4);
    }

    #[test]
    fn or_fallback_prefers_remote() {
        assert_eq!(or_fallback(Some(Ok(1)), "t", || 2), 1);
        assert_eq!(
            or_fallback(Some(Err(RemoteError::InvalidResponse("x".into()))), "t", || 2),
            2
        );
        assert_eq!(or_fallback(None, "t", || 3), 3);
    }

    #[test]
    fn remote_schedule_is_accepted_and_titled() {
        let subtasks = [plan_subtask("1", 2.0), plan_subtask("2", 1.0)];
        let items = [item("1", "2024-03-12", "09:00", 2.0), item("2", "2024-03-12", "13:00", 1.0)];
        let ids = SequentialIds::new();
        let out = accept_remote_schedule(&items, &subtasks, &[], &WorkCalendar::default(), "Launch", &ids)
            .unwrap();
        assert_eq!(out.events.len(), 2);
        assert_eq!(out.events[0].title, "Launch — item 1");
        assert_eq!((out.events[1].start_hour, out.events[1].duration), (13, 1));
        assert_eq!(out.subtasks[0].date, Some(d("2024-03-12")));
        assert!(out.unscheduled.is_empty());
    }

    #[test]
    fn remote_schedule_spanning_lunch_is_rejected() {
        let subtasks = [plan_subtask("1", 2.0)];
        let items = [item("1", "2024-03-12", "11:00", 2.0)];
        let ids = SequentialIds::new();
        let err = accept_remote_schedule(&items, &subtasks, &[], &WorkCalendar::default(), "G", &ids)
            .unwrap_err();
        assert!(matches!(err, RemoteError::InvalidResponse(_)));
    }

    #[test]
    fn remote_schedule_overlapping_existing_is_rejected() {
        let subtasks = [plan_subtask("1", 1.0)];
        let items = [item("1", "2024-03-12", "10:00", 1.0)];
        let existing = [Event {
            id: "busy".into(),
            title: "busy".into(),
            date: d("2024-03-12"),
            start_hour: 9,
            duration: 2,
            goal_id: None,
        }];
        let ids = SequentialIds::new();
        assert!(
            accept_remote_schedule(&items, &subtasks, &existing, &WorkCalendar::default(), "G", &ids)
                .is_err()
        );
    }

    #[test]
    fn remote_schedule_overlapping_itself_is_rejected() {
        let subtasks = [plan_subtask("1", 2.0), plan_subtask("2", 1.0)];
        let items = [item("1", "2024-03-12", "09:00", 2.0), item("2", "2024-03-12", "10:00", 1.0)];
        let ids = SequentialIds::new();
        assert!(
            accept_remote_schedule(&items, &subtasks, &[], &WorkCalendar::default(), "G", &ids)
                .is_err()
        );
    }

    #[test]
    fn remote_schedule_off_the_hour_is_rejected() {
        let subtasks = [plan_subtask("1", 1.0)];
        let mut half_past = item("1", "2024-03-12", "11:30", 1.0);
        half_past.end_time = Some("12:30".into());
        let ids = SequentialIds::new();
        let err = accept_remote_schedule(&[half_past], &subtasks, &[], &WorkCalendar::default(), "G", &ids)
            .unwrap_err();
        assert!(matches!(err, RemoteError::InvalidResponse(_)));
    }

    #[test]
    fn remote_end_time_must_match_duration() {
        let subtasks = [plan_subtask("1", 1.0)];
        let mut it = item("1", "2024-03-12", "09:00", 1.0);
        it.end_time = Some("11:00".into());
        let ids = SequentialIds::new();
        assert!(
            accept_remote_schedule(&[it.clone()], &subtasks, &[], &WorkCalendar::default(), "G", &ids)
                .is_err()
        );

        it.end_time = Some("10:00".into());
        let out = accept_remote_schedule(&[it], &subtasks, &[], &WorkCalendar::default(), "G", &ids)
            .unwrap();
        assert_eq!((out.events[0].start_hour, out.events[0].duration), (9, 1));
    }

    #[test]
    fn remote_duration_beyond_any_block_is_rejected() {
        let subtasks = [plan_subtask("1", 1.0)];
        let ids = SequentialIds::new();
        for hours in [1e12, 5.0] {
            let it = item("1", "2024-03-12", "09:00", hours);
            let err = accept_remote_schedule(&[it], &subtasks, &[], &WorkCalendar::default(), "G", &ids)
                .unwrap_err();
            assert!(matches!(err, RemoteError::InvalidResponse(_)));
        }
    }

    #[test]
    fn duration_falls_back_to_end_time() {
        let mut it = item("1", "2024-03-12", "13:00", 0.0);
        it.end_time = Some("15:00".into());
        assert_eq!(item_duration(&it, 13), 2);
        it.end_time = None;
        assert_eq!(item_duration(&it, 13), 1);
    }

    #[tokio::test]
    async fn remote_plan_and_schedule_are_used_together() {
        let planning = Arc::new(RecordingPlanner::default());
        let scheduling = Arc::new(FixedSchedule(vec![item("a", "2024-03-13", "14:00", 2.0)]));
        let options = PlannerOptions {
            locale: Some("en-GB".into()),
            ..PlannerOptions::default()
        };
        let planner = Planner::local(Arc::new(SequentialIds::new()), options)
            .with_planning(planning.clone())
            .with_scheduling(scheduling);

        let draft = GoalDraft::new("Launch", d("2024-03-15"), Scope::Weekly).with_description("desc");
        let out = planner.plan(&draft, &[]).await.unwrap();

        assert_eq!(out.events.len(), 1);
        assert_eq!(out.events[0].title, "Launch — item a");
        assert_eq!(out.events[0].date, d("2024-03-13"));

        let requests = planning.0.lock().unwrap();
        assert_eq!(requests[0].description, "desc");
        assert_eq!(requests[0].locale.as_deref(), Some("en-GB"));
    }

    #[tokio::test]
    async fn invalid_calendar_aborts() {
        let options = PlannerOptions {
            calendar: WorkCalendar {
                day_start: 14,
                lunch_start: 12,
                lunch_end: 13,
                day_end: 17,
            },
            ..PlannerOptions::default()
        };
        let planner = Planner::local(Arc::new(SequentialIds::new()), options);
        let draft = GoalDraft::new("Launch", d("2024-03-15"), Scope::Daily);
        let err = planner.plan(&draft, &[]).await.unwrap_err();
        assert!(matches!(err, PlanError::Calendar(_)));
    }
}
