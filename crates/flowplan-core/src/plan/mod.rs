//! Goal planning: segmentation, estimation, scheduling and the facade that
//! ties them to the optional remote services.

pub mod estimate;
pub mod goal;
pub mod schedule;
pub mod segment;
pub mod service;

pub use estimate::{MAX_SCHEDULING_HOURS, MIN_ESTIMATE_HOURS, estimate, scheduling_hours};
pub use goal::{CreatedGoal, GoalService};
pub use schedule::{
    DEFAULT_OVERFLOW_DAYS, Phase, PlanSubtask, ScheduleOutcome, SchedulerOptions, assign_phases,
    schedule,
};
pub use segment::{DEFAULT_MAX_PHRASES, segment};
pub use service::{
    GoalDraft, PlanError, PlanOutcome, Planner, PlannerOptions, local_subtasks, normalize,
    or_fallback,
};
