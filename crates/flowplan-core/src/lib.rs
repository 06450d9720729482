//! FlowPlan core: turns free-text goals into scheduled calendar events.
//!
//! The pipeline runs segmentation and estimation, builds candidate dates,
//! places subtasks on the work calendar and exports the result as
//! iCalendar. Remote planning and scheduling services are optional; every
//! stage has a local fallback.

pub mod calendar;
pub mod export;
pub mod ids;
pub mod plan;
pub mod remote;

pub use calendar::{CalendarError, WorkCalendar};
pub use ids::{IdGenerator, SequentialIds, UuidIds};
pub use plan::{CreatedGoal, GoalDraft, GoalService, PlanError, Planner, PlannerOptions};
pub use remote::{HttpRemote, RemoteConfig, RemoteError};
