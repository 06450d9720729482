//! Wire types of the planning and scheduling protocol.
//!
//! Deserialization is lenient where remote services are known to vary:
//! identifiers may be numbers, `desc` and `duration` are accepted as
//! aliases, and dates stay raw strings until normalization drops the
//! invalid ones.

use chrono::NaiveDate;
use flowplan_store::Scope;
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Body of `POST /api/ai/plan_goal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanGoalRequest {
    pub title: String,
    #[serde(default, alias = "desc")]
    pub description: String,
    pub due: NaiveDate,
    pub scope: Scope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// One subtask proposed by a planning service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSubtask {
    #[serde(
        default,
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, alias = "duration", skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_str: Option<String>,
}

/// Response of `POST /api/ai/plan_goal`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanGoalResponse {
    #[serde(default)]
    pub subtasks: Vec<RemoteSubtask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

/// Body of `POST /ai/schedule`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub tasks: Vec<ScheduleTask>,
    pub start_date: NaiveDate,
    /// `"HH:MM-HH:MM"`.
    pub work_hours: String,
    pub timezone: String,
}

/// A subtask handed to a scheduling service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleTask {
    #[serde(deserialize_with = "required_lenient_id")]
    pub id: String,
    pub title: String,
    #[serde(alias = "duration")]
    pub duration_hours: f64,
    #[serde(default, rename = "dateStr", skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// One placement returned by a scheduling service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledItem {
    #[serde(deserialize_with = "required_lenient_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub date_str: String,
    /// `"HH:MM"`.
    pub start_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, alias = "duration")]
    pub duration_hours: f64,
}

/// Response of `POST /ai/schedule`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResponse {
    #[serde(default)]
    pub scheduled: Vec<ScheduledItem>,
}

/// Format a whole hour as `"HH:00"`.
pub fn format_hour(hour: u32) -> String {
    format!("{hour:02}:00")
}

/// Parse an on-the-hour `"HH:MM"` (or `"HH:MM:SS"`) time.
///
/// Anything off the hour grid, such as `"11:30"`, is `None`.
pub fn parse_hour(time: &str) -> Option<u32> {
    let mut parts = time.trim().split(':');
    let hour: u32 = parts.next()?.parse().ok()?;
    let on_the_hour = parts.all(|part| part.parse::<u32>() == Ok(0));
    (on_the_hour && hour <= 24).then_some(hour)
}

// ---------------------------------------------------------------------------
// Lenient identifiers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<RawId>::deserialize(deserializer)?;
    Ok(raw.map(String::from).filter(|s| !s.trim().is_empty()))
}

fn required_lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}
