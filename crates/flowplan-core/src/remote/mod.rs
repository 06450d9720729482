//! Optional remote planning and scheduling services.
//!
//! Both services sit behind object-safe traits so the planner can hold them
//! as `Arc<dyn ...>` and tests can swap in fakes.

mod error;
pub mod http;
mod types;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use error::RemoteError;
pub use http::HttpRemote;
pub use types::{
    PlanGoalRequest, PlanGoalResponse, RemoteSubtask, ScheduleRequest, ScheduleResponse,
    ScheduleTask, ScheduledItem, format_hour, parse_hour,
};

/// Default request timeout for remote calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Decomposes a goal into subtasks.
#[async_trait]
pub trait PlanningService: Send + Sync {
    async fn plan_goal(&self, request: &PlanGoalRequest) -> Result<Vec<RemoteSubtask>, RemoteError>;
}

/// Places subtasks onto the calendar.
#[async_trait]
pub trait SchedulingService: Send + Sync {
    async fn schedule(&self, request: &ScheduleRequest) -> Result<Vec<ScheduledItem>, RemoteError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn PlanningService, _: &dyn SchedulingService) {}
};

/// Where the remote services live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    #[serde(default = "default_timeout", with = "timeout_secs")]
    pub timeout: Duration,
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

mod timeout_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_config_defaults_timeout() {
        let config: RemoteConfig =
            serde_json::from_str(r#"{"base_url":"http://localhost:8000"}"#).unwrap();
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config, RemoteConfig::new("http://localhost:8000"));
    }

    #[test]
    fn remote_config_reads_timeout_seconds() {
        let config: RemoteConfig =
            serde_json::from_str(r#"{"base_url":"http://x","timeout":5}"#).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
