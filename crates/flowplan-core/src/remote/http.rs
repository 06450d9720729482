//! reqwest-backed client for the remote planning and scheduling services.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    PlanGoalRequest, PlanGoalResponse, PlanningService, RemoteConfig, RemoteError, RemoteSubtask,
    ScheduleRequest, ScheduleResponse, ScheduledItem, SchedulingService,
};

const PLAN_GOAL_PATH: &str = "/api/ai/plan_goal";
const SCHEDULE_PATH: &str = "/ai/schedule";

/// HTTP client speaking both halves of the protocol against one base URL.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl HttpRemote {
    pub fn from_config(config: &RemoteConfig) -> Result<Self, RemoteError> {
        debug!(base_url = %config.base_url, timeout = ?config.timeout, "from_config: called");
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(RemoteError::Network)?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            timeout: config.timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, RemoteError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "post_json: sending");

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(%url, status = status.as_u16(), "post_json: non-success status");
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn transport_error(&self, err: reqwest::Error) -> RemoteError {
        if err.is_timeout() {
            RemoteError::Timeout(self.timeout)
        } else {
            RemoteError::Network(err)
        }
    }
}

#[async_trait]
impl PlanningService for HttpRemote {
    async fn plan_goal(&self, request: &PlanGoalRequest) -> Result<Vec<RemoteSubtask>, RemoteError> {
        let response: PlanGoalResponse = self.post_json(PLAN_GOAL_PATH, request).await?;
        debug!(
            count = response.subtasks.len(),
            notes = response.notes.as_deref().unwrap_or(""),
            "plan_goal: received"
        );
        Ok(response.subtasks)
    }
}

#[async_trait]
impl SchedulingService for HttpRemote {
    async fn schedule(&self, request: &ScheduleRequest) -> Result<Vec<ScheduledItem>, RemoteError> {
        let response: ScheduleResponse = self.post_json(SCHEDULE_PATH, request).await?;
        debug!(count = response.scheduled.len(), "schedule: received");
        Ok(response.scheduled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let remote = HttpRemote::from_config(&RemoteConfig::new("http://localhost:8000/")).unwrap();
        assert_eq!(remote.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_error() {
        let config = RemoteConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout: Duration::from_secs(2),
        };
        let remote = HttpRemote::from_config(&config).unwrap();
        let request = PlanGoalRequest {
            title: "Ship".into(),
            description: String::new(),
            due: chrono::NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            scope: flowplan_store::Scope::Daily,
            locale: None,
        };
        let err = remote.plan_goal(&request).await.unwrap_err();
        assert!(err.is_transport(), "unexpected error: {err}");
    }
}
