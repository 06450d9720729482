use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use flowplan_core::calendar::{is_working_day, next_day};
use flowplan_core::export::{export_file_name, serialize};
use flowplan_core::plan::{PlanSubtask, SchedulerOptions, local_subtasks, schedule};
use flowplan_core::remote::{
    PlanGoalRequest, PlanGoalResponse, RemoteSubtask, ScheduleRequest, ScheduleResponse,
    ScheduledItem, format_hour,
};
use flowplan_core::{IdGenerator, PlannerOptions, UuidIds};
use flowplan_store::Event;

const FALLBACK_NOTE: &str = "fallback_local";
const DEFAULT_CALENDAR_NAME: &str = "FlowPlan";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    fn rejected(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Shared by every handler; the server never touches the store.
#[derive(Clone)]
pub struct ServeState {
    options: PlannerOptions,
    ids: Arc<dyn IdGenerator>,
}

impl ServeState {
    pub fn new(options: PlannerOptions, ids: Arc<dyn IdGenerator>) -> Self {
        Self { options, ids }
    }
}

/// Body of `POST /calendar/export-ics`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportRequest {
    #[serde(default)]
    events: Vec<Event>,
    #[serde(default)]
    calendar_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: ServeState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/ai/plan_goal", post(plan_goal))
        .route("/ai/schedule", post(schedule_tasks))
        .route("/calendar/export-ics", post(export_ics))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(options: PlannerOptions, bind: &str, port: u16) -> Result<()> {
    options.calendar.validate()?;
    let app = build_router(ServeState::new(options, Arc::new(UuidIds)));
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!("flowplan serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("flowplan serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "cannot listen for Ctrl+C, shutting down");
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn plan_goal(
    State(state): State<ServeState>,
    payload: Result<Json<PlanGoalRequest>, JsonRejection>,
) -> Result<Json<PlanGoalResponse>, AppError> {
    let Json(request) = payload.map_err(AppError::rejected)?;
    if request.title.trim().is_empty() {
        return Err(AppError::bad_request("title must not be empty"));
    }

    let subtasks = local_subtasks(
        &request.title,
        &request.description,
        state.options.max_phrases,
    );
    debug!(title = %request.title, subtasks = subtasks.len(), "plan_goal served");

    Ok(Json(PlanGoalResponse {
        subtasks: subtasks
            .into_iter()
            .map(|s| RemoteSubtask {
                id: Some(s.id),
                text: s.text,
                duration_hours: Some(s.duration_hours),
                date_str: s.date.map(|d| d.to_string()),
            })
            .collect(),
        notes: Some(FALLBACK_NOTE.to_string()),
    }))
}

async fn schedule_tasks(
    State(state): State<ServeState>,
    payload: Result<Json<ScheduleRequest>, JsonRejection>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let Json(request) = payload.map_err(AppError::rejected)?;
    let calendar = state
        .options
        .calendar
        .with_work_hours(&request.work_hours)
        .map_err(|err| AppError::bad_request(err.to_string()))?;
    let options = SchedulerOptions {
        calendar,
        overflow_days: state.options.overflow_days,
    };

    let mut placed: Vec<Event> = Vec::new();
    let mut scheduled = Vec::new();
    for task in request.tasks {
        let subtask = PlanSubtask {
            id: task.id.clone(),
            text: task.title.clone(),
            duration_hours: task.duration_hours,
            date: None,
            phase: None,
        };
        let candidate = first_working_day(task.date.unwrap_or(request.start_date));
        let outcome = schedule(
            std::slice::from_ref(&subtask),
            &[candidate],
            &placed,
            &options,
            state.ids.as_ref(),
        );
        let Some(event) = outcome.events.into_iter().next() else {
            continue;
        };
        scheduled.push(ScheduledItem {
            id: task.id,
            title: task.title,
            date_str: event.date.to_string(),
            start_time: format_hour(event.start_hour),
            end_time: Some(format_hour(event.end_hour())),
            duration_hours: f64::from(event.duration),
        });
        placed.push(event);
    }

    debug!(scheduled = scheduled.len(), "schedule served");
    Ok(Json(ScheduleResponse { scheduled }))
}

async fn export_ics(
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload.map_err(AppError::rejected)?;
    let (Some(first), Some(last)) = (
        request.events.iter().map(|e| e.date).min(),
        request.events.iter().map(|e| e.date).max(),
    ) else {
        return Err(AppError::bad_request("no events to export"));
    };

    let name = request
        .calendar_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CALENDAR_NAME.to_string());
    let document = serialize(&request.events, Utc::now(), &name);
    let disposition = format!("attachment; filename=\"{}\"", export_file_name(first, last));

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document,
    )
        .into_response())
}

/// First working day on or after `date`; `date` itself when the calendar
/// runs out first.
fn first_working_day(date: NaiveDate) -> NaiveDate {
    let mut cursor = date;
    while !is_working_day(cursor) {
        let next = next_day(cursor);
        if next == cursor {
            return date;
        }
        cursor = next;
    }
    cursor
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
