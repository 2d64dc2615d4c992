use askama::Template;
use axum::{Router, extract::State, response::Response, routing::get};
use rand::SeedableRng;
use rand::rngs::StdRng;
use sea_orm::ActiveEnum;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::render::{DualRender, ResponseMode};
use crate::status::{StatusService, StatusServiceError, SystemStatus};
use crate::web::{AppState, ErrorResponse, WebError};

impl From<StatusServiceError> for WebError {
    fn from(err: StatusServiceError) -> Self {
        match err {
            StatusServiceError::Database(err) => WebError::Database(err),
        }
    }
}

/// JSON representation of one monitored service.
#[derive(Debug, Serialize, ToSchema)]
pub struct SystemStatusJson {
    service_name: String,
    /// One of operational, degraded, partial_outage, major_outage
    status: String,
    response_time_ms: i32,
    /// Uptime with two decimals, e.g. "99.95"
    uptime_percentage: String,
    message: String,
}

impl From<&SystemStatus> for SystemStatusJson {
    fn from(status: &SystemStatus) -> Self {
        Self {
            service_name: status.service_name().to_string(),
            status: status.status().to_value(),
            response_time_ms: status.response_time_ms(),
            uptime_percentage: status.uptime_display(),
            message: status.message().to_string(),
        }
    }
}

/// API response for a status poll.
#[derive(Debug, Serialize, ToSchema)]
pub struct SystemStatusResponse {
    statuses: Vec<SystemStatusJson>,
}

#[derive(Template)]
#[template(path = "partials/system_status.html")]
struct SystemStatusTemplate<'a> {
    statuses: &'a [SystemStatus],
}

/// Every service status from one poll.
#[derive(Debug)]
pub struct StatusBoard(pub Vec<SystemStatus>);

impl DualRender for StatusBoard {
    fn payload(&self) -> impl Serialize + '_ {
        SystemStatusResponse {
            statuses: self.0.iter().map(SystemStatusJson::from).collect(),
        }
    }

    fn fragment(&self) -> askama::Result<String> {
        SystemStatusTemplate { statuses: &self.0 }.render()
    }
}

/// Handler for GET /system-status.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/system-status",
    responses(
        (status = 200, description = "Every service, by name", body = SystemStatusResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "System status"
)]
pub async fn system_status_handler(mode: ResponseMode, State(state): State<Arc<AppState>>) -> Response {
    let service = StatusService::new(&state.db);
    let mut rng = StdRng::from_entropy();
    let result = service
        .poll_statuses(state.simulate_status, &mut rng)
        .await
        .map(StatusBoard);
    mode.respond(result)
}

/// Creates and returns the system status router.
pub fn create_status_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/system-status", get(system_status_handler))
        .with_state(state)
}
