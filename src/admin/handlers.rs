use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::error::FailoverError;
use crate::failover::{FailoverEvent, FailoverMetrics, FailoverStatus, ServiceCategory, ServiceFallback};

const DEFAULT_EVENT_LIMIT: usize = 50;

/// JSON error body returned by every admin endpoint.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
}

impl From<FailoverError> for ApiError {
    fn from(err: FailoverError) -> Self {
        match err {
            FailoverError::UnknownCategory(_) => ApiError::NotFound(err.to_string()),
            _ => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    #[serde(flatten)]
    pub status: FailoverStatus,
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub limit: Option<usize>,
}

/// Optional body for the manual endpoints. An empty request uses a default reason.
#[derive(Debug, Deserialize, Serialize)]
pub struct ManualRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ManualResponse {
    /// False when the fallback was already in the requested state.
    pub changed: bool,
    pub event: Option<FailoverEvent>,
}

fn manual_reason(body: Option<Json<ManualRequest>>) -> Option<String> {
    body.and_then(|Json(request)| request.reason)
}

fn parse_category(raw: &str) -> Result<ServiceCategory, ApiError> {
    raw.parse::<ServiceCategory>().map_err(ApiError::from)
}

pub async fn get_status(State(state): State<AdminState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        status: state.orchestrator.status(),
    })
}

pub async fn get_metrics(State(state): State<AdminState>) -> Json<FailoverMetrics> {
    Json(state.orchestrator.metrics())
}

pub async fn get_fallbacks(
    State(state): State<AdminState>,
) -> Json<BTreeMap<ServiceCategory, ServiceFallback>> {
    Json(state.orchestrator.all_fallbacks())
}

pub async fn get_fallback(
    State(state): State<AdminState>,
    Path(category): Path<String>,
) -> Result<Json<ServiceFallback>, ApiError> {
    let category = parse_category(&category)?;
    state
        .orchestrator
        .fallback_status(category)
        .map(Json)
        .ok_or_else(|| FailoverError::UnknownCategory(category).into())
}

pub async fn get_events(
    State(state): State<AdminState>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<FailoverEvent>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_EVENT_LIMIT)
        .min(state.orchestrator.event_history_limit());
    Json(state.orchestrator.recent_events(limit))
}

pub async fn post_failover(
    State(state): State<AdminState>,
    Path(category): Path<String>,
    body: Option<Json<ManualRequest>>,
) -> Result<Json<ManualResponse>, ApiError> {
    let category = parse_category(&category)?;
    let reason = manual_reason(body).unwrap_or_else(|| "manual failover via admin API".to_string());

    tracing::info!(category = %category, reason = %reason, "Admin requested failover");
    let event = state.orchestrator.manual_failover(category, &reason)?;
    Ok(Json(ManualResponse { changed: event.is_some(), event }))
}

pub async fn post_recover(
    State(state): State<AdminState>,
    Path(category): Path<String>,
    body: Option<Json<ManualRequest>>,
) -> Result<Json<ManualResponse>, ApiError> {
    let category = parse_category(&category)?;
    let reason = manual_reason(body).unwrap_or_else(|| "manual recovery via admin API".to_string());

    tracing::info!(category = %category, reason = %reason, "Admin requested recovery");
    let event = state.orchestrator.manual_recovery(category, &reason)?;
    Ok(Json(ManualResponse { changed: event.is_some(), event }))
}
