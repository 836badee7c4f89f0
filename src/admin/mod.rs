//! Admin API.
//!
//! Read-only views over the orchestrator, the manual failover controls
//! and a live event stream, all behind a bearer token.

pub mod auth;
pub mod handlers;
pub mod stream;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use self::stream::stream_events;
use crate::failover::{FailoverEvent, FailoverOrchestrator};

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub orchestrator: FailoverOrchestrator,
    pub api_key: Arc<str>,
    /// Source for the WebSocket event stream.
    pub events: broadcast::Sender<FailoverEvent>,
}

impl AdminState {
    pub fn new(
        orchestrator: FailoverOrchestrator,
        api_key: impl Into<Arc<str>>,
        events: broadcast::Sender<FailoverEvent>,
    ) -> Self {
        Self {
            orchestrator,
            api_key: api_key.into(),
            events,
        }
    }
}

#[allow(deprecated)]
pub fn setup_admin_router(state: AdminState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/metrics", get(get_metrics))
        .route("/admin/fallbacks", get(get_fallbacks))
        .route("/admin/fallbacks/{category}", get(get_fallback))
        .route("/admin/fallbacks/{category}/failover", post(post_failover))
        .route("/admin/fallbacks/{category}/recover", post(post_recover))
        .route("/admin/events", get(get_events))
        .route("/admin/events/stream", get(stream_events))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
