//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::TcpListener;

use failover_orchestrator::admin::{setup_admin_router, AdminState};
use failover_orchestrator::config::OrchestratorConfig;
use failover_orchestrator::error::ObserverError;
use failover_orchestrator::failover::{
    BroadcastObserver, BufferedOperation, FailoverEvent, FailoverMode, FailoverObserver,
    FailoverOrchestrator, HealthSample, HealthStatus, ReplayHandler, ServiceCategory,
};
use failover_orchestrator::Shutdown;

pub const TEST_API_KEY: &str = "test-admin-key";

/// Default configuration with a small buffer and the given mode/threshold.
pub fn test_config(mode: FailoverMode, emergency_threshold: usize) -> OrchestratorConfig {
    let mut config = OrchestratorConfig::default();
    config.failover.mode = mode;
    config.failover.emergency_threshold = emergency_threshold;
    config.failover.max_buffer_size = 8;
    config.failover.monitor_interval_secs = 1;
    config.failover.error_backoff_secs = 1;
    config.observability.metrics_enabled = false;
    config
}

pub fn sample(id: &str, category: ServiceCategory, status: HealthStatus) -> HealthSample {
    HealthSample::new(id, category, status)
}

/// Observer that keeps a copy of every event it sees.
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<FailoverEvent>>,
}

impl RecordingObserver {
    pub fn seen(&self) -> Vec<FailoverEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl FailoverObserver for RecordingObserver {
    fn name(&self) -> &str {
        "recording"
    }

    fn on_event(&self, event: &FailoverEvent) -> Result<(), ObserverError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Replay handler that keeps every operation it is handed.
#[derive(Default)]
pub struct RecordingReplay {
    pub operations: Mutex<Vec<BufferedOperation>>,
}

impl RecordingReplay {
    pub fn received(&self) -> Vec<BufferedOperation> {
        self.operations.lock().unwrap().clone()
    }
}

impl ReplayHandler for RecordingReplay {
    fn replay(&self, operations: Vec<BufferedOperation>) -> Result<(), ObserverError> {
        self.operations.lock().unwrap().extend(operations);
        Ok(())
    }
}

/// Serve the admin API for `orchestrator` on an ephemeral port.
pub async fn start_admin_server(
    orchestrator: FailoverOrchestrator,
    broadcaster: &BroadcastObserver,
    shutdown: &Shutdown,
) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let state = AdminState::new(orchestrator, TEST_API_KEY, broadcaster.sender());
    let router = setup_admin_router(state, Duration::from_secs(5));
    let server_shutdown = shutdown.clone();

    tokio::spawn(async move {
        let _ = axum::serve(listener, router)
            .with_graceful_shutdown(async move { server_shutdown.wait().await })
            .await;
    });

    addr
}

/// Orchestrator wired with a broadcast observer, as the daemon does it.
pub fn wired_orchestrator(config: &OrchestratorConfig) -> (FailoverOrchestrator, BroadcastObserver) {
    let orchestrator = FailoverOrchestrator::new(config);
    let broadcaster = BroadcastObserver::new(64);
    orchestrator.register_observer(Arc::new(broadcaster.clone()));
    (orchestrator, broadcaster)
}
