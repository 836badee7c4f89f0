//! Supervisory monitor loop.
//!
//! # Responsibilities
//! - Wake on a fixed interval and reconcile orchestrator state
//! - Survive failing iterations (errors and panics) with a fixed backoff
//! - Exit only on explicit shutdown
//!
//! Recovery itself is edge-triggered by incoming health samples; this loop
//! is the heartbeat and the place for periodic checks.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::failover::orchestrator::FailoverOrchestrator;
use crate::lifecycle::Shutdown;

const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Running monitor task plus the signal that stops it.
pub(crate) struct MonitorHandle {
    shutdown: Shutdown,
    task: JoinHandle<()>,
}

pub struct FailoverMonitor {
    orchestrator: FailoverOrchestrator,
    interval: Duration,
    backoff: Duration,
}

impl FailoverMonitor {
    /// Intervals below `MIN_INTERVAL` are raised to it.
    pub fn new(orchestrator: FailoverOrchestrator, interval: Duration, backoff: Duration) -> Self {
        if interval < MIN_INTERVAL {
            tracing::warn!(min_secs = MIN_INTERVAL.as_secs(), "Monitor interval too short, using minimum");
        }
        Self {
            orchestrator,
            interval: interval.max(MIN_INTERVAL),
            backoff,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            backoff_secs = self.backoff.as_secs(),
            "Failover monitor starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.run_iteration() {
                        continue;
                    }
                    let stop = tokio::select! {
                        _ = time::sleep(self.backoff) => false,
                        _ = shutdown.recv() => true,
                    };
                    if stop {
                        break;
                    }
                }
                _ = shutdown.recv() => {
                    break;
                }
            }
        }

        tracing::info!("Failover monitor stopped");
    }

    /// Returns false if the iteration failed.
    fn run_iteration(&self) -> bool {
        match catch_unwind(AssertUnwindSafe(|| self.orchestrator.reconcile())) {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, backoff_secs = self.backoff.as_secs(), "Monitor iteration failed");
                false
            }
            Err(_) => {
                tracing::error!(backoff_secs = self.backoff.as_secs(), "Monitor iteration panicked");
                false
            }
        }
    }
}

impl FailoverOrchestrator {
    /// Spawn the monitor loop. No-op if it is already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        let mut slot = self.monitor_slot();
        if slot.as_ref().is_some_and(|h| !h.task.is_finished()) {
            tracing::debug!("Failover monitor already running");
            return;
        }

        let (interval_secs, backoff_secs) = self.monitor_settings();
        let monitor = FailoverMonitor::new(
            self.clone(),
            Duration::from_secs(interval_secs),
            Duration::from_secs(backoff_secs),
        );

        let shutdown = Shutdown::new();
        let rx = shutdown.subscribe();
        let task = tokio::spawn(monitor.run(rx));
        *slot = Some(MonitorHandle { shutdown, task });
    }

    /// Stop the monitor loop and wait for it to exit.
    ///
    /// Fallback activations and buffered operations are kept.
    pub async fn stop(&self) {
        let handle = self.monitor_slot().take();
        if let Some(MonitorHandle { shutdown, task }) = handle {
            shutdown.trigger();
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Failover monitor task ended abnormally");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.monitor_slot().as_ref().is_some_and(|h| !h.task.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestratorConfig;
    use crate::failover::types::ServiceCategory;

    fn fast_config() -> OrchestratorConfig {
        let mut config = OrchestratorConfig::default();
        config.failover.monitor_interval_secs = 1;
        config.failover.error_backoff_secs = 1;
        config
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let orch = FailoverOrchestrator::new(&fast_config());
        assert!(!orch.is_running());

        orch.start();
        assert!(orch.is_running());
        orch.start();

        tokio::time::timeout(Duration::from_secs(2), orch.stop())
            .await
            .expect("stop should complete promptly");
        assert!(!orch.is_running());
    }

    #[tokio::test]
    async fn test_survives_failed_iteration() {
        let orch = FailoverOrchestrator::new(&fast_config());
        orch.manual_failover(ServiceCategory::Redis, "maintenance").unwrap();
        orch.core().metrics.current_active_failovers = 9;

        orch.start();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(orch.is_running());
        assert_eq!(orch.metrics().current_active_failovers, 1);

        orch.stop().await;
    }

    #[tokio::test]
    async fn test_zero_interval_is_clamped() {
        let mut config = fast_config();
        config.failover.monitor_interval_secs = 0;
        let orch = FailoverOrchestrator::new(&config);

        let monitor = FailoverMonitor::new(orch.clone(), Duration::ZERO, Duration::ZERO);
        assert_eq!(monitor.interval, MIN_INTERVAL);

        orch.start();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(orch.is_running());
        orch.stop().await;
    }

    #[tokio::test]
    async fn test_state_retained_across_restart() {
        let orch = FailoverOrchestrator::new(&fast_config());
        orch.start();
        orch.manual_failover(ServiceCategory::GraphStore, "drill").unwrap();
        assert!(orch.buffer_operation(ServiceCategory::GraphStore, serde_json::json!({"q": 1})));

        orch.stop().await;
        orch.start();

        assert!(orch.fallback_status(ServiceCategory::GraphStore).unwrap().is_active);
        assert_eq!(orch.buffer_len(), 1);
        orch.stop().await;
    }
}
