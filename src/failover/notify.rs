//! Event fan-out to observers.
//!
//! # Responsibilities
//! - Deliver every failover event to each registered observer
//! - Hand flushed operations back to the subsystem that owns them
//!
//! # Design Decisions
//! - Observers are typed (`FailoverObserver`), registered explicitly
//! - A failing or panicking observer is logged and skipped; the rest still run
//! - Dispatch happens after the orchestrator lock is released

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::error::ObserverError;
use crate::failover::types::{BufferedOperation, FailoverEvent};
use crate::observability::metrics;

/// Receives failover events.
pub trait FailoverObserver: Send + Sync {
    /// Name used in logs and metric labels.
    fn name(&self) -> &str;

    fn on_event(&self, event: &FailoverEvent) -> Result<(), ObserverError>;
}

/// Takes back operations flushed from the buffer on recovery.
pub trait ReplayHandler: Send + Sync {
    fn replay(&self, operations: Vec<BufferedOperation>) -> Result<(), ObserverError>;
}

#[derive(Clone, Default)]
pub struct NotificationBus {
    observers: Vec<Arc<dyn FailoverObserver>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, observer: Arc<dyn FailoverObserver>) {
        tracing::debug!(observer = observer.name(), "Registered failover observer");
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Deliver `event` to every observer. Returns how many succeeded.
    pub fn publish(&self, event: &FailoverEvent) -> usize {
        let mut delivered = 0;
        for observer in &self.observers {
            match catch_unwind(AssertUnwindSafe(|| observer.on_event(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    tracing::warn!(observer = observer.name(), event_id = %event.id, error = %e, "Observer failed");
                    metrics::record_observer_error(observer.name());
                }
                Err(_) => {
                    tracing::error!(observer = observer.name(), event_id = %event.id, "Observer panicked");
                    metrics::record_observer_error(observer.name());
                }
            }
        }
        delivered
    }
}

/// Audit trail: writes every event to the tracing log.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl FailoverObserver for TracingObserver {
    fn name(&self) -> &str {
        "tracing"
    }

    fn on_event(&self, event: &FailoverEvent) -> Result<(), ObserverError> {
        tracing::info!(
            target: "failover_audit",
            event_id = %event.id,
            category = %event.category,
            from = ?event.from_state,
            to = ?event.to_state,
            target_endpoint = %event.fallback_target,
            auto = event.auto_triggered,
            recovery_secs = ?event.recovery_time_seconds,
            flushed = event.operations_flushed,
            reason = %event.trigger_reason,
            "Failover event"
        );
        Ok(())
    }
}

/// Forwards events to a broadcast channel (dashboard WebSocket stream).
#[derive(Debug, Clone)]
pub struct BroadcastObserver {
    tx: broadcast::Sender<FailoverEvent>,
}

impl BroadcastObserver {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FailoverEvent> {
        self.tx.subscribe()
    }

    pub fn sender(&self) -> broadcast::Sender<FailoverEvent> {
        self.tx.clone()
    }
}

impl FailoverObserver for BroadcastObserver {
    fn name(&self) -> &str {
        "broadcast"
    }

    fn on_event(&self, event: &FailoverEvent) -> Result<(), ObserverError> {
        // No subscribers is not a failure.
        let _ = self.tx.send(event.clone());
        Ok(())
    }
}
