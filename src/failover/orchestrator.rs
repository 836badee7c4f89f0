//! Failover state machine.
//!
//! # Responsibilities
//! - Ingest health samples and detect status transitions per instance
//! - Activate fallbacks on failure, deactivate and flush on recovery
//! - Keep registry, buffer, event log and metrics consistent
//! - Derive the global state after every activation change
//!
//! # Concurrency
//! All mutable state is one `FailoverCore` behind a single mutex. Every
//! operation runs to completion under the lock and never awaits while
//! holding it. Events and flushed operations are queued under the lock and
//! dispatched to observers and replay handlers after it is released, so
//! observers may safely call back into the orchestrator. Only one thread
//! drains the queue at a time, so observers see events in log order.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{FailoverConfig, OrchestratorConfig};
use crate::error::{FailoverError, FailoverResult};
use crate::failover::buffer::OperationBuffer;
use crate::failover::events::EventLog;
use crate::failover::metrics::FailoverMetrics;
use crate::failover::monitor::MonitorHandle;
use crate::failover::notify::{FailoverObserver, NotificationBus, ReplayHandler};
use crate::failover::registry::FallbackRegistry;
use crate::failover::state::derive_state;
use crate::failover::types::{
    unix_now, BufferedOperation, FailoverEvent, FailoverMode, FailoverState, HealthSample,
    HealthStatus, ServiceCategory, ServiceFallback,
};
use crate::observability::metrics as prom;

/// Aggregate status snapshot for operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailoverStatus {
    pub enabled: bool,
    pub mode: FailoverMode,
    pub state: FailoverState,
    pub active_fallbacks: Vec<ServiceCategory>,
    pub registered_fallbacks: usize,
    pub buffered_operations: usize,
    pub buffer_capacity: usize,
    pub monitor_running: bool,
    pub metrics: FailoverMetrics,
}

/// Outcome of one activation or deactivation.
#[derive(Debug)]
pub(crate) struct Transition {
    pub event: FailoverEvent,
    pub released: Vec<BufferedOperation>,
}

/// The state bundle guarded by the orchestrator lock.
#[derive(Debug)]
pub(crate) struct FailoverCore {
    pub(crate) config: FailoverConfig,
    pub(crate) registry: FallbackRegistry,
    pub(crate) buffer: OperationBuffer,
    pub(crate) events: EventLog,
    pub(crate) metrics: FailoverMetrics,
    pub(crate) state: FailoverState,
    last_status: HashMap<String, HealthStatus>,
}

impl FailoverCore {
    fn new(config: &OrchestratorConfig) -> Self {
        Self {
            config: config.failover.clone(),
            registry: FallbackRegistry::from_config(config),
            buffer: OperationBuffer::new(config.failover.max_buffer_size),
            events: EventLog::new(config.failover.event_history_limit),
            metrics: FailoverMetrics::default(),
            state: FailoverState::Normal,
            last_status: HashMap::new(),
        }
    }

    fn ingestion_enabled(&self) -> bool {
        self.config.enabled && self.config.mode != FailoverMode::Disabled
    }

    fn process_health_update(&mut self, sample: &HealthSample) -> Option<Transition> {
        if !self.ingestion_enabled() {
            return None;
        }

        let previous = self.last_status.insert(sample.instance_id.clone(), sample.status);
        if previous == Some(sample.status) {
            return None;
        }

        tracing::debug!(
            instance = %sample.instance_id,
            category = %sample.category,
            previous = ?previous,
            current = ?sample.status,
            "Health status changed"
        );

        if let Some(fallback) = self.registry.lookup(sample.category) {
            if fallback.mode == FailoverMode::Disabled {
                tracing::debug!(category = %sample.category, "Failover disabled for category, ignoring");
                return None;
            }
        }

        match sample.status {
            HealthStatus::Unhealthy | HealthStatus::Offline => {
                let reason = sample.error_message.clone().unwrap_or_else(|| {
                    format!("{} reported {}", sample.instance_name, sample.status.as_str())
                });
                self.trigger_failover(sample.category, reason, false)
            }
            HealthStatus::Healthy if previous.is_some_and(|p| p.is_failure()) => {
                if !self.config.auto_recovery_enabled {
                    tracing::info!(
                        instance = %sample.instance_id,
                        category = %sample.category,
                        "Dependency healthy again, auto-recovery disabled"
                    );
                    return None;
                }
                let reason = format!("{} recovered", sample.instance_name);
                self.recover(sample.category, reason, true)
            }
            HealthStatus::Degraded if self.state == FailoverState::Normal => {
                tracing::info!(instance = %sample.instance_id, category = %sample.category, "Dependency degraded");
                self.state = FailoverState::Degraded;
                prom::record_state(self.state);
                None
            }
            _ => None,
        }
    }

    /// Failure path. `manual` bypasses the configured mode and always activates.
    fn trigger_failover(
        &mut self,
        category: ServiceCategory,
        reason: String,
        manual: bool,
    ) -> Option<Transition> {
        let now = unix_now();
        let from_state = self.state;

        let Some(fallback) = self.registry.lookup_mut(category) else {
            tracing::warn!(category = %category, reason = %reason, "No fallback registered, nothing to fail over to");
            return None;
        };

        if fallback.is_active {
            return None;
        }

        let automatic = fallback.mode == FailoverMode::Automatic;
        let event = FailoverEvent {
            id: Uuid::new_v4(),
            category,
            from_state,
            to_state: FailoverState::FailoverActive,
            trigger_reason: reason,
            fallback_target: fallback.fallback_target.clone(),
            auto_triggered: !manual && automatic,
            recovery_time_seconds: None,
            operations_flushed: 0,
            timestamp: now,
        };

        let activate = manual || automatic;
        if activate {
            fallback.activate(now);
            self.metrics.record_activation();
            tracing::warn!(
                category = %category,
                fallback = %event.fallback_target,
                reason = %event.trigger_reason,
                manual,
                "Fallback activated"
            );
        } else {
            tracing::warn!(
                category = %category,
                fallback = %event.fallback_target,
                reason = %event.trigger_reason,
                "Failover pending operator approval"
            );
        }

        self.events.append(event.clone());
        self.metrics.record_trigger(now);
        self.recompute_state();

        Some(Transition { event, released: Vec::new() })
    }

    /// Recovery path. No-op unless the category's fallback is active.
    fn recover(&mut self, category: ServiceCategory, reason: String, auto: bool) -> Option<Transition> {
        let now = unix_now();
        let from_state = self.state;

        let fallback = self.registry.lookup_mut(category)?;
        if !fallback.is_active {
            return None;
        }

        let primary_target = fallback.primary_target.clone();
        let recovery_time = fallback.deactivate().map(|since| (now - since).max(0.0));
        self.metrics.record_deactivation();

        let released = self.flush(category);

        let event = FailoverEvent {
            id: Uuid::new_v4(),
            category,
            from_state,
            to_state: FailoverState::Recovery,
            trigger_reason: reason,
            fallback_target: primary_target,
            auto_triggered: auto,
            recovery_time_seconds: recovery_time,
            operations_flushed: released.len(),
            timestamp: now,
        };

        tracing::info!(
            category = %category,
            primary = %event.fallback_target,
            recovery_secs = ?recovery_time,
            flushed = released.len(),
            "Fallback deactivated, routing back to primary"
        );

        self.events.append(event.clone());
        self.metrics.record_recovery(recovery_time, now);
        self.recompute_state();

        Some(Transition { event, released })
    }

    fn buffer_operation(&mut self, category: ServiceCategory, payload: serde_json::Value) -> bool {
        let Some(fallback) = self.registry.lookup_mut(category) else {
            return false;
        };
        if !fallback.is_active {
            return false;
        }

        if !self.buffer.push(BufferedOperation::new(category, payload)) {
            tracing::warn!(
                category = %category,
                capacity = self.buffer.capacity(),
                "Operation buffer full, shedding operation"
            );
            self.metrics.record_shed();
            return false;
        }

        fallback.buffered_operations += 1;
        self.metrics.record_buffered(self.buffer.len());
        true
    }

    fn flush(&mut self, category: ServiceCategory) -> Vec<BufferedOperation> {
        let released = self.buffer.flush(category);
        if let Some(fallback) = self.registry.lookup_mut(category) {
            fallback.buffered_operations = 0;
        }
        if !released.is_empty() {
            tracing::info!(category = %category, count = released.len(), "Flushed buffered operations");
        }
        self.metrics.record_flushed(released.len(), self.buffer.len());
        released
    }

    fn recompute_state(&mut self) {
        let active = self.registry.active_count();
        let next = derive_state(active, self.config.emergency_threshold);

        if next == FailoverState::Emergency && self.state != FailoverState::Emergency {
            tracing::error!(
                active,
                threshold = self.config.emergency_threshold,
                categories = ?self.registry.active_categories(),
                "Emergency: too many dependencies on fallback"
            );
        }

        self.state = next;
        self.metrics.record_state(next);
    }

    /// Supervisory check: repair counters that drifted from the registry.
    fn reconcile(&mut self) -> FailoverResult<()> {
        let actual = self.registry.active_count();
        let reported = self.metrics.current_active_failovers;

        let categories: Vec<ServiceCategory> = self.registry.all().keys().copied().collect();
        for category in categories {
            let held = self.buffer.count_for(category);
            if let Some(fallback) = self.registry.lookup_mut(category) {
                if fallback.buffered_operations != held {
                    tracing::warn!(
                        category = %category,
                        recorded = fallback.buffered_operations,
                        held,
                        "Buffered operation count drifted, correcting"
                    );
                    fallback.buffered_operations = held;
                }
            }
        }

        prom::record_buffer_size(self.buffer.len());
        prom::record_state(self.state);

        if reported != actual {
            self.metrics.correct_active(actual);
            return Err(FailoverError::StateDrift { reported, actual });
        }
        prom::record_active_failovers(actual);

        tracing::debug!(
            state = ?self.state,
            active = actual,
            buffered = self.buffer.len(),
            "Failover monitor heartbeat"
        );
        Ok(())
    }
}

/// Transitions waiting for delivery, in the order they were logged.
#[derive(Default)]
struct DispatchQueue {
    pending: VecDeque<Transition>,
    draining: bool,
}

struct Inner {
    core: Mutex<FailoverCore>,
    dispatch: Mutex<DispatchQueue>,
    observers: RwLock<NotificationBus>,
    replay_handlers: RwLock<HashMap<ServiceCategory, Arc<dyn ReplayHandler>>>,
    monitor: Mutex<Option<MonitorHandle>>,
}

/// Cheaply clonable handle to the failover orchestrator.
///
/// Construct one per process and pass clones to whatever needs it.
#[derive(Clone)]
pub struct FailoverOrchestrator {
    inner: Arc<Inner>,
}

impl FailoverOrchestrator {
    pub fn new(config: &OrchestratorConfig) -> Self {
        let core = FailoverCore::new(config);
        tracing::info!(
            enabled = core.config.enabled,
            mode = ?core.config.mode,
            fallbacks = core.registry.len(),
            max_buffer_size = core.config.max_buffer_size,
            emergency_threshold = core.config.emergency_threshold,
            "Failover orchestrator initialized"
        );

        Self {
            inner: Arc::new(Inner {
                core: Mutex::new(core),
                dispatch: Mutex::new(DispatchQueue::default()),
                observers: RwLock::new(NotificationBus::new()),
                replay_handlers: RwLock::new(HashMap::new()),
                monitor: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn core(&self) -> MutexGuard<'_, FailoverCore> {
        self.inner.core.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Failover state lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub(crate) fn monitor_slot(&self) -> MutexGuard<'_, Option<MonitorHandle>> {
        self.inner.monitor.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn register_observer(&self, observer: Arc<dyn FailoverObserver>) {
        let mut bus = self.inner.observers.write().unwrap_or_else(|p| p.into_inner());
        bus.register(observer);
    }

    /// Route operations flushed for `category` back to their owning subsystem.
    pub fn register_replay_handler(&self, category: ServiceCategory, handler: Arc<dyn ReplayHandler>) {
        let mut handlers = self.inner.replay_handlers.write().unwrap_or_else(|p| p.into_inner());
        handlers.insert(category, handler);
    }

    /// Ingest one health sample. Returns the event it produced, if any.
    pub fn process_health_update(&self, sample: &HealthSample) -> Option<FailoverEvent> {
        let mut core = self.core();
        let transition = core.process_health_update(sample);
        self.commit(core, transition)
    }

    /// Buffer an operation for later replay.
    ///
    /// Returns false when the category has no active fallback or the buffer
    /// is full; the caller must then handle the operation itself.
    pub fn buffer_operation(&self, category: ServiceCategory, payload: serde_json::Value) -> bool {
        self.core().buffer_operation(category, payload)
    }

    /// Release every buffered operation for `category`. Returns the count.
    pub fn flush_buffer(&self, category: ServiceCategory) -> usize {
        let released = self.core().flush(category);
        let count = released.len();
        self.replay(category, released);
        count
    }

    /// Operator-initiated failover, honoured regardless of the configured mode.
    pub fn manual_failover(&self, category: ServiceCategory, reason: &str) -> FailoverResult<Option<FailoverEvent>> {
        let mut core = self.core();
        if core.registry.lookup(category).is_none() {
            return Err(FailoverError::UnknownCategory(category));
        }
        let transition = core.trigger_failover(category, reason.to_string(), true);
        Ok(self.commit(core, transition))
    }

    /// Operator-initiated recovery, honoured regardless of the configured mode.
    pub fn manual_recovery(&self, category: ServiceCategory, reason: &str) -> FailoverResult<Option<FailoverEvent>> {
        let mut core = self.core();
        if core.registry.lookup(category).is_none() {
            return Err(FailoverError::UnknownCategory(category));
        }
        let transition = core.recover(category, reason.to_string(), false);
        Ok(self.commit(core, transition))
    }

    pub fn fallback_status(&self, category: ServiceCategory) -> Option<ServiceFallback> {
        self.core().registry.lookup(category).cloned()
    }

    pub fn all_fallbacks(&self) -> BTreeMap<ServiceCategory, ServiceFallback> {
        self.core().registry.all().clone()
    }

    /// The newest `limit` events, oldest first.
    pub fn recent_events(&self, limit: usize) -> Vec<FailoverEvent> {
        self.core().events.recent(limit)
    }

    pub fn metrics(&self) -> FailoverMetrics {
        self.core().metrics.clone()
    }

    pub fn state(&self) -> FailoverState {
        self.core().state
    }

    pub fn buffer_len(&self) -> usize {
        self.core().buffer.len()
    }

    pub fn status(&self) -> FailoverStatus {
        let monitor_running = self.is_running();
        let core = self.core();
        FailoverStatus {
            enabled: core.config.enabled,
            mode: core.config.mode,
            state: core.state,
            active_fallbacks: core.registry.active_categories(),
            registered_fallbacks: core.registry.len(),
            buffered_operations: core.buffer.len(),
            buffer_capacity: core.buffer.capacity(),
            monitor_running,
            metrics: core.metrics.clone(),
        }
    }

    /// One supervisory pass; run periodically by the monitor loop.
    pub fn reconcile(&self) -> FailoverResult<()> {
        self.core().reconcile()
    }

    /// Number of events the history retains.
    pub fn event_history_limit(&self) -> usize {
        self.core().config.event_history_limit
    }

    pub(crate) fn monitor_settings(&self) -> (u64, u64) {
        let core = self.core();
        (core.config.monitor_interval_secs, core.config.error_backoff_secs)
    }

    fn dispatch_queue(&self) -> MutexGuard<'_, DispatchQueue> {
        self.inner.dispatch.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue `transition` while `core` is still held, then release the lock
    /// and deliver everything pending.
    fn commit(
        &self,
        core: MutexGuard<'_, FailoverCore>,
        transition: Option<Transition>,
    ) -> Option<FailoverEvent> {
        let event = transition.as_ref().map(|t| t.event.clone());
        if let Some(transition) = transition {
            self.dispatch_queue().pending.push_back(transition);
        }
        drop(core);

        if event.is_some() {
            self.drain();
        }
        event
    }

    /// Deliver queued transitions in order. A thread that finds another
    /// drain in progress (including a reentrant observer) leaves its
    /// transition to that drain.
    fn drain(&self) {
        {
            let mut queue = self.dispatch_queue();
            if queue.draining {
                return;
            }
            queue.draining = true;
        }

        loop {
            let next = {
                let mut queue = self.dispatch_queue();
                let next = queue.pending.pop_front();
                if next.is_none() {
                    queue.draining = false;
                }
                next
            };
            match next {
                Some(transition) => self.deliver(transition),
                None => return,
            }
        }
    }

    /// Fan out an event and hand released operations back. Called without the core lock.
    fn deliver(&self, transition: Transition) {
        let Transition { event, released } = transition;

        if !released.is_empty() {
            self.replay(event.category, released);
        }

        let bus = self.inner.observers.read().unwrap_or_else(|p| p.into_inner()).clone();
        bus.publish(&event);
    }

    fn replay(&self, category: ServiceCategory, operations: Vec<BufferedOperation>) {
        if operations.is_empty() {
            return;
        }

        let handler = self
            .inner
            .replay_handlers
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(&category)
            .cloned();

        match handler {
            Some(handler) => {
                let count = operations.len();
                let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler.replay(operations)));
                match outcome {
                    Ok(Ok(())) => tracing::debug!(category = %category, count, "Released operations for replay"),
                    Ok(Err(e)) => tracing::warn!(category = %category, count, error = %e, "Replay handler failed"),
                    Err(_) => tracing::error!(category = %category, count, "Replay handler panicked"),
                }
            }
            None => {
                tracing::debug!(
                    category = %category,
                    count = operations.len(),
                    "No replay handler registered, dropping released operations"
                );
            }
        }
    }
}

impl std::fmt::Debug for FailoverOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.core();
        f.debug_struct("FailoverOrchestrator")
            .field("state", &core.state)
            .field("active", &core.registry.active_count())
            .field("buffered", &core.buffer.len())
            .finish()
    }
}
