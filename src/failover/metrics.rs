//! Failover metrics aggregation.
//!
//! Counters live here as plain fields so snapshots can be served to the
//! admin API; every update is mirrored to the Prometheus recorder through
//! `observability::metrics`.

use serde::{Deserialize, Serialize};

use crate::failover::types::FailoverState;
use crate::observability::metrics as prom;

/// Weight kept by the recovery-time moving average on each new sample.
const RECOVERY_EMA_DECAY: f64 = 0.9;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailoverMetrics {
    pub total_failovers_triggered: u64,
    pub total_recoveries: u64,
    pub current_active_failovers: usize,
    pub operations_buffered: u64,
    pub operations_flushed: u64,
    pub operations_shed: u64,
    pub emergency_events: u64,
    /// Exponential moving average of recovery time in seconds.
    pub average_recovery_time_seconds: Option<f64>,
    pub last_event_at: Option<f64>,
}

impl FailoverMetrics {
    pub(crate) fn record_trigger(&mut self, now: f64) {
        self.total_failovers_triggered += 1;
        self.last_event_at = Some(now);
        prom::record_failover_triggered();
    }

    pub(crate) fn record_activation(&mut self) {
        self.current_active_failovers += 1;
        prom::record_active_failovers(self.current_active_failovers);
    }

    pub(crate) fn record_deactivation(&mut self) {
        self.current_active_failovers = self.current_active_failovers.saturating_sub(1);
        prom::record_active_failovers(self.current_active_failovers);
    }

    pub(crate) fn record_recovery(&mut self, recovery_time: Option<f64>, now: f64) {
        self.total_recoveries += 1;
        self.last_event_at = Some(now);
        prom::record_failover_recovered();

        if let Some(sample) = recovery_time {
            self.average_recovery_time_seconds = Some(match self.average_recovery_time_seconds {
                None => sample,
                Some(avg) => avg * RECOVERY_EMA_DECAY + sample * (1.0 - RECOVERY_EMA_DECAY),
            });
            prom::record_recovery_time(sample);
        }
    }

    pub(crate) fn record_buffered(&mut self, buffer_len: usize) {
        self.operations_buffered += 1;
        prom::record_buffer_size(buffer_len);
    }

    pub(crate) fn record_shed(&mut self) {
        self.operations_shed += 1;
        prom::record_operation_shed();
    }

    pub(crate) fn record_flushed(&mut self, count: usize, buffer_len: usize) {
        self.operations_flushed += count as u64;
        prom::record_operations_flushed(count);
        prom::record_buffer_size(buffer_len);
    }

    pub(crate) fn record_state(&mut self, state: FailoverState) {
        if state == FailoverState::Emergency {
            self.emergency_events += 1;
            prom::record_emergency();
        }
        prom::record_state(state);
    }

    /// Overwrite the active gauge after reconciliation.
    pub(crate) fn correct_active(&mut self, actual: usize) {
        self.current_active_failovers = actual;
        prom::record_active_failovers(actual);
    }
}
