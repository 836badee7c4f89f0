//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define orchestrator metrics (failovers, recoveries, buffer pressure)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `failover_triggered_total` (counter): failure events recorded
//! - `failover_recovered_total` (counter): recoveries completed
//! - `failover_active` (gauge): currently active fallbacks
//! - `failover_state` (gauge): 0=normal 1=degraded 2=failover_active 3=recovery 4=emergency
//! - `failover_emergency_total` (counter): state recomputations at emergency level
//! - `failover_buffer_size` (gauge): operations currently buffered
//! - `failover_operations_flushed_total` (counter)
//! - `failover_operations_shed_total` (counter): operations refused by a full buffer
//! - `failover_recovery_seconds` (histogram): time spent on a fallback
//! - `failover_observer_errors_total` (counter)
//!
//! All recorders are no-ops until `init_metrics` installs the exporter.

use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::failover::types::FailoverState;

/// Install the Prometheus exporter with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_failover_triggered() {
    counter!("failover_triggered_total").increment(1);
}

pub fn record_failover_recovered() {
    counter!("failover_recovered_total").increment(1);
}

pub fn record_active_failovers(active: usize) {
    gauge!("failover_active").set(active as f64);
}

pub fn record_state(state: FailoverState) {
    gauge!("failover_state").set(state.as_gauge());
}

pub fn record_emergency() {
    counter!("failover_emergency_total").increment(1);
}

pub fn record_buffer_size(len: usize) {
    gauge!("failover_buffer_size").set(len as f64);
}

pub fn record_operations_flushed(count: usize) {
    counter!("failover_operations_flushed_total").increment(count as u64);
}

pub fn record_operation_shed() {
    counter!("failover_operations_shed_total").increment(1);
}

pub fn record_recovery_time(seconds: f64) {
    histogram!("failover_recovery_seconds").record(seconds);
}

pub fn record_observer_error(observer: &str) {
    counter!("failover_observer_errors_total", "observer" => observer.to_string()).increment(1);
}
