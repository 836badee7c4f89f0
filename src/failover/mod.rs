//! Failover orchestration subsystem.
//!
//! # Data Flow
//! ```text
//! Health sample (external probe)
//!     → orchestrator.rs (transition detection per instance)
//!     → registry.rs (fallback lookup)
//!     → buffer.rs (flush on recovery)
//!     → events.rs (append to history)
//!     → metrics.rs (counters, recovery-time average)
//!     → state.rs (derive global state)
//!     → notify.rs (fan out to observers, hand back flushed operations)
//!
//! monitor.rs:
//!     Periodic timer → reconcile counters → heartbeat
//! ```
//!
//! # State Machine (per category)
//! ```text
//! Inactive → Active:   failure sample (automatic mode) or manual failover
//! Active → Inactive:   healthy sample after failure (auto-recovery) or manual recovery
//! ```
//!
//! # Design Decisions
//! - One state bundle under one lock; no mutation ever spans an await
//! - Repeated identical samples for an instance are dropped before any work
//! - Outages and backpressure are state, not errors

pub mod buffer;
pub mod events;
pub mod metrics;
pub mod monitor;
pub mod notify;
pub mod orchestrator;
pub mod registry;
pub mod state;
pub mod types;

pub use metrics::FailoverMetrics;
pub use monitor::FailoverMonitor;
pub use notify::{BroadcastObserver, FailoverObserver, ReplayHandler, TracingObserver};
pub use orchestrator::{FailoverOrchestrator, FailoverStatus};
pub use types::{
    BufferedOperation, FailoverEvent, FailoverMode, FailoverState, HealthSample, HealthStatus,
    ServiceCategory, ServiceFallback,
};
