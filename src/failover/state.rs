//! Global state derivation.
//!
//! # State Derivation
//! ```text
//! active == 0                    → Normal
//! 0 < active < threshold         → FailoverActive
//! active >= threshold            → Emergency
//! ```
//!
//! Degraded is set directly by ingestion (informational only) and is
//! overwritten by the next derivation.

use crate::failover::types::FailoverState;

/// Derive the global state from the number of active fallbacks.
pub fn derive_state(active: usize, emergency_threshold: usize) -> FailoverState {
    if active == 0 {
        FailoverState::Normal
    } else if active >= emergency_threshold {
        FailoverState::Emergency
    } else {
        FailoverState::FailoverActive
    }
}
