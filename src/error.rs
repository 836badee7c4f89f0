//! Domain error definitions.

use thiserror::Error;

use crate::failover::types::ServiceCategory;

/// Errors raised synchronously to callers of the orchestrator.
///
/// Environmental conditions (an outage, a full buffer) are never errors; they
/// surface as state or boolean return values instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FailoverError {
    /// No fallback is registered for the category.
    #[error("No fallback registered for category '{0}'")]
    UnknownCategory(ServiceCategory),

    /// A category name could not be parsed.
    #[error("Invalid service category: {0}")]
    InvalidCategory(String),

    /// The supervisory reconciliation found (and repaired) drifted state.
    #[error("State drift: metrics reported {reported} active failovers, registry has {actual}")]
    StateDrift { reported: usize, actual: usize },
}

/// Result type for orchestrator operations.
pub type FailoverResult<T> = Result<T, FailoverError>;

/// Error returned by a failing observer or replay handler.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ObserverError(pub String);

impl ObserverError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}
