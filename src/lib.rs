//! Failover and fallback orchestration for downstream dependencies.

pub mod admin;
pub mod config;
pub mod error;
pub mod failover;
pub mod lifecycle;
pub mod observability;

pub use config::schema::OrchestratorConfig;
pub use error::{FailoverError, FailoverResult};
pub use failover::FailoverOrchestrator;
pub use lifecycle::Shutdown;
