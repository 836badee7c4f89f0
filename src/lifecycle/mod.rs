//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build orchestrator → Start monitor → Serve admin API
//!
//! Shutdown (shutdown.rs):
//!     SIGTERM/SIGINT → trigger → admin server drains → monitor stops → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then listeners
//! - Stopping the monitor keeps fallback and buffer state in memory

pub mod shutdown;

pub use shutdown::Shutdown;
