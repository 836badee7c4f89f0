//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → OrchestratorConfig (validated, immutable)
//!     → FallbackRegistry built once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; fallback wiring lives for the process lifetime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::AdminConfig;
pub use schema::CategoryConfig;
pub use schema::FailoverConfig;
pub use schema::ObservabilityConfig;
pub use schema::OrchestratorConfig;
