//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the orchestrator.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::failover::types::{FailoverMode, ServiceCategory};

/// Root configuration for the failover orchestrator.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Global failover policy and tuning.
    pub failover: FailoverConfig,

    /// Fallback wiring, one entry per dependency category.
    pub categories: Vec<CategoryConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            failover: FailoverConfig::default(),
            categories: default_categories(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

/// Global failover policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FailoverConfig {
    /// Master switch. When false, health samples are ignored.
    pub enabled: bool,

    /// Default mode for every category without an override.
    pub mode: FailoverMode,

    /// Seconds a dependency must be failing before the probe reports it.
    /// Consumed by the external probe; carried here so both share one file.
    pub detection_threshold_secs: u64,

    /// Monitor loop interval in seconds.
    pub monitor_interval_secs: u64,

    /// Sleep after a failed monitor iteration, in seconds.
    pub error_backoff_secs: u64,

    /// Maximum operations held across all categories.
    pub max_buffer_size: usize,

    /// Declared batch size for buffer flushes. Flushes currently release
    /// the whole matching subset at once.
    pub buffer_flush_batch_size: usize,

    /// Run the recovery path automatically when a dependency turns healthy.
    pub auto_recovery_enabled: bool,

    /// Active fallbacks at or above this count put the system in emergency.
    pub emergency_threshold: usize,

    /// Number of failover events retained in history.
    pub event_history_limit: usize,

    /// Named notification destinations for the external notifier.
    pub notification_channels: Vec<String>,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: FailoverMode::Automatic,
            detection_threshold_secs: 30,
            monitor_interval_secs: 10,
            error_backoff_secs: 5,
            max_buffer_size: 10_000,
            buffer_flush_batch_size: 100,
            auto_recovery_enabled: true,
            emergency_threshold: 3,
            event_history_limit: 1_000,
            notification_channels: vec!["log".to_string(), "websocket".to_string()],
        }
    }
}

/// Fallback wiring for a single dependency category.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryConfig {
    /// Dependency category (e.g., "redis", "graph_store").
    pub category: ServiceCategory,

    /// Register a fallback for this category (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Per-category mode override.
    #[serde(default)]
    pub mode: Option<FailoverMode>,

    /// Primary endpoint traffic is routed back to on recovery.
    pub primary_target: String,

    /// Secondary endpoint used while the primary is unhealthy.
    pub fallback_target: String,
}

impl CategoryConfig {
    pub fn new(
        category: ServiceCategory,
        primary_target: impl Into<String>,
        fallback_target: impl Into<String>,
    ) -> Self {
        Self {
            category,
            enabled: true,
            mode: None,
            primary_target: primary_target.into(),
            fallback_target: fallback_target.into(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_categories() -> Vec<CategoryConfig> {
    vec![
        CategoryConfig::new(ServiceCategory::Redis, "redis_primary", "in_memory_cache"),
        CategoryConfig::new(ServiceCategory::GraphStore, "graph_store_primary", "graph_snapshot"),
        CategoryConfig::new(ServiceCategory::SearchIndex, "search_index_primary", "basic_text_search"),
        CategoryConfig::new(ServiceCategory::MessageBroker, "message_broker_primary", "local_queue"),
        CategoryConfig::new(ServiceCategory::SubEngine, "sub_engine_primary", "cached_results"),
        CategoryConfig::new(ServiceCategory::FederalFeed, "federal_feed_primary", "cached_feed_data"),
    ]
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
            request_timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert!(config.failover.enabled);
        assert_eq!(config.failover.mode, FailoverMode::Automatic);
        assert_eq!(config.categories.len(), ServiceCategory::ALL.len());
        assert!(config.categories.iter().all(|c| c.enabled && c.mode.is_none()));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
            [failover]
            mode = "manual"
            emergency_threshold = 2

            [[categories]]
            category = "redis"
            primary_target = "redis://10.0.0.5:6379"
            fallback_target = "in_memory_cache"

            [[categories]]
            category = "graph_store"
            mode = "automatic"
            enabled = false
            primary_target = "bolt://graph:7687"
            fallback_target = "graph_snapshot"
        "#;
        let config: OrchestratorConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.failover.mode, FailoverMode::Manual);
        assert_eq!(config.failover.emergency_threshold, 2);
        assert_eq!(config.failover.max_buffer_size, 10_000);
        assert_eq!(config.categories.len(), 2);
        assert!(config.categories[0].enabled);
        assert_eq!(config.categories[1].mode, Some(FailoverMode::Automatic));
        assert!(!config.categories[1].enabled);
        assert_eq!(config.admin.bind_address, "127.0.0.1:8081");
    }
}
