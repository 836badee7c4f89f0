//! Core failover types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::error::FailoverError;

/// Seconds since the UNIX epoch.
pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Operator-level failover policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailoverMode {
    /// Fallbacks activate as soon as a failure sample arrives.
    #[default]
    Automatic,
    /// Failures are recorded but activation waits for an operator.
    Manual,
    /// Health samples are ignored entirely.
    Disabled,
}

/// Global system state, derived from the set of active fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailoverState {
    #[default]
    Normal,
    Degraded,
    FailoverActive,
    Recovery,
    Emergency,
}

impl FailoverState {
    /// Numeric encoding used for the `failover_state` gauge.
    pub fn as_gauge(&self) -> f64 {
        match self {
            FailoverState::Normal => 0.0,
            FailoverState::Degraded => 1.0,
            FailoverState::FailoverActive => 2.0,
            FailoverState::Recovery => 3.0,
            FailoverState::Emergency => 4.0,
        }
    }
}

/// Health status reported by the external probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    Offline,
}

impl HealthStatus {
    /// Unhealthy and offline both count as a lost dependency.
    pub fn is_failure(&self) -> bool {
        matches!(self, HealthStatus::Unhealthy | HealthStatus::Offline)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
            HealthStatus::Offline => "offline",
        }
    }
}

/// Dependency categories that can carry a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    /// Cache tier.
    Redis,
    GraphStore,
    SearchIndex,
    MessageBroker,
    SubEngine,
    FederalFeed,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 6] = [
        ServiceCategory::Redis,
        ServiceCategory::GraphStore,
        ServiceCategory::SearchIndex,
        ServiceCategory::MessageBroker,
        ServiceCategory::SubEngine,
        ServiceCategory::FederalFeed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Redis => "redis",
            ServiceCategory::GraphStore => "graph_store",
            ServiceCategory::SearchIndex => "search_index",
            ServiceCategory::MessageBroker => "message_broker",
            ServiceCategory::SubEngine => "sub_engine",
            ServiceCategory::FederalFeed => "federal_feed",
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceCategory {
    type Err = FailoverError;

    /// Accepts snake_case, camelCase and kebab-case spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "redis" | "cache" => Ok(ServiceCategory::Redis),
            "graphstore" => Ok(ServiceCategory::GraphStore),
            "searchindex" => Ok(ServiceCategory::SearchIndex),
            "messagebroker" => Ok(ServiceCategory::MessageBroker),
            "subengine" => Ok(ServiceCategory::SubEngine),
            "federalfeed" => Ok(ServiceCategory::FederalFeed),
            _ => Err(FailoverError::InvalidCategory(s.to_string())),
        }
    }
}

/// One health observation for one dependency instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSample {
    /// Stable identifier of the dependency instance.
    pub instance_id: String,
    /// Human readable instance name.
    pub instance_name: String,
    pub category: ServiceCategory,
    pub status: HealthStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    /// Probe timestamp (seconds since epoch).
    pub timestamp: f64,
}

impl HealthSample {
    /// Build a sample stamped with the current time.
    pub fn new(
        instance_id: impl Into<String>,
        category: ServiceCategory,
        status: HealthStatus,
    ) -> Self {
        let instance_id = instance_id.into();
        Self {
            instance_name: instance_id.clone(),
            instance_id,
            category,
            status,
            error_message: None,
            timestamp: unix_now(),
        }
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// Fallback wiring and live activation state for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceFallback {
    pub category: ServiceCategory,
    pub primary_target: String,
    pub fallback_target: String,
    pub mode: FailoverMode,
    pub is_active: bool,
    /// Set if and only if `is_active`.
    pub activated_at: Option<f64>,
    /// Operations currently buffered for this category.
    pub buffered_operations: usize,
}

impl ServiceFallback {
    pub fn new(
        category: ServiceCategory,
        primary_target: impl Into<String>,
        fallback_target: impl Into<String>,
        mode: FailoverMode,
    ) -> Self {
        Self {
            category,
            primary_target: primary_target.into(),
            fallback_target: fallback_target.into(),
            mode,
            is_active: false,
            activated_at: None,
            buffered_operations: 0,
        }
    }

    pub(crate) fn activate(&mut self, now: f64) {
        self.is_active = true;
        self.activated_at = Some(now);
    }

    /// Clear the activation, returning when it started.
    pub(crate) fn deactivate(&mut self) -> Option<f64> {
        self.is_active = false;
        self.activated_at.take()
    }
}

/// Immutable record of one fallback transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailoverEvent {
    pub id: Uuid,
    pub category: ServiceCategory,
    pub from_state: FailoverState,
    pub to_state: FailoverState,
    pub trigger_reason: String,
    /// Target traffic is routed to after this event.
    pub fallback_target: String,
    pub auto_triggered: bool,
    pub recovery_time_seconds: Option<f64>,
    /// Buffered operations released by this event.
    pub operations_flushed: usize,
    pub timestamp: f64,
}

/// An operation held back while its primary dependency is down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferedOperation {
    pub id: Uuid,
    pub category: ServiceCategory,
    /// Opaque payload; the owning subsystem knows how to replay it.
    pub payload: serde_json::Value,
    pub enqueued_at: f64,
}

impl BufferedOperation {
    pub fn new(category: ServiceCategory, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            category,
            payload,
            enqueued_at: unix_now(),
        }
    }
}
