//! Fallback registry.
//!
//! # Responsibilities
//! - Hold exactly one `ServiceFallback` per configured, enabled category
//! - Resolve per-category mode overrides against the global mode
//!
//! Built once at startup; entries are never added or removed afterwards.
//! Only activation fields change, and only through the orchestrator.

use std::collections::BTreeMap;

use crate::config::OrchestratorConfig;
use crate::failover::types::{ServiceCategory, ServiceFallback};

#[derive(Debug, Clone, Default)]
pub struct FallbackRegistry {
    fallbacks: BTreeMap<ServiceCategory, ServiceFallback>,
}

impl FallbackRegistry {
    /// Build the registry from configuration.
    pub fn from_config(config: &OrchestratorConfig) -> Self {
        let mut fallbacks = BTreeMap::new();

        for entry in &config.categories {
            if !entry.enabled {
                tracing::info!(category = %entry.category, "Fallback disabled by configuration");
                continue;
            }

            let mode = entry.mode.unwrap_or(config.failover.mode);
            let fallback = ServiceFallback::new(
                entry.category,
                entry.primary_target.clone(),
                entry.fallback_target.clone(),
                mode,
            );

            tracing::debug!(
                category = %entry.category,
                primary = %entry.primary_target,
                fallback = %entry.fallback_target,
                mode = ?mode,
                "Registered fallback"
            );
            fallbacks.insert(entry.category, fallback);
        }

        Self { fallbacks }
    }

    /// Fallback for a category; `None` means no redundancy path.
    pub fn lookup(&self, category: ServiceCategory) -> Option<&ServiceFallback> {
        self.fallbacks.get(&category)
    }

    pub(crate) fn lookup_mut(&mut self, category: ServiceCategory) -> Option<&mut ServiceFallback> {
        self.fallbacks.get_mut(&category)
    }

    pub fn all(&self) -> &BTreeMap<ServiceCategory, ServiceFallback> {
        &self.fallbacks
    }

    pub fn active_count(&self) -> usize {
        self.fallbacks.values().filter(|f| f.is_active).count()
    }

    pub fn active_categories(&self) -> Vec<ServiceCategory> {
        self.fallbacks
            .values()
            .filter(|f| f.is_active)
            .map(|f| f.category)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fallbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fallbacks.is_empty()
    }
}
