//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds, intervals, buffer sizes > 0)
//! - Detect duplicate category wiring and empty targets
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: OrchestratorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;

use crate::config::schema::OrchestratorConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &OrchestratorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let failover = &config.failover;

    if failover.monitor_interval_secs == 0 {
        errors.push(ValidationError::new("failover.monitor_interval_secs", "must be greater than 0"));
    }
    if failover.error_backoff_secs == 0 {
        errors.push(ValidationError::new("failover.error_backoff_secs", "must be greater than 0"));
    }
    if failover.max_buffer_size == 0 {
        errors.push(ValidationError::new("failover.max_buffer_size", "must be greater than 0"));
    }
    if failover.buffer_flush_batch_size == 0 {
        errors.push(ValidationError::new("failover.buffer_flush_batch_size", "must be greater than 0"));
    }
    if failover.emergency_threshold == 0 {
        errors.push(ValidationError::new("failover.emergency_threshold", "must be at least 1"));
    }
    if failover.event_history_limit == 0 {
        errors.push(ValidationError::new("failover.event_history_limit", "must be greater than 0"));
    }

    let mut seen = HashSet::new();
    for (i, category) in config.categories.iter().enumerate() {
        if !seen.insert(category.category) {
            errors.push(ValidationError::new(
                format!("categories[{}].category", i),
                format!("duplicate entry for '{}'", category.category),
            ));
        }
        if category.primary_target.trim().is_empty() {
            errors.push(ValidationError::new(format!("categories[{}].primary_target", i), "must not be empty"));
        }
        if category.fallback_target.trim().is_empty() {
            errors.push(ValidationError::new(format!("categories[{}].fallback_target", i), "must not be empty"));
        }
    }

    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::new("admin.api_key", "must not be empty when admin API is enabled"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::CategoryConfig;
    use crate::failover::types::ServiceCategory;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&OrchestratorConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_all_errors() {
        let mut config = OrchestratorConfig::default();
        config.failover.max_buffer_size = 0;
        config.failover.emergency_threshold = 0;
        config.categories.push(CategoryConfig::new(ServiceCategory::Redis, "", "backup"));

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();

        assert_eq!(errors.len(), 4);
        assert!(fields.contains(&"failover.max_buffer_size"));
        assert!(fields.contains(&"failover.emergency_threshold"));
        assert!(fields.contains(&"categories[6].category"));
        assert!(fields.contains(&"categories[6].primary_target"));
    }
}
