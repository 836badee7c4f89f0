//! Bounded failover event history.

use std::collections::VecDeque;

use crate::failover::types::FailoverEvent;

/// Append-only ring buffer of transition events. Oldest entries are dropped first.
#[derive(Debug)]
pub struct EventLog {
    events: VecDeque<FailoverEvent>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    pub fn append(&mut self, event: FailoverEvent) {
        if self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// The newest `limit` events, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<FailoverEvent> {
        let skip = self.events.len().saturating_sub(limit);
        self.events.iter().skip(skip).cloned().collect()
    }

    pub fn last(&self) -> Option<&FailoverEvent> {
        self.events.back()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failover::types::{FailoverState, ServiceCategory};
    use uuid::Uuid;

    fn event(reason: &str) -> FailoverEvent {
        FailoverEvent {
            id: Uuid::new_v4(),
            category: ServiceCategory::Redis,
            from_state: FailoverState::Normal,
            to_state: FailoverState::FailoverActive,
            trigger_reason: reason.to_string(),
            fallback_target: "in_memory_cache".to_string(),
            auto_triggered: true,
            recovery_time_seconds: None,
            operations_flushed: 0,
            timestamp: 0.0,
        }
    }

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let mut log = EventLog::new(3);
        for reason in ["a", "b", "c", "d"] {
            log.append(event(reason));
        }
        assert_eq!(log.len(), 3);

        let reasons: Vec<_> = log.recent(10).into_iter().map(|e| e.trigger_reason).collect();
        assert_eq!(reasons, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_recent_limit() {
        let mut log = EventLog::new(10);
        for reason in ["a", "b", "c"] {
            log.append(event(reason));
        }
        let reasons: Vec<_> = log.recent(2).into_iter().map(|e| e.trigger_reason).collect();
        assert_eq!(reasons, vec!["b", "c"]);
        assert!(log.recent(0).is_empty());
        assert_eq!(log.last().unwrap().trigger_reason, "c");
    }
}
