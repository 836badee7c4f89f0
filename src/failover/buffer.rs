//! Operation buffer.
//!
//! # Responsibilities
//! - Hold operations that could not reach their primary while a fallback is active
//! - Shed load once `max_size` items are held
//! - Release every operation of one category on recovery
//!
//! # Design Decisions
//! - One bounded FIFO shared by all categories
//! - Flush is a single pass that keeps the relative order of the remaining items
//! - Nothing is executed here; payloads are opaque

use std::collections::VecDeque;

use crate::failover::types::{BufferedOperation, ServiceCategory};

#[derive(Debug)]
pub struct OperationBuffer {
    items: VecDeque<BufferedOperation>,
    max_size: usize,
}

impl OperationBuffer {
    pub fn new(max_size: usize) -> Self {
        Self {
            items: VecDeque::new(),
            max_size,
        }
    }

    /// Enqueue an operation. Returns false when the buffer is full.
    pub fn push(&mut self, operation: BufferedOperation) -> bool {
        if self.items.len() >= self.max_size {
            return false;
        }
        self.items.push_back(operation);
        true
    }

    /// Remove and return every operation tagged with `category`, in enqueue order.
    pub fn flush(&mut self, category: ServiceCategory) -> Vec<BufferedOperation> {
        let (flushed, kept): (VecDeque<_>, VecDeque<_>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|op| op.category == category);
        self.items = kept;
        flushed.into()
    }

    pub fn count_for(&self, category: ServiceCategory) -> usize {
        self.items.iter().filter(|op| op.category == category).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BufferedOperation> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.max_size
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }
}
