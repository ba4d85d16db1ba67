//! Queue configuration

use crate::error::{QueueError, Result};

/// Default queue capacity
pub const DEFAULT_CAPACITY: usize = 1024;

/// Default number of spin rounds a contending SPMC consumer makes before it
/// starts yielding its time slice
pub const DEFAULT_SPIN_LIMIT: usize = 6;

/// Configuration shared by both queue variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Number of elements the queue holds when full
    pub capacity: usize,
    /// Spin rounds before yielding while waiting for the consumer lock.
    /// Ignored by the SPSC queue.
    pub spin_limit: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            spin_limit: DEFAULT_SPIN_LIMIT,
        }
    }
}

impl QueueConfig {
    /// Create a configuration for `capacity` elements
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    /// Set capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the consumer lock spin limit
    pub fn with_spin_limit(mut self, spin_limit: usize) -> Self {
        self.spin_limit = spin_limit;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(QueueError::invalid_parameter(
                "capacity",
                "Capacity must be greater than 0",
            ));
        }

        if self.spin_limit == 0 {
            return Err(QueueError::invalid_parameter(
                "spin_limit",
                "Spin limit must be greater than 0",
            ));
        }

        Ok(())
    }
}
