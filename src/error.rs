//! Error types for queue construction

/// Result type alias for fallible queue operations
pub type Result<T> = std::result::Result<T, QueueError>;

/// Errors raised while building a queue or its backing storage.
///
/// Push and pop never produce these; a full or empty queue is reported as a
/// plain `false` / `None`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// Invalid parameters or configuration
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// The slot layout for the requested capacity does not fit in memory
    #[error("Capacity overflow: {capacity} slots cannot be laid out")]
    CapacityOverflow { capacity: usize },

    /// The allocator could not hand out a block
    #[error("Allocation failed: {size} bytes aligned to {align}")]
    AllocationFailed { size: usize, align: usize },

    /// Insufficient space left in a caller supplied arena
    #[error("Insufficient space: requested {requested}, available {available}")]
    InsufficientSpace { requested: usize, available: usize },

    /// Memory handed back to an allocator that does not own it
    #[error("Foreign pointer: address {address:#x} not owned by {allocator}")]
    ForeignPointer {
        address: usize,
        allocator: &'static str,
    },
}

impl QueueError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a capacity overflow error
    pub fn capacity_overflow(capacity: usize) -> Self {
        Self::CapacityOverflow { capacity }
    }

    /// Create an allocation failure error
    pub fn allocation_failed(size: usize, align: usize) -> Self {
        Self::AllocationFailed { size, align }
    }

    /// Create an insufficient space error
    pub fn insufficient_space(requested: usize, available: usize) -> Self {
        Self::InsufficientSpace {
            requested,
            available,
        }
    }

    /// Create a foreign pointer error
    pub fn foreign_pointer(address: usize, allocator: &'static str) -> Self {
        Self::ForeignPointer { address, allocator }
    }

    /// True for failures reported by an allocator rather than by validation
    pub fn is_allocation_error(&self) -> bool {
        matches!(
            self,
            Self::AllocationFailed { .. } | Self::InsufficientSpace { .. }
        )
    }
}
