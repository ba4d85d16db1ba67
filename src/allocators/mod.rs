//! Allocation capabilities for queue storage

pub mod bump;
pub mod global;
pub mod traits;

pub use bump::BumpArena;
pub use global::Global;
pub use traits::{Allocator, AllocatorExt};
