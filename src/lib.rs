//! # spinq - Bounded Lock-Free Queues for Inter-Thread Pipelines
//!
//! spinq provides fixed-capacity ring-buffer queues for handing values
//! between threads of one process without kernel locks. Every push and pop
//! returns immediately; callers that want to wait poll and choose their own
//! backoff.
//!
//! ## Features
//!
//! - **SPSC queue**: wait-free producer and consumer, one atomic counter
//! - **SPMC queue**: wait-free producer, any number of consumers serialized by
//!   a minimal spinlock, global FIFO order across consumers
//! - **Cache-line aware layout**: one allocation padded on both sides, hot
//!   indices on separate cache lines
//! - **Pluggable allocation**: global allocator by default, caller supplied
//!   arenas through the [`Allocator`] trait
//! - **Exact capacity**: a queue built for `n` holds exactly `n` elements
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐        ┌──────────────────────────────┐
//! │ Producer (1 thread)  │ push   │           Ring<T, A>         │
//! │  write_index         ├───────►│  RingStorage: pad|slots|pad  │
//! └──────────────────────┘        │  live_count (acq/rel)        │
//!                                 └──────────────┬───────────────┘
//!                                                │ pop
//!                    ┌───────────────────────────┴───────────────┐
//!                    ▼                                           ▼
//!          ┌───────────────────┐                    ┌─────────────────────┐
//!          │ spsc::Consumer    │                    │ spmc::Consumer × N  │
//!          │  read_index       │                    │  consumer_lock +    │
//!          └───────────────────┘                    │  shared read_index  │
//!                                                   └─────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use spinq::SpmcQueue;
//!
//! let (mut tx, rx) = SpmcQueue::new(16).unwrap();
//! let workers: Vec<_> = (0..2)
//!     .map(|_| {
//!         let rx = rx.clone();
//!         std::thread::spawn(move || {
//!             let mut sum = 0u64;
//!             loop {
//!                 match rx.pop() {
//!                     Some(0) => return sum,
//!                     Some(v) => sum += v,
//!                     None => std::thread::yield_now(),
//!                 }
//!             }
//!         })
//!     })
//!     .collect();
//!
//! for v in (1..=100u64).chain([0, 0]) {
//!     while !tx.push(v) {
//!         std::thread::yield_now();
//!     }
//! }
//! let total: u64 = workers.into_iter().map(|w| w.join().unwrap()).sum();
//! assert_eq!(total, 5050);
//! ```

// Core modules
pub mod allocators;
pub mod config;
pub mod error;
pub mod platform;
pub mod spmc;
pub mod spsc;
pub mod trace;

// Internal building blocks
mod ring;
mod storage;
mod sync;

// Main API re-exports
pub use allocators::{Allocator, AllocatorExt, BumpArena, Global};
pub use config::QueueConfig;
pub use error::{QueueError, Result};
pub use platform::CACHE_LINE_SIZE;
pub use spmc::SpmcQueue;
pub use spsc::SpscQueue;
pub use trace::init_tracing;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
