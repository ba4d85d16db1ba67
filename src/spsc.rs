//! Wait-free single-producer single-consumer queue
//!
//! Both ends finish every call in a bounded number of steps: a capacity (or
//! emptiness) check, one slot access, one index update and one atomic add.
//! There is no CAS and no lock. `Producer` and `Consumer` cannot be cloned
//! and their mutating methods take `&mut self`, so the "exactly one thread
//! per end" rule is enforced by the compiler.
//!
//! ```
//! use spinq::SpscQueue;
//!
//! let (mut tx, mut rx) = SpscQueue::new(4).unwrap();
//! std::thread::spawn(move || {
//!     for i in 0..100u32 {
//!         while !tx.push(i) {
//!             std::thread::yield_now();
//!         }
//!     }
//! });
//!
//! let mut expected = 0;
//! while expected < 100 {
//!     match rx.pop() {
//!         Some(value) => {
//!             assert_eq!(value, expected);
//!             expected += 1;
//!         }
//!         None => std::thread::yield_now(),
//!     }
//! }
//! ```

use std::fmt;

use crate::{
    allocators::{Allocator, Global},
    config::QueueConfig,
    error::Result,
    ring::Ring,
    sync::Arc,
};

/// Bounded SPSC queue.
///
/// The queue itself is only reachable through the handle pair returned by
/// its constructors; it lives until both handles are dropped.
pub struct SpscQueue<T, A: Allocator = Global> {
    ring: Ring<T, A>,
}

impl<T> SpscQueue<T> {
    /// Create a queue holding up to `capacity` elements, backed by the
    /// global allocator.
    pub fn new(capacity: usize) -> Result<(Producer<T>, Consumer<T>)> {
        Self::with_allocator(capacity, Global)
    }
}

impl<T, A: Allocator> SpscQueue<T, A> {
    /// Create a queue whose backing store comes from `allocator`
    pub fn with_allocator(capacity: usize, allocator: A) -> Result<(Producer<T, A>, Consumer<T, A>)> {
        Self::with_config(QueueConfig::new(capacity), allocator)
    }

    /// Create a queue from a validated configuration
    pub fn with_config(config: QueueConfig, allocator: A) -> Result<(Producer<T, A>, Consumer<T, A>)> {
        config.validate()?;
        let queue = Arc::new(SpscQueue {
            ring: Ring::new(config.capacity, allocator, "spsc")?,
        });
        Ok((
            Producer {
                queue: queue.clone(),
            },
            Consumer { queue },
        ))
    }
}

/// Writing end of an [`SpscQueue`]
pub struct Producer<T, A: Allocator = Global> {
    queue: Arc<SpscQueue<T, A>>,
}

impl<T, A: Allocator> Producer<T, A> {
    /// Push `value`; returns `false` without side effects if the queue is
    /// full (the value is dropped).
    #[inline]
    pub fn push(&mut self, value: T) -> bool {
        self.try_push(value).is_ok()
    }

    /// Push `value`, handing it back if the queue is full
    #[inline]
    pub fn try_push(&mut self, value: T) -> std::result::Result<(), T> {
        self.push_with(move || value).map_err(|make| make())
    }

    /// Build the element in place with `make`, which only runs when a slot
    /// is free. A full queue hands `make` back unused.
    #[inline]
    pub fn push_with<F>(&mut self, make: F) -> std::result::Result<(), F>
    where
        F: FnOnce() -> T,
    {
        // SAFETY: `&mut self` on the only producer handle.
        unsafe { self.queue.ring.push_with(make) }
    }

    /// Maximum number of queued elements
    pub fn capacity(&self) -> usize {
        self.queue.ring.capacity()
    }

    /// Snapshot of the number of queued elements
    pub fn len(&self) -> usize {
        self.queue.ring.len()
    }

    /// Snapshot: no element queued
    pub fn is_empty(&self) -> bool {
        self.queue.ring.is_empty()
    }

    /// Snapshot: a push would fail right now
    pub fn is_full(&self) -> bool {
        self.queue.ring.is_full()
    }
}

/// Reading end of an [`SpscQueue`]
pub struct Consumer<T, A: Allocator = Global> {
    queue: Arc<SpscQueue<T, A>>,
}

impl<T, A: Allocator> Consumer<T, A> {
    /// Pop the oldest element, `None` if the queue is empty
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        // SAFETY: `&mut self` on the only consumer handle.
        unsafe { self.queue.ring.pop() }
    }

    /// Move the oldest element into `out`.
    ///
    /// Returns `false` and leaves `out` untouched if the queue is empty. The
    /// previous value of `out` is dropped on success.
    #[inline]
    pub fn pop_into(&mut self, out: &mut T) -> bool {
        match self.pop() {
            Some(value) => {
                *out = value;
                true
            }
            None => false,
        }
    }

    /// Maximum number of queued elements
    pub fn capacity(&self) -> usize {
        self.queue.ring.capacity()
    }

    /// Snapshot of the number of queued elements
    pub fn len(&self) -> usize {
        self.queue.ring.len()
    }

    /// Snapshot: nothing to pop right now
    pub fn is_empty(&self) -> bool {
        self.queue.ring.is_empty()
    }

    /// Snapshot: the queue is at capacity
    pub fn is_full(&self) -> bool {
        self.queue.ring.is_full()
    }
}

impl<T, A: Allocator> fmt::Debug for Producer<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("spsc::Producer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}

impl<T, A: Allocator> fmt::Debug for Consumer<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("spsc::Consumer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}
