//! Single-producer multi-consumer queue
//!
//! The producer side is the same wait-free push as the SPSC queue. Consumers
//! share one read index, and "read slot, advance index, decrement count"
//! cannot be done with a single atomic, so that step runs under a tiny
//! spinlock (`consumer_lock`). Exactly one consumer is in the critical
//! section at a time, which keeps global FIFO order across consumers. The
//! consumer side is lock-free rather than wait-free: a consumer may spin for
//! the length of another consumer's critical section.
//!
//! An empty queue is detected without touching the lock, and the count is
//! checked again once the lock is held, because a competing consumer may
//! have taken the last element in between.

use std::fmt;

use crate::{
    allocators::{Allocator, Global},
    config::QueueConfig,
    error::Result,
    platform::{unlikely, Backoff, CachePadded},
    ring::Ring,
    sync::{Arc, AtomicBool, Ordering},
};

/// Bounded SPMC queue.
///
/// Reachable only through the handles returned by its constructors; it
/// lives until the producer and every consumer clone are dropped.
pub struct SpmcQueue<T, A: Allocator = Global> {
    ring: Ring<T, A>,
    consumer_lock: CachePadded<AtomicBool>,
    spin_limit: usize,
}

impl<T> SpmcQueue<T> {
    /// Create a queue holding up to `capacity` elements, backed by the
    /// global allocator.
    pub fn new(capacity: usize) -> Result<(Producer<T>, Consumer<T>)> {
        Self::with_allocator(capacity, Global)
    }
}

impl<T, A: Allocator> SpmcQueue<T, A> {
    /// Create a queue whose backing store comes from `allocator`
    pub fn with_allocator(capacity: usize, allocator: A) -> Result<(Producer<T, A>, Consumer<T, A>)> {
        Self::with_config(QueueConfig::new(capacity), allocator)
    }

    /// Create a queue from a validated configuration
    pub fn with_config(config: QueueConfig, allocator: A) -> Result<(Producer<T, A>, Consumer<T, A>)> {
        config.validate()?;
        let queue = Arc::new(SpmcQueue {
            ring: Ring::new(config.capacity, allocator, "spmc")?,
            consumer_lock: CachePadded::new(AtomicBool::new(false)),
            spin_limit: config.spin_limit,
        });
        Ok((
            Producer {
                queue: queue.clone(),
            },
            Consumer { queue },
        ))
    }

    fn lock_consumers(&self) -> ConsumerGuard<'_> {
        let mut backoff = Backoff::new(self.spin_limit);
        while unlikely(
            self.consumer_lock
                .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_err(),
        ) {
            // Wait on a plain load so contenders do not keep stealing the line.
            while self.consumer_lock.load(Ordering::Relaxed) {
                backoff.snooze();
            }
        }
        ConsumerGuard { lock: &self.consumer_lock }
    }

    fn pop(&self) -> Option<T> {
        if unlikely(self.ring.is_empty()) {
            return None;
        }

        let _guard = self.lock_consumers();
        // SAFETY: the guard makes this the only consumer inside `Ring::pop`,
        // which re-checks the count under the lock.
        unsafe { self.ring.pop() }
    }
}

/// Releases the consumer lock on drop
struct ConsumerGuard<'a> {
    lock: &'a AtomicBool,
}

impl Drop for ConsumerGuard<'_> {
    fn drop(&mut self) {
        self.lock.store(false, Ordering::Release);
    }
}

/// Writing end of an [`SpmcQueue`]; there is exactly one
pub struct Producer<T, A: Allocator = Global> {
    queue: Arc<SpmcQueue<T, A>>,
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
        // SAFETY: `&mut self` on the only producer handle; consumers never
        // touch the write index.
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

/// Reading end of an [`SpmcQueue`].
///
/// Clone it to add consumers; every clone pops from the same queue and each
/// element goes to exactly one of them.
pub struct Consumer<T, A: Allocator = Global> {
    queue: Arc<SpmcQueue<T, A>>,
}

impl<T, A: Allocator> Clone for Consumer<T, A> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
        }
    }
}

impl<T, A: Allocator> Consumer<T, A> {
    /// Pop the oldest element, `None` if the queue is empty
    #[inline]
    pub fn pop(&self) -> Option<T> {
        self.queue.pop()
    }

    /// Move the oldest element into `out`.
    ///
    /// Returns `false` and leaves `out` untouched if the queue is empty.
    #[inline]
    pub fn pop_into(&self, out: &mut T) -> bool {
        match self.queue.pop() {
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
        f.debug_struct("spmc::Producer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}

impl<T, A: Allocator> fmt::Debug for Consumer<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("spmc::Consumer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}
