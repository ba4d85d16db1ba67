//! Ring state shared by the SPSC and SPMC queues.
//!
//! `write_index` belongs to the producer and `read_index` to whichever
//! consumer is allowed to pop, so neither is atomic. All cross-thread
//! visibility goes through `live_count`:
//!
//! - the producer constructs a slot, then `fetch_add(1, Release)`;
//! - a consumer `load(Acquire)`s a non-zero count before moving a slot out,
//!   then `fetch_sub(1, Release)`;
//! - the producer `load(Acquire)`s the count before reusing a slot.

use crate::{
    allocators::Allocator,
    error::Result,
    platform::{unlikely, CachePadded},
    storage::RingStorage,
    sync::{AtomicUsize, Ordering, SlotCells, UnsafeCell},
    trace::{debug, trace},
};

pub(crate) struct Ring<T, A: Allocator> {
    storage: RingStorage<T, A>,
    slots: SlotCells,
    write_index: CachePadded<UnsafeCell<usize>>,
    read_index: CachePadded<UnsafeCell<usize>>,
    live_count: CachePadded<AtomicUsize>,
}

// SAFETY: slots are only touched under the producer / consumer protocol
// described above; values of T cross threads, so T must be Send.
unsafe impl<T: Send, A: Allocator> Send for Ring<T, A> {}
unsafe impl<T: Send, A: Allocator> Sync for Ring<T, A> {}

impl<T, A: Allocator> Ring<T, A> {
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub(crate) fn new(capacity: usize, allocator: A, kind: &'static str) -> Result<Self> {
        let storage = RingStorage::new(capacity, allocator)?;

        debug!(
            kind,
            capacity = storage.capacity(),
            padding = storage.padding(),
            bytes = storage.allocation_bytes(),
            allocator = storage.allocator().type_name(),
            "queue created"
        );

        Ok(Self {
            slots: SlotCells::new(storage.capacity()),
            storage,
            write_index: CachePadded::new(UnsafeCell::new(0)),
            read_index: CachePadded::new(UnsafeCell::new(0)),
            live_count: CachePadded::new(AtomicUsize::new(0)),
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.live_count.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    /// Construct the value produced by `make` at the write index and publish
    /// it. `make` only runs once a free slot is known to exist; on a full
    /// ring it is handed back untouched.
    ///
    /// # Safety
    /// At most one thread may be inside `push_with` at any time.
    #[inline]
    pub(crate) unsafe fn push_with<F>(&self, make: F) -> std::result::Result<(), F>
    where
        F: FnOnce() -> T,
    {
        if unlikely(self.is_full()) {
            return Err(make);
        }

        let value = make();
        self.write_index.with_mut(|write| {
            let index = *write;
            self.slots.with_mut(index, || self.storage.write(index, value));
            *write = self.storage.next(index);
        });
        self.live_count.fetch_add(1, Ordering::Release);
        Ok(())
    }

    /// Move out the value at the read index, if any.
    ///
    /// # Safety
    /// At most one thread may be inside `pop` at any time.
    #[inline]
    pub(crate) unsafe fn pop(&self) -> Option<T> {
        if unlikely(self.is_empty()) {
            return None;
        }

        let value = self.read_index.with_mut(|read| {
            let index = *read;
            let value = self.slots.with_mut(index, || self.storage.take(index));
            *read = self.storage.next(index);
            value
        });
        self.live_count.fetch_sub(1, Ordering::Release);
        Some(value)
    }
}

impl<T, A: Allocator> Drop for Ring<T, A> {
    fn drop(&mut self) {
        // Only slots in [read_index, read_index + live) were ever constructed
        // and not yet moved out.
        let live = self.live_count.load(Ordering::Acquire);
        // SAFETY: `&mut self` means no producer or consumer remains.
        let mut index = self.read_index.with_mut(|read| unsafe { *read });
        for _ in 0..live {
            self.slots
                .with_mut(index, || unsafe { self.storage.destroy(index) });
            index = self.storage.next(index);
        }

        trace!(
            capacity = self.storage.capacity(),
            destroyed = live,
            "queue dropped"
        );
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;
    use crate::allocators::Global;
    use std::{
        rc::Rc,
        sync::atomic::{AtomicUsize as StdAtomicUsize, Ordering as StdOrdering},
        sync::Arc,
    };

    fn ring<T>(capacity: usize) -> Ring<T, Global> {
        Ring::new(capacity, Global, "test").unwrap()
    }

    #[test]
    fn test_push_pop_in_order() {
        let ring = ring::<u32>(3);
        unsafe {
            assert!(ring.push_with(|| 1).is_ok());
            assert!(ring.push_with(|| 2).is_ok());
            assert!(ring.push_with(|| 3).is_ok());
            assert!(ring.is_full());
            assert!(ring.push_with(|| 4).is_err());

            assert_eq!(ring.pop(), Some(1));
            assert_eq!(ring.pop(), Some(2));
            assert_eq!(ring.pop(), Some(3));
            assert_eq!(ring.pop(), None);
        }
        assert!(ring.is_empty());
    }

    #[test]
    fn test_full_ring_does_not_run_constructor() {
        let ring = ring::<u32>(1);
        let calls = Rc::new(StdAtomicUsize::new(0));
        unsafe {
            let counter = calls.clone();
            assert!(ring
                .push_with(move || {
                    counter.fetch_add(1, StdOrdering::Relaxed);
                    7
                })
                .is_ok());

            let counter = calls.clone();
            let refused = ring.push_with(move || {
                counter.fetch_add(1, StdOrdering::Relaxed);
                8
            });
            assert!(refused.is_err());
        }
        assert_eq!(calls.load(StdOrdering::Relaxed), 1);
    }

    #[test]
    fn test_drop_destroys_only_live_elements() {
        let token = Arc::new(());
        {
            let ring = ring::<Arc<()>>(8);
            unsafe {
                for _ in 0..5 {
                    assert!(ring.push_with(|| token.clone()).is_ok());
                }
                // Moving two out leaves three live; the wrap below makes the
                // live range straddle the end of the buffer.
                drop(ring.pop());
                drop(ring.pop());
                for _ in 0..4 {
                    assert!(ring.push_with(|| token.clone()).is_ok());
                }
            }
            assert_eq!(ring.len(), 7);
            assert_eq!(Arc::strong_count(&token), 8);
        }
        assert_eq!(Arc::strong_count(&token), 1);
    }
}
