//! Bounded circular storage shared by both queue variants.
//!
//! One allocation of `capacity + 2 * padding` slots:
//!
//! ```text
//! ┌──────────────┬──────────────────────────────┬──────────────┐
//! │ padding      │ live region (capacity slots) │ padding      │
//! │ never written│ index 0 .. capacity          │ never written│
//! └──────────────┴──────────────────────────────┴──────────────┘
//! ```
//!
//! The padding keeps the live region off any cache line shared with
//! neighbouring heap data. Storage knows nothing about which slots are live;
//! the ring on top of it tracks that and destroys leftovers before the
//! storage releases its block.

use std::{marker::PhantomData, ptr::NonNull};

use crate::{
    allocators::{Allocator, AllocatorExt},
    error::{QueueError, Result},
    platform::padding_for,
    trace::warn,
};

pub(crate) struct RingStorage<T, A: Allocator> {
    /// Start of the whole allocation, padding included
    base: NonNull<T>,
    capacity: usize,
    padding: usize,
    allocator: A,
    _marker: PhantomData<T>,
}

impl<T, A: Allocator> RingStorage<T, A> {
    pub(crate) fn new(capacity: usize, allocator: A) -> Result<Self> {
        if capacity == 0 {
            return Err(QueueError::invalid_parameter(
                "capacity",
                "Capacity must be greater than 0",
            ));
        }

        let padding = padding_for::<T>();
        let total = padding
            .checked_mul(2)
            .and_then(|p| p.checked_add(capacity))
            .ok_or_else(|| QueueError::capacity_overflow(capacity))?;
        let base = allocator
            .allocate_array::<T>(total)
            .map_err(|err| match err {
                QueueError::CapacityOverflow { .. } => QueueError::capacity_overflow(capacity),
                other => other,
            })?;

        Ok(Self {
            base,
            capacity,
            padding,
            allocator,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    pub(crate) fn padding(&self) -> usize {
        self.padding
    }

    /// Slots in the allocation, padding included
    #[inline]
    pub(crate) fn total_slots(&self) -> usize {
        self.capacity + 2 * self.padding
    }

    /// Size of the backing allocation in bytes
    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    pub(crate) fn allocation_bytes(&self) -> usize {
        self.total_slots() * std::mem::size_of::<T>()
    }

    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    pub(crate) fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Index following `index`, wrapping at `capacity`
    #[inline]
    pub(crate) fn next(&self, index: usize) -> usize {
        let next = index + 1;
        if next == self.capacity {
            0
        } else {
            next
        }
    }

    /// Pointer to live-region slot `index`
    #[inline]
    pub(crate) fn slot(&self, index: usize) -> NonNull<T> {
        debug_assert!(index < self.capacity);
        // SAFETY: padding + index < total_slots, inside the allocation.
        unsafe { NonNull::new_unchecked(self.base.as_ptr().add(self.padding + index)) }
    }

    /// Construct `value` in slot `index` through the allocator.
    ///
    /// # Safety
    /// The slot must be vacant and owned by the calling thread.
    #[inline]
    pub(crate) unsafe fn write(&self, index: usize, value: T) {
        self.allocator.construct(self.slot(index), value);
    }

    /// Move the value out of slot `index`, leaving it vacant.
    ///
    /// # Safety
    /// The slot must hold a published value owned by the calling thread.
    #[inline]
    pub(crate) unsafe fn take(&self, index: usize) -> T {
        self.slot(index).as_ptr().read()
    }

    /// Destroy the value in slot `index` through the allocator.
    ///
    /// # Safety
    /// The slot must hold a live value that nothing else will touch.
    #[inline]
    pub(crate) unsafe fn destroy(&self, index: usize) {
        self.allocator.destroy(self.slot(index));
    }
}

impl<T, A: Allocator> Drop for RingStorage<T, A> {
    fn drop(&mut self) {
        let total = self.total_slots();
        if let Err(_err) = self.allocator.deallocate_array(self.base, total) {
            warn!(
                allocator = self.allocator.type_name(),
                error = %_err,
                "failed to release queue storage"
            );
        }
    }
}
