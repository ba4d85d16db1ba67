//! Bump arena - allocates sequentially from a caller supplied memory region

use std::{
    marker::PhantomData,
    ptr::NonNull,
    sync::atomic::{AtomicUsize, Ordering},
};

use super::traits::{align_up, Allocator};
use crate::{
    error::{QueueError, Result},
    trace::warn,
};

/// Simple bump arena over a borrowed byte region.
///
/// Allocation is a single CAS on the offset. Individual blocks are never
/// reclaimed; [`reset`](BumpArena::reset) rewinds the arena once every queue
/// built on it is gone. Pass `&arena` as the queue allocator to let several
/// queues share one region.
#[derive(Debug)]
pub struct BumpArena<'a> {
    /// Base pointer to the memory region
    base_ptr: NonNull<u8>,
    /// Total size of the region
    total_size: usize,
    /// Current offset (atomically updated)
    current_offset: AtomicUsize,
    _region: PhantomData<&'a mut [u8]>,
}

impl<'a> BumpArena<'a> {
    /// Create a new arena from a mutable slice
    pub fn new(memory: &'a mut [u8]) -> Result<Self> {
        if memory.is_empty() {
            return Err(QueueError::invalid_parameter(
                "memory",
                "Memory region cannot be empty",
            ));
        }

        let total_size = memory.len();
        let base_ptr = NonNull::from(memory).cast::<u8>();

        Ok(Self {
            base_ptr,
            total_size,
            current_offset: AtomicUsize::new(0),
            _region: PhantomData,
        })
    }

    /// Total size of the region in bytes
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Bytes handed out so far, alignment gaps included
    pub fn used_size(&self) -> usize {
        self.current_offset.load(Ordering::Acquire)
    }

    /// Bytes still available past the current offset
    pub fn available_size(&self) -> usize {
        self.total_size - self.used_size()
    }

    /// Check if a pointer lies inside this arena
    pub fn owns(&self, ptr: NonNull<u8>) -> bool {
        let ptr_addr = ptr.as_ptr() as usize;
        let base_addr = self.base_ptr.as_ptr() as usize;
        ptr_addr >= base_addr && ptr_addr < base_addr + self.total_size
    }

    /// Rewind the arena to its start.
    ///
    /// Requires `&mut self`, so no queue can still be borrowing the arena.
    pub fn reset(&mut self) {
        *self.current_offset.get_mut() = 0;
    }

    /// Offset (from the base) at which a block would start, and the offset
    /// just past it.
    fn bounds(&self, current: usize, size: usize, align: usize) -> Option<(usize, usize)> {
        let base_addr = self.base_ptr.as_ptr() as usize;
        let aligned_addr = align_up(base_addr.checked_add(current)?, align)?;
        let start = aligned_addr - base_addr;
        let end = start.checked_add(size)?;
        Some((start, end))
    }
}

unsafe impl Allocator for BumpArena<'_> {
    fn allocate(&self, size: usize, align: usize) -> Result<NonNull<u8>> {
        if size == 0 {
            return Err(QueueError::invalid_parameter(
                "size",
                "Size must be greater than 0",
            ));
        }

        if !align.is_power_of_two() {
            return Err(QueueError::invalid_parameter(
                "align",
                "Alignment must be a power of 2",
            ));
        }

        let mut current = self.current_offset.load(Ordering::Acquire);
        loop {
            let (start, end) = match self.bounds(current, size, align) {
                Some((start, end)) if end <= self.total_size => (start, end),
                _ => {
                    let available = self.total_size - current;
                    warn!(
                        requested = size,
                        available,
                        "bump arena exhausted"
                    );
                    return Err(QueueError::insufficient_space(size, available));
                }
            };

            match self.current_offset.compare_exchange_weak(
                current,
                end,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                // SAFETY: start < end <= total_size, so the block is in bounds.
                Ok(_) => return Ok(unsafe { NonNull::new_unchecked(self.base_ptr.as_ptr().add(start)) }),
                Err(actual) => {
                    // Another thread updated the offset, retry
                    current = actual;
                    std::hint::spin_loop();
                }
            }
        }
    }

    fn deallocate(&self, ptr: NonNull<u8>, _size: usize, _align: usize) -> Result<()> {
        // Blocks are only reclaimed by `reset`.
        if !self.owns(ptr) {
            return Err(QueueError::foreign_pointer(
                ptr.as_ptr() as usize,
                "BumpArena",
            ));
        }
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "BumpArena"
    }
}

// SAFETY: the arena only hands out disjoint blocks of the exclusively
// borrowed region, coordinated through the atomic offset.
unsafe impl Send for BumpArena<'_> {}
unsafe impl Sync for BumpArena<'_> {}
