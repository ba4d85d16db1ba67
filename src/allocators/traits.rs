//! Allocator trait definition

use std::{alloc::Layout, ptr::NonNull};

use crate::error::{QueueError, Result};

/// Allocation capability used by the queues for their backing store and for
/// element construction / destruction.
///
/// A queue calls [`allocate`](Allocator::allocate) once when it is built and
/// [`deallocate`](Allocator::deallocate) once when its last handle is dropped.
/// [`construct`](Allocator::construct) runs for every pushed element and
/// [`destroy`](Allocator::destroy) for every element still queued at
/// teardown. Popped elements are moved out and never destroyed by the queue.
///
/// # Safety
///
/// Implementors must return blocks that are valid for reads and writes of
/// `size` bytes, aligned to `align`, and not handed out again while still in
/// use. An overridden `construct` must leave `slot` initialized with `value`
/// and an overridden `destroy` must drop the value in place exactly once.
pub unsafe trait Allocator: Send + Sync + std::fmt::Debug {
    /// Allocate memory of the given size and alignment
    fn allocate(&self, size: usize, align: usize) -> Result<NonNull<u8>>;

    /// Deallocate a block previously returned by `allocate` with the same
    /// size and alignment
    fn deallocate(&self, ptr: NonNull<u8>, size: usize, align: usize) -> Result<()>;

    /// Move `value` into the uninitialized `slot`.
    ///
    /// # Safety
    /// `slot` must be valid for writes, aligned, and hold no live value.
    #[inline]
    unsafe fn construct<T>(&self, slot: NonNull<T>, value: T) {
        slot.as_ptr().write(value);
    }

    /// Drop the value living in `slot`.
    ///
    /// # Safety
    /// `slot` must hold a live value that nobody else will read or drop.
    #[inline]
    unsafe fn destroy<T>(&self, slot: NonNull<T>) {
        std::ptr::drop_in_place(slot.as_ptr());
    }

    /// Get allocator type name for debugging
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

// A shared reference lets several queues draw from one arena.
unsafe impl<A: Allocator> Allocator for &A {
    fn allocate(&self, size: usize, align: usize) -> Result<NonNull<u8>> {
        (**self).allocate(size, align)
    }

    fn deallocate(&self, ptr: NonNull<u8>, size: usize, align: usize) -> Result<()> {
        (**self).deallocate(ptr, size, align)
    }

    unsafe fn construct<T>(&self, slot: NonNull<T>, value: T) {
        (**self).construct(slot, value)
    }

    unsafe fn destroy<T>(&self, slot: NonNull<T>) {
        (**self).destroy(slot)
    }

    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }
}

/// Typed helpers on top of [`Allocator`]
pub trait AllocatorExt: Allocator {
    /// Allocate room for `count` values of `T`.
    ///
    /// Zero-byte requests never reach the allocator and yield a dangling,
    /// well-aligned pointer.
    fn allocate_array<T>(&self, count: usize) -> Result<NonNull<T>> {
        let layout = array_layout::<T>(count)?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        let ptr = self.allocate(layout.size(), layout.align())?;
        Ok(ptr.cast::<T>())
    }

    /// Release a block obtained from [`allocate_array`](AllocatorExt::allocate_array)
    fn deallocate_array<T>(&self, ptr: NonNull<T>, count: usize) -> Result<()> {
        let layout = array_layout::<T>(count)?;
        if layout.size() == 0 {
            return Ok(());
        }
        self.deallocate(ptr.cast::<u8>(), layout.size(), layout.align())
    }
}

// Blanket implementation for all Allocators
impl<A: Allocator + ?Sized> AllocatorExt for A {}

fn array_layout<T>(count: usize) -> Result<Layout> {
    Layout::array::<T>(count).map_err(|_| QueueError::capacity_overflow(count))
}

/// Round `value` up to a power-of-two `align`
pub(crate) fn align_up(value: usize, align: usize) -> Option<usize> {
    debug_assert!(align.is_power_of_two());
    value.checked_add(align - 1).map(|v| v & !(align - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 8), Some(0));
        assert_eq!(align_up(1, 8), Some(8));
        assert_eq!(align_up(64, 64), Some(64));
        assert_eq!(align_up(65, 64), Some(128));
        assert_eq!(align_up(usize::MAX, 64), None);
    }

    #[test]
    fn test_array_layout_overflow() {
        assert!(matches!(
            array_layout::<u64>(usize::MAX),
            Err(QueueError::CapacityOverflow { .. })
        ));
        assert_eq!(array_layout::<u32>(4).unwrap().size(), 16);
    }
}
