//! Synchronization primitives used by the queues.
//!
//! Resolves to `core`/`std` normally and to `loom` when built with
//! `RUSTFLAGS="--cfg loom"` so the model checker can explore interleavings.
//! Non-atomic state goes through [`UnsafeCell`] and [`SlotCells`] so loom
//! also checks the accesses the atomics are meant to order.

#[cfg(loom)]
pub(crate) use loom::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
#[cfg(loom)]
pub(crate) use loom::sync::Arc;

#[cfg(not(loom))]
pub(crate) use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
#[cfg(not(loom))]
pub(crate) use std::sync::Arc;

#[cfg(loom)]
#[inline]
pub(crate) fn spin_loop() {
    loom::hint::spin_loop();
}

#[cfg(not(loom))]
#[inline]
pub(crate) fn spin_loop() {
    core::hint::spin_loop();
}

#[cfg(loom)]
#[inline]
pub(crate) fn yield_now() {
    loom::thread::yield_now();
}

#[cfg(not(loom))]
#[inline]
pub(crate) fn yield_now() {
    std::thread::yield_now();
}

#[cfg(loom)]
pub(crate) use loom::cell::UnsafeCell;

/// `std` cell with loom's closure-based access API.
#[cfg(not(loom))]
#[derive(Debug)]
pub(crate) struct UnsafeCell<T>(std::cell::UnsafeCell<T>);

#[cfg(not(loom))]
impl<T> UnsafeCell<T> {
    pub(crate) const fn new(value: T) -> Self {
        Self(std::cell::UnsafeCell::new(value))
    }

    #[inline]
    pub(crate) fn with_mut<R>(&self, f: impl FnOnce(*mut T) -> R) -> R {
        f(self.0.get())
    }
}

/// One access marker per ring slot.
///
/// Slot memory comes from the queue's allocator, so loom cannot see reads
/// and writes of it. Under loom every slot access is wrapped in a
/// `with_mut` on its marker, which makes a missing happens-before edge
/// between producer and consumer a reported race. Outside loom this is
/// empty and `with_mut` just calls `f`.
#[cfg(loom)]
pub(crate) struct SlotCells(Box<[UnsafeCell<()>]>);

#[cfg(loom)]
impl SlotCells {
    pub(crate) fn new(slots: usize) -> Self {
        Self((0..slots).map(|_| UnsafeCell::new(())).collect())
    }

    #[inline]
    pub(crate) fn with_mut<R>(&self, index: usize, f: impl FnOnce() -> R) -> R {
        self.0[index].with_mut(|_| f())
    }
}

#[cfg(not(loom))]
pub(crate) struct SlotCells;

#[cfg(not(loom))]
impl SlotCells {
    #[inline]
    pub(crate) fn new(_slots: usize) -> Self {
        Self
    }

    #[inline(always)]
    pub(crate) fn with_mut<R>(&self, _index: usize, f: impl FnOnce() -> R) -> R {
        f()
    }
}
