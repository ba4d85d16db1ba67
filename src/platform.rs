//! Platform constants and low-level helpers
//!
//! Cache-line size, cache padding, branch hints and the spin backoff used by
//! the multi-consumer lock. None of these affect queue semantics; they only
//! shape memory layout and retry loops.

use core::ops::{Deref, DerefMut};

use crate::sync;

/// Destructive interference size assumed for the target.
///
/// Apple silicon and POWER use 128-byte lines; everything else is treated as
/// 64 bytes.
#[cfg(any(
    all(target_arch = "aarch64", target_vendor = "apple"),
    target_arch = "powerpc64"
))]
pub const CACHE_LINE_SIZE: usize = 128;

/// Destructive interference size assumed for the target.
#[cfg(not(any(
    all(target_arch = "aarch64", target_vendor = "apple"),
    target_arch = "powerpc64"
)))]
pub const CACHE_LINE_SIZE: usize = 64;

/// Pads and aligns a value to its own cache line.
///
/// The alignment must be a literal, so it is repeated here for each case of
/// [`CACHE_LINE_SIZE`].
#[cfg_attr(
    any(
        all(target_arch = "aarch64", target_vendor = "apple"),
        target_arch = "powerpc64"
    ),
    repr(align(128))
)]
#[cfg_attr(
    not(any(
        all(target_arch = "aarch64", target_vendor = "apple"),
        target_arch = "powerpc64"
    )),
    repr(align(64))
)]
#[derive(Debug, Default)]
pub struct CachePadded<T> {
    value: T,
}

impl<T> CachePadded<T> {
    /// Wrap `value` in its own cache line
    pub const fn new(value: T) -> Self {
        Self { value }
    }

    /// Unwrap the padded value
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for CachePadded<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for CachePadded<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

/// Number of `T` slots needed to cover one cache line, `ceil(line / size)`.
///
/// Zero-sized types occupy no memory and need no padding.
pub const fn padding_for<T>() -> usize {
    let size = core::mem::size_of::<T>();
    if size == 0 {
        0
    } else {
        (CACHE_LINE_SIZE - 1) / size + 1
    }
}

#[cold]
#[inline(never)]
fn cold_path() {}

/// Hint that `b` is usually true.
#[inline(always)]
pub fn likely(b: bool) -> bool {
    if !b {
        cold_path();
    }
    b
}

/// Hint that `b` is usually false.
#[inline(always)]
pub fn unlikely(b: bool) -> bool {
    if b {
        cold_path();
    }
    b
}

/// Spin-then-yield backoff for CAS retry loops.
#[derive(Debug)]
pub struct Backoff {
    step: usize,
    spin_limit: usize,
}

impl Backoff {
    /// Backoff that spins `spin_limit` times before it starts yielding
    pub fn new(spin_limit: usize) -> Self {
        Self {
            step: 0,
            spin_limit,
        }
    }

    /// Wait a little before the next attempt.
    #[inline]
    pub fn snooze(&mut self) {
        if self.step < self.spin_limit {
            // Grow the burst so contending threads fall out of lockstep.
            for _ in 0..(1usize << self.step.min(6)) {
                sync::spin_loop();
            }
            self.step += 1;
        } else {
            sync::yield_now();
        }
    }

    /// True once the backoff has moved on to yielding
    pub fn is_yielding(&self) -> bool {
        self.step >= self.spin_limit
    }

    /// Start over from the shortest spin
    pub fn reset(&mut self) {
        self.step = 0;
    }
}
