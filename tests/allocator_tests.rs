//! Tests for injectable allocation: custom allocators and bump arenas
#![cfg(not(loom))]

use std::{
    ptr::NonNull,
    sync::atomic::{AtomicUsize, Ordering},
};

use spinq::{
    platform::padding_for, Allocator, BumpArena, Global, QueueError, Result, SpmcQueue, SpscQueue,
};

/// Global allocator that records every call it receives
#[derive(Debug, Default)]
struct CountingAllocator {
    allocations: AtomicUsize,
    deallocations: AtomicUsize,
    bytes: AtomicUsize,
    constructs: AtomicUsize,
    destroys: AtomicUsize,
}

unsafe impl Allocator for CountingAllocator {
    fn allocate(&self, size: usize, align: usize) -> Result<NonNull<u8>> {
        self.allocations.fetch_add(1, Ordering::SeqCst);
        self.bytes.store(size, Ordering::SeqCst);
        Global.allocate(size, align)
    }

    fn deallocate(&self, ptr: NonNull<u8>, size: usize, align: usize) -> Result<()> {
        self.deallocations.fetch_add(1, Ordering::SeqCst);
        Global.deallocate(ptr, size, align)
    }

    unsafe fn construct<T>(&self, slot: NonNull<T>, value: T) {
        self.constructs.fetch_add(1, Ordering::SeqCst);
        slot.as_ptr().write(value);
    }

    unsafe fn destroy<T>(&self, slot: NonNull<T>) {
        self.destroys.fetch_add(1, Ordering::SeqCst);
        std::ptr::drop_in_place(slot.as_ptr());
    }
}

/// Allocator that always fails, standing in for out-of-memory
#[derive(Debug)]
struct Exhausted;

unsafe impl Allocator for Exhausted {
    fn allocate(&self, size: usize, align: usize) -> Result<NonNull<u8>> {
        Err(QueueError::allocation_failed(size, align))
    }

    fn deallocate(&self, _ptr: NonNull<u8>, _size: usize, _align: usize) -> Result<()> {
        unreachable!("nothing was allocated")
    }
}

#[cfg(test)]
mod allocator_tests {
    use super::*;

    /// Test: one allocation per queue, sized capacity + 2 * padding
    #[test]
    fn test_single_padded_allocation() {
        let alloc = CountingAllocator::default();
        {
            let (mut tx, mut rx) = SpscQueue::<u64, _>::with_allocator(10, &alloc).unwrap();
            assert_eq!(alloc.allocations.load(Ordering::SeqCst), 1);
            let expected = (10 + 2 * padding_for::<u64>()) * std::mem::size_of::<u64>();
            assert_eq!(alloc.bytes.load(Ordering::SeqCst), expected);

            for i in 0..10u64 {
                assert!(tx.push(i));
            }
            for _ in 0..10 {
                assert!(rx.pop().is_some());
            }
            assert_eq!(alloc.allocations.load(Ordering::SeqCst), 1);
        }
        assert_eq!(alloc.deallocations.load(Ordering::SeqCst), 1);
    }

    /// Test: construct runs per push, destroy only for elements left behind
    #[test]
    fn test_construct_destroy_hooks() {
        let alloc = CountingAllocator::default();
        {
            let (mut tx, rx) = SpmcQueue::<String, _>::with_allocator(8, &alloc).unwrap();
            for i in 0..6 {
                assert!(tx.push(format!("item-{}", i)));
            }
            assert!(!tx.is_full());
            assert_eq!(rx.pop().as_deref(), Some("item-0"));
            assert_eq!(rx.pop().as_deref(), Some("item-1"));

            // Refused pushes construct nothing.
            for i in 6..12 {
                let _ = tx.push(format!("item-{}", i));
            }
            assert_eq!(alloc.constructs.load(Ordering::SeqCst), 10);
            assert_eq!(alloc.destroys.load(Ordering::SeqCst), 0);
        }
        assert_eq!(alloc.destroys.load(Ordering::SeqCst), 8);
        assert_eq!(alloc.deallocations.load(Ordering::SeqCst), 1);
    }

    /// Test: allocation failure surfaces as a construction error
    #[test]
    fn test_allocation_failure_propagates() {
        let err = SpscQueue::<u32, _>::with_allocator(4, Exhausted).unwrap_err();
        assert!(err.is_allocation_error());
        assert!(matches!(err, QueueError::AllocationFailed { .. }));
    }

    /// Test: queue storage lives inside a caller supplied arena
    #[test]
    fn test_queues_share_bump_arena() {
        let mut memory = vec![0u8; 4096];
        let arena = BumpArena::new(&mut memory).unwrap();

        let (mut tx, mut rx) = SpscQueue::<u32, _>::with_allocator(16, &arena).unwrap();
        let first = arena.used_size();
        assert!(first >= (16 + 2 * padding_for::<u32>()) * 4);

        let (mut mtx, mrx) = SpmcQueue::<u64, _>::with_allocator(16, &arena).unwrap();
        assert!(arena.used_size() > first);

        assert!(tx.push(7));
        assert!(mtx.push(8));
        assert_eq!(rx.pop(), Some(7));
        assert_eq!(mrx.pop(), Some(8));
    }

    /// Test: an undersized arena reports insufficient space
    #[test]
    fn test_undersized_arena() {
        let mut memory = vec![0u8; 64];
        let arena = BumpArena::new(&mut memory).unwrap();
        let err = SpscQueue::<u64, _>::with_allocator(64, &arena).unwrap_err();
        assert!(matches!(err, QueueError::InsufficientSpace { .. }));
    }

    /// Test: arena reset once every queue built on it is gone
    #[test]
    fn test_arena_reset_reuses_memory() {
        let mut memory = vec![0u8; 2048];
        let mut arena = BumpArena::new(&mut memory).unwrap();

        for round in 0..3u8 {
            {
                let (mut tx, mut rx) = SpscQueue::<u8, _>::with_allocator(512, &arena).unwrap();
                assert!(tx.push(round));
                assert_eq!(rx.pop(), Some(round));
            }
            assert!(arena.used_size() > 0);
            arena.reset();
            assert_eq!(arena.used_size(), 0);
        }
    }
}
