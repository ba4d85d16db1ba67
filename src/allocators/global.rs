//! Default allocator backed by the process-wide Rust global allocator

use std::{alloc::Layout, ptr::NonNull};

use super::traits::Allocator;
use crate::error::{QueueError, Result};

/// Forwards to [`std::alloc::alloc`] / [`std::alloc::dealloc`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Global;

fn layout_for(size: usize, align: usize) -> Result<Layout> {
    if size == 0 {
        return Err(QueueError::invalid_parameter(
            "size",
            "Size must be greater than 0",
        ));
    }
    Layout::from_size_align(size, align).map_err(|_| {
        QueueError::invalid_parameter("align", "Alignment must be a power of 2 and the size must not overflow")
    })
}

unsafe impl Allocator for Global {
    fn allocate(&self, size: usize, align: usize) -> Result<NonNull<u8>> {
        let layout = layout_for(size, align)?;
        // SAFETY: layout has a non-zero size.
        let ptr = unsafe { std::alloc::alloc(layout) };
        NonNull::new(ptr).ok_or_else(|| QueueError::allocation_failed(size, align))
    }

    fn deallocate(&self, ptr: NonNull<u8>, size: usize, align: usize) -> Result<()> {
        let layout = layout_for(size, align)?;
        // SAFETY: the caller hands back a block obtained from `allocate` with
        // this same layout.
        unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) };
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "Global"
    }
}
