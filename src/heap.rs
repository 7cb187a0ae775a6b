//! Global allocator backed by the firmware heap.
//!
//! Enable the `global-allocator` feature on the watch build so `alloc`
//! collections draw from the firmware's `malloc`/`free` slots. Hosted
//! builds keep their system allocator.

use core::alloc::{GlobalAlloc, Layout};
use core::ffi::c_void;
use core::ptr;

use crate::mem;

/// Alignment the firmware heap guarantees for every block.
pub const HOST_ALIGN: usize = 8;

/// Allocator forwarding to the host heap.
///
/// Requests with an alignment above [`HOST_ALIGN`] or a size above
/// `u32::MAX` fail (return null) rather than reaching the host.
pub struct HostAllocator;

impl HostAllocator {
    pub const fn new() -> Self {
        Self
    }

    /// Host request size for `layout`, if the host can satisfy it.
    fn request(layout: Layout) -> Option<u32> {
        if layout.align() > HOST_ALIGN {
            return None;
        }
        u32::try_from(layout.size().max(1)).ok()
    }
}

impl Default for HostAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: blocks come from the host heap with at least `HOST_ALIGN`
// alignment; oversized or over-aligned requests return null.
unsafe impl GlobalAlloc for HostAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        match Self::request(layout) {
            Some(size) => mem::malloc(size).cast(),
            None => ptr::null_mut(),
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        // SAFETY: `ptr` came from `alloc` above.
        unsafe { mem::free(ptr.cast::<c_void>()) }
    }
}

#[cfg(all(feature = "global-allocator", not(test)))]
#[global_allocator]
static GLOBAL_ALLOCATOR: HostAllocator = HostAllocator::new();
