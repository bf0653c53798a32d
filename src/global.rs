use alloc::alloc::{alloc, alloc_zeroed, dealloc};
use core::ptr::NonNull;

use tally_core::{AllocError, Allocate, Deallocate, NonZeroLayout};

/// The global allocator registered with `#[global_allocator]`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Global;

unsafe impl Deallocate for Global {
    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: NonZeroLayout) {
        unsafe { dealloc(ptr.as_ptr(), layout.get()) };
    }
}

unsafe impl Allocate for Global {
    #[inline]
    fn allocate(&self, layout: NonZeroLayout) -> Result<NonNull<u8>, AllocError> {
        let result = unsafe { alloc(layout.get()) };
        NonNull::new(result).ok_or(AllocError)
    }

    #[inline]
    fn allocate_zeroed(&self, layout: NonZeroLayout) -> Result<NonNull<u8>, AllocError> {
        let result = unsafe { alloc_zeroed(layout.get()) };
        NonNull::new(result).ok_or(AllocError)
    }
}
