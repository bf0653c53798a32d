use core::ptr::NonNull;

use tally_core::{AllocError, Allocate, Deallocate, NonZeroLayout};

/// An allocator that refuses every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct Never;

unsafe impl Deallocate for Never {
    #[inline]
    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: NonZeroLayout) {
        unreachable!("Never does not hand out memory");
    }
}

unsafe impl Allocate for Never {
    #[inline]
    fn allocate(&self, _layout: NonZeroLayout) -> Result<NonNull<u8>, AllocError> {
        Err(AllocError)
    }
}
