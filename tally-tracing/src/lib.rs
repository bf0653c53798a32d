use std::{fmt::Debug, ptr::NonNull};

use tally_core::{AllocError, Allocate, Deallocate, NonZeroLayout};
use tracing::instrument;

/// Records a `tracing` span for every request passed to the inner allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct Traced<A> {
    inner: A,
}

impl<A> Traced<A> {
    pub const fn new(inner: A) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &A {
        &self.inner
    }

    pub fn into_inner(self) -> A {
        self.inner
    }
}

unsafe impl<A> Allocate for Traced<A>
where
    A: Allocate + Debug,
{
    #[inline]
    #[instrument(level = "trace", ret, err(Debug))]
    fn allocate(&self, layout: NonZeroLayout) -> Result<NonNull<u8>, AllocError> {
        self.inner.allocate(layout)
    }

    #[inline]
    #[instrument(level = "trace", ret, err(Debug))]
    fn allocate_zeroed(&self, layout: NonZeroLayout) -> Result<NonNull<u8>, AllocError> {
        self.inner.allocate_zeroed(layout)
    }
}

unsafe impl<A> Deallocate for Traced<A>
where
    A: Deallocate + Debug,
{
    #[inline]
    #[instrument(level = "trace")]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: NonZeroLayout) {
        unsafe { self.inner.deallocate(ptr, layout) }
    }
}
