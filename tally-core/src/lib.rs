#![cfg_attr(not(feature = "std"), no_std)]

use core::{alloc::Layout, fmt, num::NonZeroUsize, ptr::NonNull};

/// The allocator could not satisfy a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError;

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("memory allocation failed")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AllocError {}

/// A [Layout] whose size is known to be non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonZeroLayout {
    layout: Layout,
}

impl NonZeroLayout {
    pub const fn new(layout: Layout) -> Option<Self> {
        if layout.size() == 0 {
            None
        } else {
            Some(Self { layout })
        }
    }

    /// The layout of a single `T`, if `T` is not zero-sized.
    #[inline]
    pub const fn of<T>() -> Option<Self> {
        Self::new(Layout::new::<T>())
    }

    pub fn nonzero_size(&self) -> NonZeroUsize {
        let size = self.layout.size();
        unsafe { NonZeroUsize::new_unchecked(size) }
    }

    pub fn size(&self) -> usize {
        self.nonzero_size().get()
    }

    pub fn align(&self) -> usize {
        self.get().align()
    }

    pub fn get(&self) -> Layout {
        self.layout
    }
}

/// Returns storage to the allocator it came from.
///
/// # Safety
/// Implementations must accept every pointer handed out by the paired
/// [Allocate] implementation and must never touch memory they did not hand out.
pub unsafe trait Deallocate {
    /// Deallocates the memory referenced by `ptr`.
    ///
    /// # Safety
    /// - The pointer must be valid and the same as given by a previous call to
    ///   `allocate`.
    /// - The layout must be identical to that used when allocating the pointer.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: NonZeroLayout);

    fn by_ref(&self) -> &Self
    where
        Self: Sized,
    {
        self
    }
}

/// Hands out storage.
///
/// # Safety
/// A successful `allocate` must return a pointer to at least `layout.size()`
/// writable bytes aligned to `layout.align()`, disjoint from every other live
/// allocation.
pub unsafe trait Allocate {
    fn allocate(&self, layout: NonZeroLayout) -> Result<NonNull<u8>, AllocError>;

    fn allocate_zeroed(&self, layout: NonZeroLayout) -> Result<NonNull<u8>, AllocError> {
        let ptr = self.allocate(layout)?;
        unsafe { ptr.as_ptr().write_bytes(0, layout.size()) };
        Ok(ptr)
    }
}

unsafe impl<A> Deallocate for &A
where
    A: Deallocate + ?Sized,
{
    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: NonZeroLayout) {
        unsafe { (**self).deallocate(ptr, layout) }
    }
}

unsafe impl<A> Allocate for &A
where
    A: Allocate + ?Sized,
{
    #[inline]
    fn allocate(&self, layout: NonZeroLayout) -> Result<NonNull<u8>, AllocError> {
        (**self).allocate(layout)
    }

    #[inline]
    fn allocate_zeroed(&self, layout: NonZeroLayout) -> Result<NonNull<u8>, AllocError> {
        (**self).allocate_zeroed(layout)
    }
}
