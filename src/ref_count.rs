use core::{
    fmt,
    marker::PhantomData,
    mem,
    ptr::{self, addr_of, addr_of_mut, NonNull},
};

use tally_core::{AllocError, Allocate, Deallocate, NonZeroLayout};

use crate::{
    cleanup::Cleanup,
    counter::{Counter, Exclusive, Shared},
};
#[cfg(feature = "alloc")]
use crate::Global;

/// A reference counted value that never leaves its thread.
#[cfg(feature = "alloc")]
pub type Rc<T, A = Global> = RefCount<T, Exclusive, A>;
#[cfg(not(feature = "alloc"))]
pub type Rc<T, A> = RefCount<T, Exclusive, A>;

/// A reference counted value that may be acquired and released from any thread.
#[cfg(feature = "alloc")]
pub type Arc<T, A = Global> = RefCount<T, Shared, A>;
#[cfg(not(feature = "alloc"))]
pub type Arc<T, A> = RefCount<T, Shared, A>;

#[non_exhaustive]
#[derive(Debug)]
pub enum TryNewError<T> {
    AllocError { value: T },
}

impl<T> TryNewError<T> {
    /// Takes back the value that could not be placed.
    pub fn into_value(self) -> T {
        match self {
            Self::AllocError { value } => value,
        }
    }
}

impl<T> From<TryNewError<T>> for AllocError {
    fn from(_: TryNewError<T>) -> Self {
        AllocError
    }
}

impl<T> fmt::Display for TryNewError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocError { .. } => fmt::Display::fmt(&AllocError, f),
        }
    }
}

#[cfg(feature = "std")]
impl<T> std::error::Error for TryNewError<T> where T: fmt::Debug {}

/// One counted reference to a heap-allocated value.
///
/// Every `RefCount` accounts for exactly one unit of the shared count and
/// must eventually be handed to [release](RefCount::release). Dropping it
/// instead leaks the value, since nothing is released on scope exit. Wrap it
/// in a [Scoped](crate::Scoped) for that.
///
/// The counting discipline `C` is fixed by the type: [Exclusive] for a plain
/// counter, [Shared] for an atomic one. The allocator `A` is stored next to
/// the value and frees the block once the count reaches zero.
#[must_use = "dropping a RefCount without releasing it leaks the value"]
pub struct RefCount<T, C, A>
where
    C: Counter,
    A: Deallocate,
{
    inner: NonNull<Inner<T, C, A>>,
    _p: PhantomData<Inner<T, C, A>>,
}

unsafe impl<T, C, A> Send for RefCount<T, C, A>
where
    T: Send + Sync,
    C: Counter + Sync,
    A: Deallocate + Send + Sync,
{
}

unsafe impl<T, C, A> Sync for RefCount<T, C, A>
where
    T: Send + Sync,
    C: Counter + Sync,
    A: Deallocate + Send + Sync,
{
}

impl<T, C, A> RefCount<T, C, A>
where
    T: Cleanup,
    C: Counter,
    A: Allocate + Deallocate,
{
    /// Moves `value` into storage obtained from `alloc`, with a count of 1.
    ///
    /// On failure the value is handed back inside the error.
    pub fn try_new_in(value: T, alloc: A) -> Result<Self, TryNewError<T>> {
        let result = NonZeroLayout::of::<Inner<T, C, A>>()
            .ok_or(AllocError)
            .and_then(|layout| alloc.allocate(layout));

        let ptr = match result {
            Ok(ptr) => ptr.cast::<Inner<T, C, A>>(),
            Err(AllocError) => {
                log::debug!(
                    "failed to allocate {} bytes for a reference counted value",
                    mem::size_of::<Inner<T, C, A>>()
                );
                return Err(TryNewError::AllocError { value });
            }
        };

        unsafe {
            ptr.as_ptr().write(Inner {
                counter: C::new(),
                alloc,
                value,
            })
        };
        log::trace!("created reference count at {:p} (atomic: {})", ptr, C::ATOMIC);

        Ok(Self {
            inner: ptr,
            _p: PhantomData,
        })
    }
}

#[cfg(feature = "alloc")]
impl<T, C> RefCount<T, C, Global>
where
    T: Cleanup,
    C: Counter,
{
    #[inline]
    pub fn try_new(value: T) -> Result<Self, TryNewError<T>> {
        Self::try_new_in(value, Global)
    }

    /// Like [try_new](RefCount::try_new), but diverges through
    /// [handle_alloc_error](alloc::alloc::handle_alloc_error) when out of memory.
    pub fn new(value: T) -> Self {
        match Self::try_new(value) {
            Ok(this) => this,
            Err(_) => alloc::alloc::handle_alloc_error(core::alloc::Layout::new::<
                Inner<T, C, Global>,
            >()),
        }
    }
}

impl<T, C, A> RefCount<T, C, A>
where
    C: Counter,
    A: Deallocate,
{
    /// Acquires another reference, returned as its own token.
    #[inline]
    pub fn get_ref(&self) -> Self {
        self.counter().increment();
        Self {
            inner: self.inner,
            _p: PhantomData,
        }
    }

    /// Acquires another reference and returns a pointer to the value.
    ///
    /// The acquisition has no token of its own. Balance it with
    /// [release_untracked](RefCount::release_untracked).
    #[inline]
    pub fn get(&self) -> NonNull<T> {
        self.counter().increment();
        self.leak()
    }

    /// Returns a pointer to the value without acquiring a reference.
    ///
    /// The pointer is only valid while some reference is still held.
    #[inline]
    pub fn leak(&self) -> NonNull<T> {
        unsafe { NonNull::new_unchecked(addr_of_mut!((*self.inner.as_ptr()).value)) }
    }

    /// Registers one more owner without producing a token.
    #[inline]
    pub fn retain(&self) {
        self.counter().increment();
    }

    /// Current number of references.
    ///
    /// For shared counters this is a snapshot that may be stale by the time it
    /// is read. It says nothing about whether destruction is safe.
    #[inline]
    pub fn count(&self) -> usize {
        self.counter().load()
    }

    #[inline]
    pub fn value(&self) -> &T {
        unsafe { &*self.leak().as_ptr() }
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        unsafe { &*addr_of!((*self.inner.as_ptr()).alloc) }
    }

    /// Whether both tokens refer to the same allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }

    #[inline]
    fn counter(&self) -> &C {
        unsafe { &*addr_of!((*self.inner.as_ptr()).counter) }
    }
}

impl<T, C, A> RefCount<T, C, A>
where
    T: Cleanup,
    C: Counter,
    A: Deallocate,
{
    /// Gives up this reference. The last one destroys the value before
    /// returning.
    #[inline]
    pub fn release(self) {
        unsafe { self.release_untracked() }
    }

    /// Gives up a reference acquired through [get](RefCount::get) or
    /// [retain](RefCount::retain).
    ///
    /// Panics if the count is already zero.
    ///
    /// # Safety
    /// Each call must be paired with an earlier `get` or `retain` on the same
    /// allocation that has not been balanced yet. Otherwise the value may be
    /// destroyed while tokens still point at it.
    #[inline]
    pub unsafe fn release_untracked(&self) {
        if self.counter().decrement() {
            unsafe { Inner::destroy(self.inner) };
        }
    }
}

impl<T, C, A> fmt::Debug for RefCount<T, C, A>
where
    T: fmt::Debug,
    C: Counter,
    A: Deallocate,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.value(), f)
    }
}

impl<T, C, A> fmt::Pointer for RefCount<T, C, A>
where
    C: Counter,
    A: Deallocate,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.leak(), f)
    }
}

struct Inner<T, C, A> {
    counter: C,
    alloc: A,
    value: T,
}

impl<T, C, A> Inner<T, C, A>
where
    T: Cleanup,
    C: Counter,
    A: Deallocate,
{
    /// Runs the value's cleanup, drops it and returns the block to its
    /// allocator. If `cleanup` panics the block is leaked.
    ///
    /// # Safety
    /// The count of `ptr` must have just reached zero.
    #[cold]
    #[inline(never)]
    unsafe fn destroy(ptr: NonNull<Self>) {
        log::trace!("destroying reference count at {:p}", ptr);

        let inner = ptr.as_ptr();
        unsafe {
            (*addr_of_mut!((*inner).value)).cleanup();
            ptr::drop_in_place(addr_of_mut!((*inner).value));
            ptr::drop_in_place(addr_of_mut!((*inner).counter));

            let alloc = ptr::read(addr_of!((*inner).alloc));
            if let Some(layout) = NonZeroLayout::of::<Self>() {
                alloc.deallocate(ptr.cast(), layout);
            }
        }
    }
}
