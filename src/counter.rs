use core::{
    cell::Cell,
    sync::atomic::{self, AtomicUsize, Ordering},
};

/// Upper bound on live references. Exceeding it means the count is about to
/// wrap, which would let the value be destroyed while still referenced.
const MAX_COUNT: usize = isize::MAX as usize;

/// Counting discipline of a [RefCount](crate::RefCount).
///
/// # Safety
/// - A freshly created counter reads exactly 1.
/// - `increment` adds exactly one, `decrement` subtracts exactly one.
/// - `decrement` returns `true` only for the call that moved the count from 1 to
///   0, and that call must observe every write made by earlier decrementers.
pub unsafe trait Counter {
    /// Whether increments and decrements may race across threads.
    const ATOMIC: bool;

    fn new() -> Self;

    fn increment(&self);

    /// Returns `true` if this call released the last reference.
    ///
    /// Panics if the count was already 0.
    fn decrement(&self) -> bool;

    fn load(&self) -> usize;
}

/// Plain counter, for references that never leave one thread.
#[derive(Debug)]
pub struct Exclusive {
    count: Cell<usize>,
}

unsafe impl Counter for Exclusive {
    const ATOMIC: bool = false;

    #[inline]
    fn new() -> Self {
        Self {
            count: Cell::new(1),
        }
    }

    #[inline]
    fn increment(&self) {
        let n = self.count.get();
        if n >= MAX_COUNT {
            overflow();
        }
        self.count.set(n + 1);
    }

    #[inline]
    fn decrement(&self) -> bool {
        let n = self.count.get();
        assert!(n > 0, "reference count underflow");
        self.count.set(n - 1);
        n == 1
    }

    #[inline]
    fn load(&self) -> usize {
        self.count.get()
    }
}

/// Atomic counter, for references shared between threads.
#[derive(Debug)]
pub struct Shared {
    count: AtomicUsize,
}

unsafe impl Counter for Shared {
    const ATOMIC: bool = true;

    #[inline]
    fn new() -> Self {
        Self {
            count: AtomicUsize::new(1),
        }
    }

    #[inline]
    fn increment(&self) {
        // Nothing is published by taking another reference.
        let n = self.count.fetch_add(1, Ordering::Relaxed);
        if n >= MAX_COUNT {
            overflow();
        }
    }

    #[inline]
    fn decrement(&self) -> bool {
        let n = self.count.fetch_sub(1, Ordering::Release);
        if n != 1 {
            assert!(n != 0, "reference count underflow");
            return false;
        }
        // Pairs with the release decrements of every other holder, so their
        // writes to the value are visible to whoever destroys it.
        atomic::fence(Ordering::Acquire);
        true
    }

    #[inline]
    fn load(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[cfg(feature = "std")]
#[cold]
#[inline(never)]
fn overflow() -> ! {
    log::error!("reference count overflow, aborting");
    std::process::abort()
}

#[cfg(not(feature = "std"))]
#[cold]
#[inline(never)]
fn overflow() -> ! {
    panic!("reference count overflow")
}
