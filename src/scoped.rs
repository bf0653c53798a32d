use core::{fmt, mem::ManuallyDrop, ops::Deref};

use tally_core::Deallocate;

use crate::{cleanup::Cleanup, counter::Counter, RefCount};

/// A [RefCount] token that is released when it goes out of scope.
///
/// Cloning acquires a new reference. Dropping releases one.
pub struct Scoped<T, C, A>
where
    T: Cleanup,
    C: Counter,
    A: Deallocate,
{
    rc: ManuallyDrop<RefCount<T, C, A>>,
}

impl<T, C, A> Scoped<T, C, A>
where
    T: Cleanup,
    C: Counter,
    A: Deallocate,
{
    #[inline]
    pub fn new(rc: RefCount<T, C, A>) -> Self {
        Self {
            rc: ManuallyDrop::new(rc),
        }
    }

    /// Hands the token back without releasing it.
    #[inline]
    pub fn into_inner(this: Self) -> RefCount<T, C, A> {
        let mut this = ManuallyDrop::new(this);
        unsafe { ManuallyDrop::take(&mut this.rc) }
    }

    #[inline]
    pub fn as_ref_count(this: &Self) -> &RefCount<T, C, A> {
        &this.rc
    }

    #[inline]
    pub fn count(this: &Self) -> usize {
        this.rc.count()
    }
}

impl<T, C, A> From<RefCount<T, C, A>> for Scoped<T, C, A>
where
    T: Cleanup,
    C: Counter,
    A: Deallocate,
{
    #[inline]
    fn from(rc: RefCount<T, C, A>) -> Self {
        Self::new(rc)
    }
}

impl<T, C, A> Clone for Scoped<T, C, A>
where
    T: Cleanup,
    C: Counter,
    A: Deallocate,
{
    #[inline]
    fn clone(&self) -> Self {
        Self::new(self.rc.get_ref())
    }
}

impl<T, C, A> Deref for Scoped<T, C, A>
where
    T: Cleanup,
    C: Counter,
    A: Deallocate,
{
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.rc.value()
    }
}

impl<T, C, A> Drop for Scoped<T, C, A>
where
    T: Cleanup,
    C: Counter,
    A: Deallocate,
{
    #[inline]
    fn drop(&mut self) {
        unsafe { ManuallyDrop::take(&mut self.rc) }.release();
    }
}

impl<T, C, A> fmt::Debug for Scoped<T, C, A>
where
    T: Cleanup + fmt::Debug,
    C: Counter,
    A: Deallocate,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use core::cell::Cell;

    use super::*;
    use crate::{Arc, Rc};

    struct Flag<'a>(&'a Cell<usize>);

    impl Cleanup for Flag<'_> {
        fn cleanup(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn last_drop_releases() {
        let cleanups = Cell::new(0);
        let a = Scoped::new(Rc::new(Flag(&cleanups)));
        let b = a.clone();
        assert_eq!(Scoped::count(&a), 2);

        drop(a);
        assert_eq!(Scoped::count(&b), 1);
        assert_eq!(cleanups.get(), 0);

        drop(b);
        assert_eq!(cleanups.get(), 1);
    }

    #[test]
    fn into_inner_keeps_the_reference() {
        let scoped: Scoped<_, _, _> = Arc::new(()).into();
        let rc = Scoped::into_inner(scoped);
        assert_eq!(rc.count(), 1);
        rc.release();
    }

    #[test]
    fn derefs_to_the_value() {
        let cleanups = Cell::new(0);
        let scoped = Scoped::from(Rc::new(Flag(&cleanups)));
        assert!(core::ptr::eq(scoped.0, &cleanups));
        assert!(Scoped::as_ref_count(&scoped).ptr_eq(Scoped::as_ref_count(&scoped.clone())));
    }
}
