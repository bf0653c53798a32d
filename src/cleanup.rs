/// Last words of a value held by a [RefCount](crate::RefCount).
///
/// `cleanup` runs exactly once, when the final reference is released and
/// before the value is dropped in place and its storage handed back to the
/// allocator.
pub trait Cleanup {
    fn cleanup(&mut self);
}

impl Cleanup for () {
    #[inline]
    fn cleanup(&mut self) {}
}

#[cfg(feature = "alloc")]
impl<T> Cleanup for alloc::boxed::Box<T>
where
    T: Cleanup + ?Sized,
{
    #[inline]
    fn cleanup(&mut self) {
        (**self).cleanup()
    }
}
