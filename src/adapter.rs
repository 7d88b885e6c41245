//! The holder shapes a [`Callable`](crate::Callable) can store.
//!
//! An adapter wraps the bound entity and exposes a *target*: the value whose
//! `Fn`/`FnMut` implementation is actually called. The set of adapters is
//! closed; they are public only so the [`callable!`](crate::callable) macro can
//! name them.
//!
//! | adapter | holds | target | teardown |
//! |---|---|---|---|
//! | [`Owned`] | the entity by value | the entity | drops the entity |
//! | [`Pointer`] | `&'a T` | the reference | nothing |
//! | [`Bare`] | a function pointer | the pointer | nothing |
//!
//! Shared ownership has no adapter of its own: `callable!(shared: ..)` builds a
//! forwarding closure that captures the `Arc` and stores it as [`Owned`].
//! Every target is reached through a borrow of the container.

mod sealed {
    pub trait Sealed {}
}

/// Common surface of the adapters.
///
/// Sealed: only the adapters in this module implement it.
pub trait Adapter: sealed::Sealed + Clone {
    /// The value that gets called.
    type Target: ?Sized;

    /// Pointer to the target, valid for as long as `self` is not moved or
    /// dropped.
    fn target_ptr(&self) -> *const Self::Target;

    /// Same address as [`Adapter::target_ptr`], derived from a unique borrow.
    fn target_mut_ptr(&mut self) -> *mut Self::Target;
}

/// Holds the entity by value.
#[derive(Clone)]
pub struct Owned<T>(T);

impl<T: Clone> Owned<T> {
    /// Take ownership of `entity`.
    #[inline]
    pub fn new(entity: T) -> Self {
        Owned(entity)
    }
}

impl<T> sealed::Sealed for Owned<T> {}

impl<T: Clone> Adapter for Owned<T> {
    type Target = T;

    #[inline]
    fn target_ptr(&self) -> *const T {
        &self.0
    }

    #[inline]
    fn target_mut_ptr(&mut self) -> *mut T {
        &mut self.0
    }
}

/// Refers to an entity owned elsewhere.
///
/// The target is the reference itself, which is callable through a shared
/// borrow whenever `T: Fn`. That is what keeps a `Callable<dyn FnMut(..)>`
/// built from a `Pointer` from ever handing out `&mut T`.
pub struct Pointer<'a, T: ?Sized>(&'a T);

impl<'a, T: ?Sized> Pointer<'a, T> {
    /// Borrow `entity` for `'a`.
    #[inline]
    pub fn new(entity: &'a T) -> Self {
        Pointer(entity)
    }
}

impl<T: ?Sized> Clone for Pointer<'_, T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Pointer<'_, T> {}

impl<T: ?Sized> sealed::Sealed for Pointer<'_, T> {}

impl<'a, T: ?Sized> Adapter for Pointer<'a, T> {
    type Target = &'a T;

    #[inline]
    fn target_ptr(&self) -> *const &'a T {
        &self.0
    }

    #[inline]
    fn target_mut_ptr(&mut self) -> *mut &'a T {
        &mut self.0
    }
}

/// Holds a plain function pointer (or a function item).
#[derive(Clone, Copy)]
pub struct Bare<P>(P);

impl<P: Copy> Bare<P> {
    /// Store `function`.
    #[inline]
    pub fn new(function: P) -> Self {
        Bare(function)
    }
}

impl<P> sealed::Sealed for Bare<P> {}

impl<P: Copy> Adapter for Bare<P> {
    type Target = P;

    #[inline]
    fn target_ptr(&self) -> *const P {
        &self.0
    }

    #[inline]
    fn target_mut_ptr(&mut self) -> *mut P {
        &mut self.0
    }
}

#[cfg(test)]
#[allow(clippy::as_conversions)]
mod tests {
    use super::*;
    use alloc::sync::Arc;
    use core::mem;

    #[test]
    fn test_targets_are_inside_the_adapter() {
        let owned = Owned::new([1u64, 2, 3]);
        let base = &owned as *const _ as usize;
        let target = owned.target_ptr() as *const u8 as usize;
        assert!(target >= base && target < base + mem::size_of_val(&owned));

        let value = 7u32;
        let pointer = Pointer::new(&value);
        assert_eq!(pointer.target_ptr() as *const u8, &pointer as *const _ as *const u8);
        assert_eq!(unsafe { **pointer.target_ptr() }, 7);
    }

    #[test]
    fn test_drop_glue() {
        assert!(!mem::needs_drop::<Pointer<'static, String>>());
        assert!(!mem::needs_drop::<Bare<fn(u8) -> u8>>());
        assert!(mem::needs_drop::<Owned<String>>());
        assert!(mem::needs_drop::<Owned<Arc<str>>>());
    }
}
