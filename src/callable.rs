use core::fmt;
use core::marker::PhantomData;
use core::mem::{self, ManuallyDrop, MaybeUninit};
use core::ops;

#[cfg(feature = "coerce")]
use core::marker::Unsize;

use crate::adapter::{Adapter, Bare};
use crate::error::EmptyCallable;
use crate::ops::Ops;
use crate::signature::Signature;
use crate::space::S4;
use crate::sptr;

/// Bind a callable entity into a [`Callable`].
///
/// The signature comes from the expected type: the entity is checked against
/// it (and rejected at build time if it does not implement it) and the
/// resulting adapter must fit the container's space.
///
/// | form | adapter |
/// |---|---|
/// | `callable!(value)` | owns `value` |
/// | `callable!(ref: &value)` | borrows `value` |
/// | `callable!(shared: arc => (a: A, ..))` | shares an `Arc` |
/// | `callable!(fn: function)` | stores a function pointer |
///
/// Any of the first three may bind a method instead of the entity's own call
/// operator: `callable!(value => Type::method(a: A, b: B))` calls
/// `Type::method(&value, a, b)`. Prefix an owned value with `mut` to pass it as
/// `&mut value`. A shared entity always names its parameters, with or without
/// a method: `callable!(shared: arc => (a: A))` calls `(*arc)(a)`. The
/// parameter list is spelled out so that borrowed arguments are accepted for
/// any lifetime.
///
/// The signature must be a trait object type; the entity's target is coerced
/// to it, never cast.
///
/// # Example
///
/// ```
/// use callbox::{callable, Callable};
///
/// #[derive(Clone)]
/// struct Scale(i32);
///
/// impl Scale {
///     fn apply(&self, value: i32) -> i32 {
///         self.0 * value
///     }
/// }
///
/// let offset = 10;
/// let add: Callable<dyn Fn(i32) -> i32> = callable!(move |x: i32| x + offset);
/// let scale: Callable<dyn Fn(i32) -> i32> = callable!(Scale(3) => Scale::apply(value: i32));
///
/// assert_eq!(add(1), 11);
/// assert_eq!(scale(2), 6);
/// ```
///
/// An entity that does not fit the space is rejected when the program is
/// built:
///
/// ```compile_fail
/// use callbox::{callable, Callable};
/// use callbox::space::S1;
///
/// let table = [0u64; 8];
/// let lookup: Callable<dyn Fn(usize) -> u64, S1> = callable!(move |i: usize| table[i]);
/// ```
///
/// So is one that does not have the requested signature:
///
/// ```compile_fail
/// use callbox::{callable, Callable};
///
/// let wrong: Callable<dyn Fn(i32) -> i32> = callable!(|x: u8| x);
/// ```
///
/// A sized type is not a signature, so the stored value cannot be read back as
/// some other type:
///
/// ```compile_fail
/// use callbox::{callable, Callable};
/// use callbox::space::S2;
///
/// let text: Callable<&'static str, S2> = callable!((1usize, 3usize));
/// ```
///
/// ```compile_fail
/// use callbox::{callable, Callable};
/// use callbox::space::S2;
///
/// let pair: Callable<(usize, usize), S2> = callable!((1usize, 3usize));
/// ```
///
/// Nor can a shared entity be bound as a plain reference:
///
/// ```compile_fail
/// use std::sync::Arc;
/// use callbox::{callable, Callable};
///
/// let escaped: Callable<&'static Vec<u8>> = callable!(shared: Arc::new(vec![7u8; 4]));
/// ```
///
/// ```compile_fail
/// use std::sync::Arc;
/// use callbox::{callable, Callable};
///
/// let escaped: Callable<Vec<u8>> = callable!(shared: Arc::new(vec![7u8; 4]) => ());
/// ```
#[macro_export]
macro_rules! callable {
    (ref: $e:expr => $($sel:ident)::+ ( $($arg:ident : $ty:ty),* $(,)? )) => {{
        let object = $e;
        $crate::callable!(@bind $crate::adapter::Owned::new(
            move |$($arg: $ty),*| $($sel)::+(object, $($arg),*)
        ))
    }};
    (ref: $e:expr) => {
        $crate::callable!(@bind $crate::adapter::Pointer::new($e))
    };
    (shared: $e:expr => ( $($arg:ident : $ty:ty),* $(,)? )) => {{
        let handle: $crate::__private::Arc<_> = $e;
        $crate::callable!(@bind $crate::adapter::Owned::new(
            move |$($arg: $ty),*| (*handle)($($arg),*)
        ))
    }};
    (shared: $e:expr => $($sel:ident)::+ ( $($arg:ident : $ty:ty),* $(,)? )) => {{
        let handle: $crate::__private::Arc<_> = $e;
        $crate::callable!(@bind $crate::adapter::Owned::new(
            move |$($arg: $ty),*| $($sel)::+(&*handle, $($arg),*)
        ))
    }};
    (shared: $e:expr) => {
        ::core::compile_error!(
            "a shared entity needs its parameter list: `callable!(shared: arc => (a: A, ..))`"
        )
    };
    (fn: $e:expr) => {
        $crate::callable!(@bind $crate::adapter::Bare::new($e))
    };
    (mut $e:expr => $($sel:ident)::+ ( $($arg:ident : $ty:ty),* $(,)? )) => {{
        let mut object = $e;
        $crate::callable!(@bind $crate::adapter::Owned::new(
            move |$($arg: $ty),*| $($sel)::+(&mut object, $($arg),*)
        ))
    }};
    (@bind $adapter:expr) => {{
        let adapter = $adapter;
        let target = $crate::adapter::Adapter::target_ptr(&adapter);
        // `target` reaches the signature by coercion only: unsizing or identity.
        #[allow(unsafe_code)]
        unsafe {
            $crate::Callable::from_adapter_unchecked(adapter, target)
        }
    }};
    ($e:expr => $($sel:ident)::+ ( $($arg:ident : $ty:ty),* $(,)? )) => {{
        let object = $e;
        $crate::callable!(@bind $crate::adapter::Owned::new(
            move |$($arg: $ty),*| $($sel)::+(&object, $($arg),*)
        ))
    }};
    ($e:expr) => {
        $crate::callable!(@bind $crate::adapter::Owned::new($e))
    };
}

// Over-aligns the storage to the largest scalar alignment.
#[repr(align(16))]
struct MaxAlign;

#[repr(C)]
struct Storage<Space> {
    _align: [MaxAlign; 0],
    bytes: MaybeUninit<Space>,
}

impl<Space> Storage<Space> {
    const SIZE: usize = mem::size_of::<Space>();
    const ALIGN: usize = mem::align_of::<Self>();

    const fn uninit() -> Self {
        Storage {
            _align: [],
            bytes: MaybeUninit::uninit(),
        }
    }
}

// Build-time check that adapter `A` fits `Space` and that `F` is unsized.
struct Fits<A, F: ?Sized, Space>(PhantomData<(fn() -> A, fn() -> Space, fn(*const F))>);

impl<A, F: ?Sized, Space> Fits<A, F, Space> {
    const OK: () = {
        assert!(
            mem::size_of::<*const F>() > mem::size_of::<*const u8>(),
            "the signature of a `Callable` must be a trait object such as `dyn Fn(..)`"
        );
        assert!(
            mem::size_of::<A>() <= Storage::<Space>::SIZE,
            "this callable does not fit the `Callable`'s space; use a larger space or capture less state"
        );
        assert!(
            mem::align_of::<A>() <= Storage::<Space>::ALIGN,
            "this callable is aligned beyond what a `Callable` can store inline"
        );
    };
}

struct Binding<F: ?Sized> {
    ops: &'static Ops,
    // Only the metadata half is meaningful; the address is re-attached on
    // every access.
    meta: *const F,
}

impl<F: ?Sized> Clone for Binding<F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F: ?Sized> Copy for Binding<F> {}

/// A callable of signature `F`, stored inline in `Space`.
///
/// `F` is normally a trait object type such as `dyn Fn(i32) -> i32` or
/// `dyn FnMut(&mut Vec<u8>)`. The container derefs to `F`, so it is called like
/// the entity it holds:
///
/// ```
/// use callbox::{callable, Callable};
///
/// let mut total = 0;
/// let mut record: Callable<dyn FnMut(i32) -> i32> = callable!(move |x: i32| {
///     total += x;
///     total
/// });
/// assert_eq!((*record)(2), 2);
/// assert_eq!((*record)(3), 5);
/// ```
///
/// Bound entities must be `Clone`, since the container is.
///
/// Calling an empty container panics with an [`EmptyCallable`] payload; use
/// [`Callable::try_get`] or [`Callable::try_get_mut`] to get the error as a
/// value instead.
pub struct Callable<F: ?Sized, Space = S4> {
    storage: Storage<Space>,
    binding: Option<Binding<F>>,
    _phantom: PhantomData<F>,
}

impl<F: ?Sized, Space> Callable<F, Space> {
    /// An empty container.
    ///
    /// # Example
    ///
    /// ```
    /// use callbox::Callable;
    ///
    /// let empty: Callable<dyn Fn()> = Callable::new();
    /// assert!(empty.is_empty());
    /// assert!(empty.try_get().is_err());
    /// ```
    #[inline]
    pub const fn new() -> Self {
        Callable {
            storage: Storage::uninit(),
            binding: None,
            _phantom: PhantomData,
        }
    }

    /// Store `adapter`, to be called through `meta`'s metadata.
    ///
    /// This is what [`callable!`] expands to.
    ///
    /// # Safety
    ///
    /// `meta` must be `adapter.target_ptr()` coerced (not cast) to
    /// `*const F`, or at least carry metadata valid for the target type of
    /// `A`.
    #[doc(hidden)]
    #[inline]
    pub unsafe fn from_adapter_unchecked<A: Adapter>(adapter: A, meta: *const F) -> Self {
        let mut this = Self::new();
        unsafe { this.bind(adapter, meta) };
        this
    }

    /// Bind a function pointer; the signature is that of the pointer type.
    ///
    /// # Example
    ///
    /// ```
    /// use callbox::Callable;
    /// use callbox::space::S1;
    ///
    /// fn double(x: u32) -> u32 {
    ///     x * 2
    /// }
    ///
    /// let double: Callable<dyn Fn(u32) -> u32, S1> = Callable::from_fn(double as fn(u32) -> u32);
    /// assert_eq!(double(21), 42);
    /// ```
    #[inline]
    pub fn from_fn<P>(function: P) -> Self
    where
        P: Signature<Erased = F>,
    {
        let adapter = Bare::new(function);
        let meta = P::erase(adapter.target_ptr());
        unsafe { Self::from_adapter_unchecked(adapter, meta) }
    }

    /// Own `entity`, coercing it to `F` automatically.
    ///
    /// # Example
    ///
    /// ```
    /// # #[cfg(feature = "coerce")]
    /// # {
    /// use callbox::Callable;
    ///
    /// let square: Callable<dyn Fn(u64) -> u64> = Callable::from_value(|x: u64| x * x);
    /// assert_eq!(square(9), 81);
    /// # }
    /// ```
    #[cfg(feature = "coerce")]
    #[inline]
    pub fn from_value<T>(entity: T) -> Self
    where
        T: Unsize<F> + Clone,
    {
        let adapter = crate::adapter::Owned::new(entity);
        let meta: *const F = adapter.target_ptr();
        unsafe { Self::from_adapter_unchecked(adapter, meta) }
    }

    /// Returns true if nothing is bound.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.binding.is_none()
    }

    /// Bytes of inline storage available.
    #[inline]
    pub const fn capacity(&self) -> usize {
        Storage::<Space>::SIZE
    }

    /// Bytes of inline storage the bound adapter occupies, or 0 when empty.
    ///
    /// # Example
    ///
    /// ```
    /// use callbox::{callable, Callable};
    ///
    /// let state = [1u64, 2, 3];
    /// let owned: Callable<dyn Fn() -> u64> = callable!(move || state.iter().sum());
    /// let six = || 6u64;
    /// let borrowed: Callable<dyn Fn() -> u64 + '_> = callable!(ref: &six);
    ///
    /// assert_eq!(owned.footprint(), 24);
    /// assert_eq!(borrowed.footprint(), std::mem::size_of::<usize>());
    /// ```
    #[inline]
    pub fn footprint(&self) -> usize {
        self.binding.map_or(0, |binding| binding.ops.size())
    }

    /// Borrow the bound callable, or fail if the container is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use callbox::{callable, Callable, EmptyCallable};
    ///
    /// let mut negate: Callable<dyn Fn(i8) -> i8> = callable!(|x: i8| -x);
    /// assert_eq!(negate.try_get().map(|f| f(4)), Ok(-4));
    ///
    /// negate.clear();
    /// assert_eq!(negate.try_get().map(|f| f(4)), Err(EmptyCallable));
    /// ```
    #[inline]
    pub fn try_get(&self) -> Result<&F, EmptyCallable> {
        let binding = self.binding.ok_or(EmptyCallable)?;
        unsafe {
            let target = binding.ops.locate(self.as_ptr());
            Ok(&*sptr::attach(target, binding.meta))
        }
    }

    /// Mutably borrow the bound callable, or fail if the container is empty.
    ///
    /// Needed to call `FnMut` signatures.
    #[inline]
    pub fn try_get_mut(&mut self) -> Result<&mut F, EmptyCallable> {
        let binding = self.binding.ok_or(EmptyCallable)?;
        unsafe {
            let target = binding.ops.locate_mut(self.as_mut_ptr());
            Ok(&mut *sptr::attach_mut(target, binding.meta))
        }
    }

    /// Tear down the bound adapter, leaving the container empty.
    ///
    /// Calling it on an empty container does nothing.
    #[inline]
    pub fn clear(&mut self) {
        // Marked empty before the teardown runs, so a panicking drop cannot
        // lead to a second one.
        if let Some(binding) = self.binding.take() {
            unsafe { binding.ops.teardown(self.as_mut_ptr()) }
        }
    }

    /// Move the binding out, leaving this container empty.
    ///
    /// # Example
    ///
    /// ```
    /// use callbox::{callable, Callable};
    ///
    /// let mut source: Callable<dyn Fn() -> u8> = callable!(|| 7u8);
    /// let target = source.take();
    ///
    /// assert!(source.is_empty());
    /// assert_eq!(target(), 7);
    /// ```
    #[inline]
    pub fn take(&mut self) -> Self {
        mem::replace(self, Self::new())
    }

    /// Bind `other`'s callable here and return the one previously bound.
    #[inline]
    pub fn replace(&mut self, other: Self) -> Self {
        mem::replace(self, other)
    }

    /// Move the binding into a container with a different space.
    ///
    /// Fails and gives the container back if the adapter does not fit the
    /// new space. An empty container always converts.
    ///
    /// # Example
    ///
    /// ```
    /// use callbox::{callable, Callable};
    /// use callbox::space::{S1, S4, S8};
    ///
    /// let state = [3u64; 3];
    /// let sum: Callable<dyn Fn() -> u64, S4> = callable!(move || state.iter().sum());
    ///
    /// let sum = sum.resize::<S1>().unwrap_err();
    /// let sum = sum.resize::<S8>().ok().unwrap();
    /// assert_eq!(sum(), 9);
    /// ```
    pub fn resize<ToSpace>(self) -> Result<Callable<F, ToSpace>, Self> {
        let Some(binding) = self.binding else {
            return Ok(Callable::new());
        };
        if binding.ops.size() > Storage::<ToSpace>::SIZE
            || binding.ops.align() > Storage::<ToSpace>::ALIGN
        {
            return Err(self);
        }

        let mut this = ManuallyDrop::new(self);
        let mut resized = Callable::<F, ToSpace>::new();
        unsafe { binding.ops.relocate(this.as_mut_ptr(), resized.as_mut_ptr()) };
        resized.binding = Some(binding);
        Ok(resized)
    }

    /// # Safety
    ///
    /// Same as [`Callable::from_adapter_unchecked`]; any previous binding
    /// must already be torn down.
    unsafe fn bind<A: Adapter>(&mut self, adapter: A, meta: *const F) {
        #[allow(clippy::let_unit_value)]
        let () = Fits::<A, F, Space>::OK;
        debug_assert!(self.is_empty());

        unsafe { self.as_mut_ptr().cast::<A>().write(adapter) };
        self.binding = Some(Binding {
            ops: Ops::of::<A>(),
            meta,
        });
    }

    #[inline]
    fn as_ptr(&self) -> *const u8 {
        self.storage.bytes.as_ptr().cast()
    }

    #[inline]
    fn as_mut_ptr(&mut self) -> *mut u8 {
        self.storage.bytes.as_mut_ptr().cast()
    }
}

impl<F: ?Sized, Space> Default for Callable<F, Space> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized, Space> ops::Deref for Callable<F, Space> {
    type Target = F;

    #[track_caller]
    fn deref(&self) -> &F {
        match self.try_get() {
            Ok(callable) => callable,
            Err(empty) => empty.raise(),
        }
    }
}

impl<F: ?Sized, Space> ops::DerefMut for Callable<F, Space> {
    #[track_caller]
    fn deref_mut(&mut self) -> &mut F {
        match self.try_get_mut() {
            Ok(callable) => callable,
            Err(empty) => empty.raise(),
        }
    }
}

impl<F: ?Sized, Space> ops::Drop for Callable<F, Space> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<F: ?Sized, Space> Clone for Callable<F, Space> {
    fn clone(&self) -> Self {
        let mut copy = Self::new();
        copy.clone_from(self);
        copy
    }

    /// Tears down the current binding before duplicating `source`'s into the
    /// same storage.
    fn clone_from(&mut self, source: &Self) {
        self.clear();
        if let Some(binding) = source.binding {
            unsafe { binding.ops.duplicate(source.as_ptr(), self.as_mut_ptr()) };
            self.binding = Some(binding);
        }
    }
}

impl<F: ?Sized, Space> fmt::Debug for Callable<F, Space> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Callable")
            .field("empty", &self.is_empty())
            .field("footprint", &self.footprint())
            .field("capacity", &self.capacity())
            .finish()
    }
}

// Every adapter is `Send`/`Sync` exactly when its target is, and the target
// was coerced to `F`, which checked those bounds.
unsafe impl<F: ?Sized + Send, Space> Send for Callable<F, Space> {}
unsafe impl<F: ?Sized + Sync, Space> Sync for Callable<F, Space> {}

#[cfg(test)]
#[allow(clippy::as_conversions)]
mod tests {
    use super::Callable;
    use crate::space::*;
    use crate::EmptyCallable;
    use alloc::sync::Arc;
    use core::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_basic() {
        let offset = 5;
        let add: Callable<dyn Fn(i32) -> i32, S1> = callable!(move |x: i32| x + offset);
        assert!(!add.is_empty());
        assert_eq!(add(1), 6);
        assert_eq!((*add)(2), 7);
    }

    #[test]
    #[deny(unsafe_code)]
    fn test_macro() {
        let is_even: Callable<dyn Fn(u8) -> bool, S1> = callable!(|num: u8| num % 2 == 0);
        assert!(!is_even(5));
        assert!(is_even(6));

        let mut count = 0u32;
        let mut bump: Callable<dyn FnMut() -> u32, S1> = callable!(move || {
            count += 1;
            count
        });
        assert_eq!((*bump)(), 1);
        assert_eq!((*bump)(), 2);
    }

    #[test]
    fn test_empty() {
        let empty: Callable<dyn Fn()> = Callable::new();
        assert!(empty.is_empty());
        assert_eq!(empty.footprint(), 0);
        assert_eq!(empty.try_get().err(), Some(EmptyCallable));

        let mut default: Callable<dyn FnMut(), S2> = Default::default();
        assert_eq!(default.try_get_mut().err(), Some(EmptyCallable));
    }

    #[test]
    fn test_clear_is_idempotent() {
        #[derive(Clone)]
        struct Counted<'a>(&'a Cell<u32>);
        impl Drop for Counted<'_> {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let drops = Cell::new(0);
        let counted = Counted(&drops);
        let mut callable: Callable<dyn Fn() + '_, S1> = callable!(move || {
            let _held = &counted;
        });
        callable.clear();
        assert_eq!(drops.get(), 1);
        callable.clear();
        drop(callable);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_dont_drop_space() {
        struct NoDrop(S1);
        impl Drop for NoDrop {
            fn drop(&mut self) {
                unreachable!();
            }
        }

        let callable: Callable<dyn Fn() -> bool, NoDrop> = callable!(|| true);
        assert!(callable());
        drop(callable);
        drop(Callable::<dyn Fn(), NoDrop>::new());
    }

    #[test]
    fn test_zero_sized() {
        let unit: Callable<dyn Fn() -> u8, [u8; 0]> = callable!(|| 1u8);
        assert_eq!(unit.footprint(), 0);
        assert_eq!(unit.capacity(), 0);
        assert_eq!(unit(), 1);
    }

    #[test]
    fn test_alignment() {
        #[derive(Clone, Copy)]
        #[repr(align(16))]
        struct Wide(u128);

        let wide = Wide(40);
        let callable: Callable<dyn Fn() -> u128, S2> = callable!(move || wide.0 + 2);
        assert_eq!(callable(), 42);
        let addr = callable.as_ptr() as usize;
        assert_eq!(addr % 16, 0);
    }

    #[test]
    fn test_resize() {
        let state = [1usize; 2];
        let m: Callable<dyn Fn() -> usize, S4> = callable!(move || state.iter().sum());
        let l = m.resize::<S8>().ok().unwrap();
        assert_eq!(l.footprint(), 2 * core::mem::size_of::<usize>());
        let m = l.resize::<S4>().ok().unwrap();
        let s = m.resize::<S2>().ok().unwrap();
        let xs = s.resize::<S1>().unwrap_err();
        assert_eq!(xs(), 2);

        let empty: Callable<dyn Fn() -> usize, S8> = Callable::new();
        assert!(empty.resize::<S1>().ok().unwrap().is_empty());
    }

    #[test]
    fn test_resize_keeps_shared_state() {
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let callable: Callable<dyn Fn(), S1> = callable!(move || counter.set(counter.get() + 1));
        let callable = callable.resize::<S16>().ok().unwrap();
        callable();
        assert_eq!(hits.get(), 1);
        assert_eq!(Rc::strong_count(&hits), 2);
        drop(callable);
        assert_eq!(Rc::strong_count(&hits), 1);
    }

    #[test]
    fn test_shared_outlives_handle() {
        let handle = Arc::new(|x: u32| x + 1);
        let weak = Arc::downgrade(&handle);
        let callable: Callable<dyn Fn(u32) -> u32, S1> =
            callable!(shared: Arc::clone(&handle) => (x: u32));
        drop(handle);
        assert_eq!(callable(1), 2);
        assert_eq!(callable.footprint(), core::mem::size_of::<usize>());

        let copy = callable.clone();
        drop(callable);
        assert_eq!(copy(2), 3);
        drop(copy);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_debug() {
        let empty: Callable<dyn Fn(), S2> = Callable::new();
        assert_eq!(
            format!("{:?}", empty),
            format!(
                "Callable {{ empty: true, footprint: 0, capacity: {} }}",
                2 * core::mem::size_of::<usize>()
            )
        );
    }

    #[test]
    #[cfg(feature = "coerce")]
    fn test_coerce() {
        let stacked: Callable<dyn Fn(u32) -> u32, S1> = Callable::from_value(|x: u32| x + 1);
        assert_eq!(stacked(1), 2);
    }
}
