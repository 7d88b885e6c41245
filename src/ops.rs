//! Operation table for the adapter stored in a [`Callable`](crate::Callable).
//!
//! Once an adapter is written into the inline storage its concrete type is
//! forgotten. [`Ops`] keeps the handful of functions that still need it,
//! instantiated for that type when the table is created. Calls themselves go
//! through the trait object metadata of `F`; the table only tells the
//! container where the call target lives.
//!
//! # Safety Invariant
//!
//! Every function in an [`Ops`] returned by [`Ops::of::<A>`] must only ever be
//! handed storage that holds a live `A` (or, for the destination of
//! `duplicate` and `relocate`, storage that holds nothing and fits an `A`).
//! The container keeps the table next to the storage and sets or clears them
//! together.

use core::marker::PhantomData;
use core::mem;
use core::ptr;

use crate::adapter::Adapter;

pub(crate) struct Ops {
    /// Size of the adapter in bytes.
    size: usize,
    /// Alignment of the adapter in bytes.
    align: usize,
    locate: unsafe fn(*const u8) -> *const u8,
    locate_mut: unsafe fn(*mut u8) -> *mut u8,
    /// `None` when the adapter has no drop glue.
    teardown: Option<unsafe fn(*mut u8)>,
    duplicate: unsafe fn(*const u8, *mut u8),
    relocate: unsafe fn(*mut u8, *mut u8),
}

struct Table<A>(PhantomData<fn() -> A>);

impl<A: Adapter> Table<A> {
    const OPS: &'static Ops = &Ops {
        size: mem::size_of::<A>(),
        align: mem::align_of::<A>(),
        locate: locate::<A>,
        locate_mut: locate_mut::<A>,
        teardown: if mem::needs_drop::<A>() {
            Some(teardown::<A>)
        } else {
            None
        },
        duplicate: duplicate::<A>,
        relocate: relocate::<A>,
    };
}

impl Ops {
    /// The table for adapter type `A`.
    #[inline]
    pub(crate) fn of<A: Adapter>() -> &'static Ops {
        Table::<A>::OPS
    }

    #[inline]
    pub(crate) fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub(crate) fn align(&self) -> usize {
        self.align
    }

    /// Address of the call target inside the adapter at `storage`.
    ///
    /// # Safety
    ///
    /// `storage` must hold a live adapter of the type this table was made for.
    #[inline]
    pub(crate) unsafe fn locate(&self, storage: *const u8) -> *const u8 {
        unsafe { (self.locate)(storage) }
    }

    /// Like [`Ops::locate`], but derived from a unique borrow of the storage.
    ///
    /// # Safety
    ///
    /// `storage` must hold a live adapter of the type this table was made for.
    #[inline]
    pub(crate) unsafe fn locate_mut(&self, storage: *mut u8) -> *mut u8 {
        unsafe { (self.locate_mut)(storage) }
    }

    /// Drops the adapter at `storage` in place.
    ///
    /// # Safety
    ///
    /// `storage` must hold a live adapter of the type this table was made for,
    /// and it must not be used as one afterwards.
    #[inline]
    pub(crate) unsafe fn teardown(&self, storage: *mut u8) {
        if let Some(teardown) = self.teardown {
            unsafe { teardown(storage) }
        }
    }

    /// Clones the adapter at `src` into `dst`.
    ///
    /// # Safety
    ///
    /// `src` must hold a live adapter of the type this table was made for.
    /// `dst` must not hold a live value and must be large and aligned enough
    /// for the adapter.
    #[inline]
    pub(crate) unsafe fn duplicate(&self, src: *const u8, dst: *mut u8) {
        unsafe { (self.duplicate)(src, dst) }
    }

    /// Moves the adapter at `src` into `dst`. `src` is left logically
    /// uninitialized.
    ///
    /// # Safety
    ///
    /// Same as [`Ops::duplicate`], and `src` must not be used as an adapter
    /// afterwards.
    #[inline]
    pub(crate) unsafe fn relocate(&self, src: *mut u8, dst: *mut u8) {
        unsafe { (self.relocate)(src, dst) }
    }
}

unsafe fn locate<A: Adapter>(storage: *const u8) -> *const u8 {
    let adapter: &A = unsafe { &*storage.cast::<A>() };
    adapter.target_ptr().cast::<u8>()
}

unsafe fn locate_mut<A: Adapter>(storage: *mut u8) -> *mut u8 {
    let adapter: &mut A = unsafe { &mut *storage.cast::<A>() };
    adapter.target_mut_ptr().cast::<u8>()
}

unsafe fn teardown<A: Adapter>(storage: *mut u8) {
    unsafe { ptr::drop_in_place(storage.cast::<A>()) }
}

unsafe fn duplicate<A: Adapter>(src: *const u8, dst: *mut u8) {
    let adapter: &A = unsafe { &*src.cast::<A>() };
    let copy = adapter.clone();
    unsafe { dst.cast::<A>().write(copy) }
}

unsafe fn relocate<A: Adapter>(src: *mut u8, dst: *mut u8) {
    unsafe { dst.cast::<A>().write(src.cast::<A>().read()) }
}
