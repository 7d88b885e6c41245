//! Re-attach the metadata of a (possibly fat) pointer to a new address.
//!
//! A `Callable` keeps the metadata of `*const F` captured at construction and
//! points it at wherever the adapter currently finds its target.

#[cfg(feature = "nightly")]
mod implementation {
    pub fn attach<F: ?Sized>(addr: *const u8, meta: *const F) -> *const F {
        addr.with_metadata_of(meta)
    }

    pub fn attach_mut<F: ?Sized>(addr: *mut u8, meta: *const F) -> *mut F {
        addr.with_metadata_of(meta)
    }
}

#[cfg(not(feature = "nightly"))]
#[allow(clippy::as_conversions)]
mod implementation {
    use core::ptr::addr_of_mut;

    pub fn attach<F: ?Sized>(addr: *const u8, meta: *const F) -> *const F {
        attach_mut(addr.cast_mut(), meta)
    }

    // The data address is the first word of every pointer layout; `build.rs`
    // checks this for trait objects on the host.
    pub fn attach_mut<F: ?Sized>(addr: *mut u8, mut meta: *const F) -> *mut F {
        let addr_slot = addr_of_mut!(meta).cast::<usize>();
        unsafe { addr_slot.write(addr as usize) }
        meta.cast_mut()
    }
}

pub(crate) use implementation::*;
