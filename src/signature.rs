//! Reading a call signature off a function pointer type.
//!
//! Closures and other callable values cannot tell the compiler their
//! signature, so a `Callable` built from them names it in its type. Function
//! pointers can: `fn(u8, u16) -> u32` carries everything needed to pick
//! `dyn Fn(u8, u16) -> u32` as the container's signature.

use crate::callable::Callable;

/// A function pointer type and the trait object signature it implements.
///
/// Implemented for `fn(A0, .., An) -> R` up to eight arguments. Signatures
/// with borrowed arguments (`fn(&mut u8)`) are higher-ranked and are not
/// covered; name them on the container and use [`callable!`] instead.
///
/// [`callable!`]: crate::callable
pub trait Signature: Copy + 'static {
    /// `dyn Fn` with the same arguments and return type.
    type Erased: ?Sized + 'static;

    /// Attach the `Erased` vtable to a pointer to the function pointer.
    fn erase(ptr: *const Self) -> *const Self::Erased;
}

macro_rules! impl_signature {
    ($($arg:ident),*) => {
        impl<R: 'static, $($arg: 'static),*> Signature for fn($($arg),*) -> R {
            type Erased = dyn Fn($($arg),*) -> R;

            #[inline]
            fn erase(ptr: *const Self) -> *const Self::Erased {
                ptr
            }
        }
    };
}

impl_signature!();
impl_signature!(A0);
impl_signature!(A0, A1);
impl_signature!(A0, A1, A2);
impl_signature!(A0, A1, A2, A3);
impl_signature!(A0, A1, A2, A3, A4);
impl_signature!(A0, A1, A2, A3, A4, A5);
impl_signature!(A0, A1, A2, A3, A4, A5, A6);
impl_signature!(A0, A1, A2, A3, A4, A5, A6, A7);

/// Bind a function pointer, taking the signature from its type.
///
/// # Example
///
/// ```
/// fn add(a: i32, b: i32) -> i32 {
///     a + b
/// }
///
/// let add = callbox::deduce(add as fn(i32, i32) -> i32);
/// assert_eq!(add(2, 3), 5);
/// ```
#[inline]
pub fn deduce<P: Signature>(function: P) -> Callable<P::Erased> {
    Callable::from_fn(function)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::any::TypeId;

    fn erased<P: Signature>(_: P) -> TypeId {
        TypeId::of::<P::Erased>()
    }

    #[test]
    fn test_erased_signature() {
        fn nothing() {}
        fn widen(a: u8, b: u16) -> u32 {
            u32::from(a) + u32::from(b)
        }

        assert_eq!(erased(nothing as fn()), TypeId::of::<dyn Fn()>());
        assert_eq!(
            erased(widen as fn(u8, u16) -> u32),
            TypeId::of::<dyn Fn(u8, u16) -> u32>()
        );
    }

    #[test]
    fn test_deduce() {
        fn sum(a: u8, b: u8, c: u8, d: u8, e: u8, f: u8, g: u8, h: u8) -> u32 {
            [a, b, c, d, e, f, g, h].iter().map(|&x| u32::from(x)).sum()
        }

        let callable = deduce(sum as fn(u8, u8, u8, u8, u8, u8, u8, u8) -> u32);
        assert_eq!(callable(1, 2, 3, 4, 5, 6, 7, 8), 36);
        assert_eq!(callable.footprint(), core::mem::size_of::<usize>());
    }
}
