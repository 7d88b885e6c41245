use thiserror::Error;

/// Returned (or raised as a panic payload) when an empty [`Callable`] is
/// invoked.
///
/// This is the only failure a `Callable` produces at run time. Rebinding the
/// container recovers from it.
///
/// [`Callable`]: crate::Callable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Error)]
#[error("called an empty `Callable`; bind a callable before invoking it")]
pub struct EmptyCallable;

impl EmptyCallable {
    /// Abort the current call with this error.
    ///
    /// With `std` the panic payload is the `EmptyCallable` value itself, so it
    /// can be told apart from other panics after `catch_unwind`.
    #[cold]
    #[track_caller]
    pub(crate) fn raise(self) -> ! {
        #[cfg(feature = "std")]
        {
            std::panic::panic_any(self)
        }
        #[cfg(not(feature = "std"))]
        {
            panic!("{}", self)
        }
    }
}
