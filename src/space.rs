//! Capacity markers for the inline storage of a [`Callable`](crate::Callable).
//!
//! A space type is never instantiated; only its size is used. Any sized type
//! works as a space, so `[u8; 40]` is a 40-byte capacity. The storage is
//! always aligned to at least 16 bytes, whatever the space's own alignment.

/// One machine word.
pub struct S1 {
    _inner: [usize; 1],
}

/// Two machine words.
pub struct S2 {
    _inner: [usize; 2],
}

/// Four machine words. The default capacity.
pub struct S4 {
    _inner: [usize; 4],
}

/// Eight machine words.
pub struct S8 {
    _inner: [usize; 8],
}

/// Sixteen machine words.
pub struct S16 {
    _inner: [usize; 16],
}

/// Thirty-two machine words.
pub struct S32 {
    _inner: [usize; 32],
}

/// Sixty-four machine words.
pub struct S64 {
    _inner: [usize; 64],
}
