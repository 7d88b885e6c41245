//! # callbox: Callables Without the Heap
//!
//! [`Callable`] holds any callable entity of a given signature (a closure, a
//! function, a method bound to an object, something behind a reference or an
//! [`Arc`](alloc::sync::Arc)) and stores it inline, in a fixed-size buffer
//! inside the `Callable` itself. Nothing is ever allocated by the container.
//!
//! ## Core Concept
//!
//! `Box<dyn Fn(..)>` always allocates. A [`Callable`] reserves a configurable
//! amount of inline space instead and refuses to build a program that tries
//! to put a larger entity in it. The signature is a trait object type, and the
//! container derefs to it:
//!
//! ```rust
//! use callbox::{callable, Callable};
//!
//! let factor = 3;
//! let triple: Callable<dyn Fn(i32) -> i32> = callable!(move |x: i32| x * factor);
//! assert_eq!(triple(14), 42);
//! ```
//!
//! Borrowed arguments keep their meaning. A `&mut` argument sees what the
//! callee writes:
//!
//! ```rust
//! use callbox::{callable, Callable};
//!
//! let drain: Callable<dyn Fn(i32, &mut i32) -> i32> = callable!(|a: i32, b: &mut i32| {
//!     let sum = a + *b;
//!     *b = 0;
//!     sum
//! });
//!
//! let mut x = 5;
//! assert_eq!(drain(3, &mut x), 8);
//! assert_eq!(x, 0);
//! ```
//!
//! ## Binding Sources
//!
//! The [`callable!`] macro picks how the entity is held:
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use callbox::{callable, Callable};
//!
//! #[derive(Clone)]
//! struct Counter(u32);
//!
//! impl Counter {
//!     fn peek(&self, extra: u32) -> u32 {
//!         self.0 + extra
//!     }
//! }
//!
//! fn twice(x: u32) -> u32 {
//!     x * 2
//! }
//!
//! let hits = Arc::new(AtomicU32::new(0));
//! let counter = Counter(10);
//! let shared_hits = Arc::clone(&hits);
//! let tally = Arc::new(move |x: u32| shared_hits.fetch_add(x, Ordering::SeqCst) + x);
//!
//! // By value, calling its own call operator.
//! let by_value: Callable<dyn Fn(u32) -> u32> = callable!(move |x: u32| x + 1);
//! // Through a reference; the borrow checker keeps `counter` alive.
//! let by_ref: Callable<dyn Fn(u32) -> u32 + '_> = callable!(ref: &counter => Counter::peek(extra: u32));
//! // Through an `Arc`; copies of the container share the entity.
//! let by_arc: Callable<dyn Fn(u32) -> u32> = callable!(shared: tally => (x: u32));
//! // A plain function pointer.
//! let by_fn: Callable<dyn Fn(u32) -> u32> = callable!(fn: twice as fn(u32) -> u32);
//!
//! assert_eq!(by_value(1), 2);
//! assert_eq!(by_ref(1), 11);
//! assert_eq!(by_arc(4), 4);
//! assert_eq!(by_arc.clone()(1), 5);
//! assert_eq!(by_fn(4), 8);
//! assert_eq!(hits.load(Ordering::SeqCst), 5);
//! ```
//!
//! ## Configuration
//!
//! ### Capacity
//!
//! The second type parameter is the space, four machine words by default.
//! [`space`] has power-of-two sizes; any sized type works:
//!
//! ```rust
//! use callbox::{callable, Callable};
//!
//! type Wide<F> = Callable<F, [u8; 128]>;
//!
//! let lut = [7u8; 100];
//! let lookup: Wide<dyn Fn(usize) -> u8> = callable!(move |i: usize| lut[i]);
//! assert_eq!(lookup(99), 7);
//! ```
//!
//! ### Feature Flags
//!
//! - **`std`** (enabled by default)
//!   - Calling an empty [`Callable`] panics with an [`EmptyCallable`] payload
//!   - Disable for `#![no_std]` environments: `default-features = false`
//!
//! - **`coerce`** (optional, requires nightly)
//!   - Enables [`Callable::from_value`], which coerces without the macro
//!
//! - **`nightly`** (optional, requires nightly)
//!   - Uses the standard pointer metadata API instead of a layout assumption
//!
//! ## Empty Containers
//!
//! A `Callable` can be empty: created by [`Callable::new`], emptied by
//! [`Callable::clear`] or moved out of with [`Callable::take`]. Calling it then
//! fails with [`EmptyCallable`]:
//!
//! ```rust
//! use callbox::{Callable, EmptyCallable};
//!
//! let nothing: Callable<dyn Fn() -> u8> = Callable::new();
//! assert_eq!(nothing.try_get().map(|f| f()), Err(EmptyCallable));
//! ```

#![cfg_attr(feature = "nightly", feature(set_ptr_value))]
#![cfg_attr(feature = "coerce", feature(unsize))]
#![cfg_attr(not(feature = "std"), no_std)]
#![allow(stable_features)]
#![deny(missing_docs)]
#![deny(clippy::as_conversions)]

extern crate alloc;

pub mod adapter;
mod callable;
mod error;
mod ops;
mod signature;
pub mod space;
mod sptr;

pub use crate::callable::Callable;
pub use crate::error::EmptyCallable;
pub use crate::signature::{deduce, Signature};

#[doc(hidden)]
pub mod __private {
    pub use alloc::sync::Arc;
}
