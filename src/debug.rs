//! Macros for last-resort debugging.
//!
//! Error reporting during decoding is terse on purpose, which can make it
//! hard to find the place an error was first produced at. This module
//! provides the `xerr!()` macro to help with that: wrap it around the
//! expression producing an error and it will panic if the `extra-debug`
//! feature is enabled during build or resolve into the enclosed expression
//! otherwise:
//!
//! ```rust,ignore
//! if bad {
//!     xerr!(return Err(source.content_err(err)));
//! }
//! ```
//!
//! By enabling `extra-debug` and setting the `RUST_BACKTRACE` environment
//! variable, you can produce a backtrace pointing at the booby-trapped
//! error site.

#[cfg(feature = "extra-debug")]
#[macro_export]
macro_rules! xerr {
    ($test:expr) => { panic!("extra debugging enabled") };
}

#[cfg(not(feature = "extra-debug"))]
#[macro_export]
macro_rules! xerr {
    ($test:expr) => { $test };
}
