//! # attrerr - Structured errors with caller location and key/value metadata
//!
//! Wrap any error with the line that first saw it and with typed attributes,
//! then render the whole chain for a structured logging sink:
//!
//! ```text
//! [msg=loading profile: connection refused user=ada request_id=42 source=src/db.rs:88]
//! ```
//!
//! ## Try It Now
//!
//! ```rust
//! use attrerr::{Attr, Error, ResultExt};
//!
//! fn connect(port: u16) -> Result<(), Error> {
//!     Err(std::io::Error::other("connection refused")).wrap_attrs([Attr::uint("port", port as u64)])
//! }
//!
//! fn load_profile(user: &str) -> Result<(), Error> {
//!     connect(5432).wrap_attrs([Attr::string("user", user.to_string())])?;
//!     Ok(())
//! }
//!
//! let err = load_profile("ada").unwrap_err();
//! assert_eq!(err.to_string(), "connection refused");
//! assert_eq!(err.get::<String>("user").as_deref(), Ok("ada"));
//! assert_eq!(err.get::<u64>("port"), Ok(5432));
//! ```
//!
//! ## How Metadata Composes
//!
//! | Rule | Behavior |
//! |------|----------|
//! | Location | Recorded once per chain, by the first wrap that sees it |
//! | Same key along a chain | The most recent wrap wins |
//! | Same key across joined errors | The later sibling wins |
//! | Nothing to add | [`wrap`] returns the same handle, no new node |
//! | "No error" | `Ok` and `None` pass through every wrap untouched |
//!
//! ## Wrapping
//!
//! | Function | Adds |
//! |----------|------|
//! | [`new`] / [`errorf!`] | A fresh error and its location |
//! | [`wrap`] | The location, if the chain has none yet |
//! | [`wrap_attrs`] | Attributes plus location |
//! | [`wrap_ctx`] | Attributes, the [`Context`]'s pending attributes, location |
//! | [`wrapf`] / [`wrapf!`] | A message prefix plus location |
//! | [`wrap_after`] | [`wrap_ctx`] on the error stored in a `Result` slot |
//! | [`join`] / [`join_after`] | Several errors as one |
//!
//! The crate-level functions use one process-wide [`Errors`] factory with the
//! default [`Config`]. Build your own factory for other keys or sort order.
//!
//! ## Logging
//!
//! [`Error::log_value`] flattens the chain into a [`LogValue`]: message first,
//! attributes, location last. It implements `Display`, so it records cleanly
//! as a `tracing` field:
//!
//! ```rust
//! let err = attrerr::new("quota exceeded");
//! tracing::error!(error = %err.log_value(), "upload rejected");
//! ```
//!
//! `{}` on an [`Error`] prints the message only; `{:#}` appends the flattened
//! attributes.
//!
//! ## Cleanup
//!
//! [`join_after`] and [`Scope`] run every cleanup even when earlier ones fail
//! and join their errors with the operation's own.

#![deny(unsafe_code)]

mod chain;
mod config;
pub mod context;
mod error;
mod ext;
mod frame;
#[cfg(not(feature = "smallvec"))]
mod inline_vec;
mod log_value;
pub mod prelude;
mod scope;
mod store;
mod value;
mod wrap;

pub use chain::{AttrMap, Chain};
pub use config::{
    AttrCompare, Config, ConfigBuilder, DEFAULT_MESSAGE_KEY, DEFAULT_PACKAGE_PREFIX,
    DEFAULT_SOURCE_KEY, compare_keys,
};
pub use context::Context;
pub use error::{AttrError, Error, JoinedError, LookupError};
pub use ext::{OptionExt, ResultExt};
pub use frame::{Frame, trim_file, trim_function};
pub use log_value::LogValue;
pub use scope::Scope;
pub use store::{AttrStore, INLINE_ATTRS};
pub use value::{AnyValue, Attr, FromValue, Kind, Value};
pub use wrap::{Errors, default_errors, join, join_after};

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

// ============================================================================
// Crate-level wrapping functions (default factory)
// ============================================================================

/// A new error bearing the caller's location.
///
/// ```rust
/// let err = attrerr::new("x");
/// let log = err.log_value();
/// assert_eq!(log.attrs()[0].to_string(), "msg=x");
/// assert!(log.get("source").is_some());
/// ```
#[track_caller]
pub fn new(message: impl Into<Cow<'static, str>>) -> Error {
    default_errors().new(message)
}

/// [`new`] with a formatted message. See also [`errorf!`].
#[track_caller]
pub fn errorf(args: fmt::Arguments<'_>) -> Error {
    default_errors().errorf(args)
}

/// Record the caller's location, unless the chain already carries one.
#[track_caller]
pub fn wrap(err: impl Into<Error>) -> Error {
    default_errors().wrap(err)
}

/// [`wrap`] plus explicit attributes.
#[track_caller]
pub fn wrap_attrs(err: impl Into<Error>, attrs: impl IntoIterator<Item = Attr>) -> Error {
    default_errors().wrap_attrs(err, attrs)
}

/// [`wrap_attrs`] plus the context's pending attributes.
#[track_caller]
pub fn wrap_ctx(
    ctx: Option<&Context>,
    err: impl Into<Error>,
    attrs: impl IntoIterator<Item = Attr>,
) -> Error {
    default_errors().wrap_ctx(ctx, err, attrs)
}

/// Prefix the message with `text`. See also [`wrapf!`].
#[track_caller]
pub fn wrapf(err: impl Into<Error>, text: impl Into<Cow<'static, str>>) -> Error {
    default_errors().wrapf(err, text)
}

/// Wrap the error in `slot`, if any, and store the result back.
#[track_caller]
pub fn wrap_after<T>(
    ctx: Option<&Context>,
    slot: &mut Result<T, Error>,
    attrs: impl IntoIterator<Item = Attr>,
) {
    default_errors().wrap_after(ctx, slot, attrs)
}

// ============================================================================
// Chain predicates and lookups
// ============================================================================

/// The first `T` anywhere in the tree, joined children included.
pub fn into<T: StdError + 'static>(err: &Error) -> Option<&T> {
    err.find::<T>()
}

/// True if an error equal to `target` is anywhere in the tree.
pub fn is<T: StdError + PartialEq + 'static>(err: &Error, target: &T) -> bool {
    err.is(target)
}

/// Single-step unwrap.
pub fn unwrap(err: &Error) -> Option<&(dyn StdError + 'static)> {
    err.source()
}

/// Deduplicated metadata of the whole tree.
pub fn flatten(err: &Error) -> AttrMap {
    err.flatten()
}

/// [`flatten`], sorted with `compare`.
///
/// ```rust
/// use attrerr::{Attr, compare_keys};
///
/// let err = attrerr::wrap_attrs(attrerr::new("x"), [Attr::uint("b", 1), Attr::uint("a", 2)]);
/// let keys: Vec<_> = attrerr::flatten_sorted(&err, compare_keys)
///     .iter()
///     .map(|a| a.key().to_string())
///     .collect();
/// assert_eq!(keys, ["a", "b", "source"]);
/// ```
pub fn flatten_sorted(err: &Error, compare: AttrCompare) -> Vec<Attr> {
    chain::flatten_sorted(err.as_std(), compare)
}

/// Typed lookup of a flattened attribute.
pub fn get<T: FromValue>(err: &Error, key: &str) -> Result<T, LookupError> {
    err.get(key)
}

/// Unwrap a result that must succeed, or log and panic.
///
/// For initialization paths where an error means the process cannot run.
///
/// ```rust,should_panic
/// let port: u16 = attrerr::must("not a port".parse::<u16>());
/// ```
#[track_caller]
pub fn must<T, E: Into<Error>>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(err) => {
            let err = err.into();
            let location = std::panic::Location::caller();
            tracing::error!(error = %err.log_value(), %location, "unrecoverable error");
            panic!("{:#}", err)
        }
    }
}

#[doc(hidden)]
pub fn __message(args: fmt::Arguments<'_>) -> Cow<'static, str> {
    match args.as_str() {
        Some(s) => Cow::Borrowed(s),
        None => Cow::Owned(args.to_string()),
    }
}

// ============================================================================
// Macros - capture the enclosing function name
// ============================================================================

/// The current [`Frame`], including the enclosing function's name.
///
/// ```rust
/// fn handler() -> attrerr::Frame {
///     attrerr::here!()
/// }
/// assert!(handler().function().unwrap().ends_with("handler"));
/// ```
#[macro_export]
macro_rules! here {
    () => {
        $crate::Frame::caller().with_function($crate::function_name!())
    };
}

/// [`new`](crate::new) with the enclosing function's name in the message.
///
/// ```rust
/// mod db {
///     pub fn open() -> attrerr::Error {
///         attrerr::new!("no such table")
///     }
/// }
/// assert_eq!(db::open().to_string(), "db::open no such table");
/// ```
#[macro_export]
macro_rules! new {
    ($msg:expr $(,)?) => {
        $crate::default_errors().new_in($crate::here!(), $msg)
    };
}

/// Formatted [`new`](crate::new) with the enclosing function's name.
///
/// ```rust
/// mod db {
///     pub fn open(table: &str) -> attrerr::Error {
///         attrerr::errorf!("no such table {table}")
///     }
/// }
/// assert_eq!(db::open("users").to_string(), "db::open no such table users");
/// ```
#[macro_export]
macro_rules! errorf {
    ($($arg:tt)+) => {
        $crate::default_errors().new_in($crate::here!(), $crate::__message(format_args!($($arg)+)))
    };
}

/// Prefix an error's message with formatted text and the enclosing function's name.
///
/// ```rust
/// mod store {
///     pub fn load(id: u32) -> attrerr::Error {
///         attrerr::wrapf!(std::io::Error::other("eof"), "reading record {id}")
///     }
/// }
/// assert_eq!(store::load(7).to_string(), "store::load reading record 7: eof");
/// ```
#[macro_export]
macro_rules! wrapf {
    ($err:expr, $($arg:tt)+) => {
        $crate::default_errors().wrapf_in(
            $crate::here!(),
            $err,
            $crate::__message(format_args!($($arg)+)),
        )
    };
}

#[cfg(test)]
mod tests;
