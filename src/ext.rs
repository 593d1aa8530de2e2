//! Extension traits for wrapping errors in place.
//!
//! These avoid `map_err` boilerplate at call sites:
//!
//! - [`ResultExt`]: `.wrap()`, `.wrap_attrs()`, ... on `Result<T, E>`
//! - [`OptionExt`]: the same on an optional error, where `None` means "no error"
//!
//! Both use the process-wide [`default_errors`](crate::default_errors) factory.
//! `Ok` and `None` pass through untouched.

use std::borrow::Cow;

use crate::context::Context;
use crate::error::Error;
use crate::frame::Frame;
use crate::value::Attr;
use crate::wrap::default_errors;

// ============================================================================
// ResultExt Trait - wrapping the error of a Result
// ============================================================================

/// Wrap the error of a `Result` with the caller's location and metadata.
///
/// ```rust
/// use attrerr::{Attr, Error, ResultExt};
///
/// fn read_port(raw: &str) -> Result<u16, Error> {
///     raw.parse::<u16>().wrap_attrs([Attr::string("raw", raw.to_string())])
/// }
///
/// assert_eq!(read_port("80").unwrap(), 80);
/// let err = read_port("eighty").unwrap_err();
/// assert_eq!(err.get::<String>("raw").as_deref(), Ok("eighty"));
/// assert!(err.get::<String>("source").is_ok());
/// ```
pub trait ResultExt<T> {
    /// Add the caller's location if this is `Err`.
    #[track_caller]
    fn wrap(self) -> Result<T, Error>;

    /// Add the caller's location and `attrs` if this is `Err`.
    #[track_caller]
    fn wrap_attrs(self, attrs: impl IntoIterator<Item = Attr>) -> Result<T, Error>;

    /// Add `attrs`, the context's pending attributes and the caller's location.
    #[track_caller]
    fn wrap_ctx(
        self,
        ctx: Option<&Context>,
        attrs: impl IntoIterator<Item = Attr>,
    ) -> Result<T, Error>;

    /// Prefix the message with `text`.
    #[track_caller]
    fn wrapf(self, text: impl Into<Cow<'static, str>>) -> Result<T, Error>;

    /// Prefix the message with lazily computed text. `f` only runs on `Err`.
    #[track_caller]
    fn wrapf_with(self, f: impl FnOnce() -> String) -> Result<T, Error>;

    /// Prefix the message with `text` and the given frame's function name.
    ///
    /// Pair with [`here!`](crate::here) to capture the enclosing function.
    fn wrapf_at(self, frame: Frame, text: impl Into<Cow<'static, str>>) -> Result<T, Error>;
}

impl<T, E: Into<Error>> ResultExt<T> for Result<T, E> {
    #[track_caller]
    #[inline]
    fn wrap(self) -> Result<T, Error> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(default_errors().wrap(e)),
        }
    }

    #[track_caller]
    #[inline]
    fn wrap_attrs(self, attrs: impl IntoIterator<Item = Attr>) -> Result<T, Error> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(default_errors().wrap_attrs(e, attrs)),
        }
    }

    #[track_caller]
    #[inline]
    fn wrap_ctx(
        self,
        ctx: Option<&Context>,
        attrs: impl IntoIterator<Item = Attr>,
    ) -> Result<T, Error> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(default_errors().wrap_ctx(ctx, e, attrs)),
        }
    }

    #[track_caller]
    #[inline]
    fn wrapf(self, text: impl Into<Cow<'static, str>>) -> Result<T, Error> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(default_errors().wrapf(e, text)),
        }
    }

    #[track_caller]
    #[inline]
    fn wrapf_with(self, f: impl FnOnce() -> String) -> Result<T, Error> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(default_errors().wrapf(e, f())),
        }
    }

    #[inline]
    fn wrapf_at(self, frame: Frame, text: impl Into<Cow<'static, str>>) -> Result<T, Error> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(default_errors().wrapf_in(frame, e, text)),
        }
    }
}

// ============================================================================
// OptionExt Trait - wrapping an optional error
// ============================================================================

/// Wrap an `Option` holding an error; `None` stays `None`.
///
/// ```rust
/// use attrerr::{Attr, Error, OptionExt};
///
/// let none: Option<Error> = None;
/// assert!(none.wrap_attrs([Attr::uint("k", 1)]).is_none());
///
/// let some = Some(std::io::Error::other("eof")).wrap();
/// assert!(some.unwrap().get::<String>("source").is_ok());
/// ```
pub trait OptionExt {
    /// Add the caller's location if this is `Some`.
    #[track_caller]
    fn wrap(self) -> Option<Error>;

    /// Add the caller's location and `attrs` if this is `Some`.
    #[track_caller]
    fn wrap_attrs(self, attrs: impl IntoIterator<Item = Attr>) -> Option<Error>;

    /// Add `attrs`, the context's pending attributes and the caller's location.
    #[track_caller]
    fn wrap_ctx(self, ctx: Option<&Context>, attrs: impl IntoIterator<Item = Attr>)
    -> Option<Error>;
}

impl<E: Into<Error>> OptionExt for Option<E> {
    #[track_caller]
    #[inline]
    fn wrap(self) -> Option<Error> {
        match self {
            Some(e) => Some(default_errors().wrap(e)),
            None => None,
        }
    }

    #[track_caller]
    #[inline]
    fn wrap_attrs(self, attrs: impl IntoIterator<Item = Attr>) -> Option<Error> {
        match self {
            Some(e) => Some(default_errors().wrap_attrs(e, attrs)),
            None => None,
        }
    }

    #[track_caller]
    #[inline]
    fn wrap_ctx(
        self,
        ctx: Option<&Context>,
        attrs: impl IntoIterator<Item = Attr>,
    ) -> Option<Error> {
        match self {
            Some(e) => Some(default_errors().wrap_ctx(ctx, e, attrs)),
            None => None,
        }
    }
}
