//! Error handle and node types.
//!
//! - [`Error`]: cheap-to-clone shared handle over any error value.
//! - [`AttrError`]: a structured node carrying its own attributes.
//! - [`JoinedError`]: several independent chain heads.
//! - `MessageError`: the composed message built by the wrapping layer.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::chain::{self, AttrMap, Chain};
use crate::config::Config;
use crate::log_value::LogValue;
use crate::store::{self, AttrStore};
use crate::value::{FromValue, Kind};

// ============================================================================
// Error - shared handle
// ============================================================================

/// A shared, immutable error value.
///
/// Cloning is a reference-count increment; the underlying chain is never
/// mutated, so an `Error` can be handed to any number of threads.
///
/// `{}` renders the message only. `{:#}` also renders the metadata of the
/// whole chain:
///
/// ```rust
/// use attrerr::{Attr, Config, Errors};
///
/// let errors = Errors::with_config(Config::builder().source_key("").build());
/// let err = errors.wrap_attrs(errors.new("disk full"), [Attr::uint("free", 0)]);
/// assert_eq!(err.to_string(), "disk full");
/// assert_eq!(format!("{err:#}"), "disk full{free=0}");
/// ```
#[derive(Clone)]
pub struct Error {
    inner: Arc<dyn StdError + Send + Sync + 'static>,
}

impl Error {
    /// A plain message error with no location or metadata.
    pub fn msg(text: impl Into<Cow<'static, str>>) -> Self {
        Self::from(MessageError::new(None, text.into(), None))
    }

    /// Adopt an already boxed error (e.g. the output of `anyhow::Error::into`).
    pub fn from_boxed(err: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        Self {
            inner: Arc::from(err),
        }
    }

    /// The head of the chain as a trait object.
    #[inline]
    pub fn as_dyn(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.inner
    }

    #[inline]
    pub(crate) fn as_std(&self) -> &(dyn StdError + 'static) {
        &*self.inner
    }

    /// Downcast the head only. Use [`find`](Self::find) to search the chain.
    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// The head as a structured node, if it is one.
    pub fn as_attr_error(&self) -> Option<&AttrError> {
        self.downcast_ref::<AttrError>()
    }

    /// The head as a joined error, if it is one.
    pub fn as_joined(&self) -> Option<&JoinedError> {
        self.downcast_ref::<JoinedError>()
    }

    /// Single-step unwrap through `std::error::Error::source`.
    pub fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source()
    }

    /// The wrapped cause, when the head is a node built by this crate.
    pub fn cause(&self) -> Option<&Error> {
        if let Some(node) = self.as_attr_error() {
            return Some(&node.cause);
        }
        self.downcast_ref::<MessageError>()
            .and_then(|m| m.cause.as_ref())
    }

    /// Iterate the `source()` chain, starting with the head.
    pub fn chain(&self) -> Chain<'_> {
        Chain::new(self.as_std())
    }

    /// Find the first error of type `T` anywhere in the tree, joined children included.
    ///
    /// ```rust
    /// use std::io;
    ///
    /// let err = attrerr::wrapf(io::Error::other("socket closed"), "sending batch");
    /// let io_err = err.find::<io::Error>().unwrap();
    /// assert_eq!(io_err.kind(), io::ErrorKind::Other);
    /// ```
    pub fn find<T: StdError + 'static>(&self) -> Option<&T> {
        chain::find_map(self.as_std(), &mut |e| e.downcast_ref::<T>())
    }

    /// True if an error equal to `target` is anywhere in the tree.
    pub fn is<T: StdError + PartialEq + 'static>(&self, target: &T) -> bool {
        chain::find_map(self.as_std(), &mut |e| {
            e.downcast_ref::<T>().filter(|found| *found == target)
        })
        .is_some()
    }

    /// True if `other` (by identity) is anywhere in this error's tree.
    pub fn contains(&self, other: &Error) -> bool {
        let target = Arc::as_ptr(&other.inner);
        chain::find_map(self.as_std(), &mut |e| {
            std::ptr::addr_eq(e as *const dyn StdError, target).then_some(())
        })
        .is_some()
    }

    /// Same underlying allocation.
    pub fn ptr_eq(&self, other: &Error) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Deduplicated metadata of the whole chain.
    pub fn flatten(&self) -> AttrMap {
        chain::flatten(self.as_std())
    }

    /// Typed lookup of a flattened attribute.
    ///
    /// Missing keys and type mismatches are ordinary results:
    ///
    /// ```rust
    /// use attrerr::{Attr, LookupError};
    ///
    /// let err = attrerr::wrap_attrs(attrerr::new("boom"), [Attr::uint("id", 7)]);
    /// assert_eq!(err.get::<u64>("id"), Ok(7));
    /// assert!(matches!(err.get::<String>("id"), Err(LookupError::WrongType { .. })));
    /// assert!(matches!(err.get::<u64>("nope"), Err(LookupError::NotFound { .. })));
    /// ```
    pub fn get<T: FromValue>(&self, key: &str) -> Result<T, LookupError> {
        self.flatten().get_as(key)
    }

    /// The structured rendering for a logging sink.
    ///
    /// Uses the configuration of the outermost structured node, or the default
    /// configuration when the chain has none.
    pub fn log_value(&self) -> LogValue {
        let config = self.config();
        LogValue::build(self.to_string(), self.flatten(), &config)
    }

    fn config(&self) -> Arc<Config> {
        chain::find_map(self.as_std(), &mut |e| {
            e.downcast_ref::<AttrError>().map(|n| n.config.clone())
        })
        .unwrap_or_else(|| crate::wrap::default_errors().shared_config())
    }
}

impl<E> From<E> for Error
where
    E: StdError + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Self {
            inner: Arc::new(err),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)?;
        if f.alternate() {
            let value = self.log_value();
            let config = self.config();
            let attrs = value
                .attrs()
                .iter()
                .filter(|a| config.message_key().is_empty() || a.key() != config.message_key());
            write_braced(f, attrs)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self)
    }
}

impl AsRef<dyn StdError + Send + Sync> for Error {
    fn as_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.as_dyn()
    }
}

impl From<Error> for Box<dyn StdError + Send + Sync + 'static> {
    fn from(err: Error) -> Self {
        Box::new(Shared(err))
    }
}

/// Lets an [`Error`] travel through APIs that want a boxed std error.
struct Shared(Error);

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for Shared {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.0.as_std())
    }
}

/// `{k=v,k=v}`; writes nothing for an empty set.
pub(crate) fn write_braced<'a>(
    f: &mut fmt::Formatter<'_>,
    attrs: impl IntoIterator<Item = &'a crate::Attr>,
) -> fmt::Result {
    let mut first = true;
    for attr in attrs {
        f.write_str(if first { "{" } else { "," })?;
        write!(f, "{}", attr)?;
        first = false;
    }
    if !first {
        f.write_str("}")?;
    }
    Ok(())
}

// ============================================================================
// AttrError - structured node
// ============================================================================

/// An error node carrying its own attributes.
///
/// The node never changes the message: `Display` delegates to the cause.
/// Its attributes are fixed at construction.
pub struct AttrError {
    cause: Error,
    attrs: AttrStore,
    config: Arc<Config>,
}

impl AttrError {
    pub(crate) fn new(cause: Error, attrs: AttrStore, config: Arc<Config>) -> Self {
        Self {
            cause,
            attrs,
            config,
        }
    }

    pub fn cause(&self) -> &Error {
        &self.cause
    }

    /// This node's own attributes (not the chain's).
    pub fn attrs(&self) -> store::Iter<'_> {
        self.attrs.iter()
    }

    pub fn store(&self) -> &AttrStore {
        &self.attrs
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `message{k=v,k=v}` with this node's own attributes only.
    ///
    /// For the whole chain use `{:#}` on [`Error`] or [`log_value`](Self::log_value).
    pub fn render_verbose(&self) -> String {
        struct Verbose<'a>(&'a AttrError);
        impl fmt::Display for Verbose<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.cause)?;
                write_braced(f, self.0.attrs.iter())
            }
        }
        Verbose(self).to_string()
    }

    /// Full-chain structured rendering starting at this node.
    pub fn log_value(&self) -> LogValue {
        LogValue::build(self.to_string(), chain::flatten(self), &self.config)
    }
}

impl fmt::Display for AttrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cause)
    }
}

impl fmt::Debug for AttrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttrError")
            .field("message", &format_args!("{}", self.cause))
            .field("attrs", &self.attrs)
            .finish()
    }
}

impl StdError for AttrError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.cause.as_std())
    }
}

// ============================================================================
// MessageError - composed message
// ============================================================================

/// `<function> <text>: <cause>`, each part optional.
pub(crate) struct MessageError {
    function: Option<&'static str>,
    text: Cow<'static, str>,
    cause: Option<Error>,
}

impl MessageError {
    pub(crate) fn new(
        function: Option<&'static str>,
        text: Cow<'static, str>,
        cause: Option<Error>,
    ) -> Self {
        Self {
            function,
            text,
            cause,
        }
    }
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        if let Some(func) = self.function {
            f.write_str(func)?;
            sep = " ";
        }
        if !self.text.is_empty() {
            write!(f, "{}{}", sep, self.text)?;
            sep = ": ";
        }
        if let Some(cause) = &self.cause {
            write!(f, "{}{}", sep, cause)?;
        }
        Ok(())
    }
}

impl fmt::Debug for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string())
    }
}

impl StdError for MessageError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_ref().map(Error::as_std)
    }
}

// ============================================================================
// JoinedError
// ============================================================================

/// Several independent errors, each the head of its own chain.
///
/// `source()` is `None`: a joined error contains its children rather than
/// being caused by one of them. Tree searches ([`Error::find`], [`Error::is`])
/// and [`flatten`](crate::flatten) descend into every child.
pub struct JoinedError {
    errors: Vec<Error>,
}

impl JoinedError {
    pub(crate) fn new(errors: Vec<Error>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for JoinedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl fmt::Debug for JoinedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.errors.iter().map(|e| format!("{}", e)))
            .finish()
    }
}

impl StdError for JoinedError {}

// ============================================================================
// LookupError
// ============================================================================

/// Failure of a typed metadata lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("attribute {key:?} not found")]
    NotFound { key: String },
    #[error("attribute {key:?} is {found}, not {expected}")]
    WrongType {
        key: String,
        expected: Kind,
        found: Kind,
    },
}
