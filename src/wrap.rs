//! The wrapping API.
//!
//! [`Errors`] is a factory bound to one [`Config`]. The crate-level functions
//! ([`crate::new`], [`crate::wrap`], ...) forward to a process-wide instance
//! built from `Config::default()`; create your own `Errors` for different keys,
//! prefixes or sort order.
//!
//! Every entry point is `#[track_caller]`, so the recorded location is the
//! line that called into this crate.

use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::chain;
use crate::config::Config;
use crate::context::{self, Context};
use crate::error::{AttrError, Error, JoinedError, MessageError};
use crate::frame::Frame;
use crate::scope::Scope;
use crate::store::StoreBuilder;
use crate::value::Attr;

// ============================================================================
// Errors - configured factory
// ============================================================================

/// Builds and wraps errors using one configuration.
///
/// ```rust
/// use attrerr::{Attr, Config, Errors};
///
/// let errors = Errors::with_config(Config::builder().source_key("at").build());
/// let err = errors.wrap_attrs(std::io::Error::other("refused"), [Attr::uint("port", 5432)]);
///
/// let map = err.flatten();
/// assert_eq!(map.get_as::<u64>("port"), Ok(5432));
/// assert!(map.contains_key("at"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Errors {
    config: Arc<Config>,
}

impl Errors {
    pub fn with_config(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The configuration handle shared by every node this factory builds.
    pub fn shared_config(&self) -> Arc<Config> {
        self.config.clone()
    }

    // ------------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------------

    /// A new error bearing the caller's location.
    #[track_caller]
    pub fn new(&self, message: impl Into<Cow<'static, str>>) -> Error {
        self.new_in(Frame::caller(), message)
    }

    /// [`new`](Self::new) with a formatted message.
    ///
    /// Use [`errorf!`](crate::errorf) to also capture the function name.
    #[track_caller]
    pub fn errorf(&self, args: fmt::Arguments<'_>) -> Error {
        self.new_in(Frame::caller(), crate::__message(args))
    }

    /// [`new`](Self::new) at an explicit frame.
    pub fn new_in(&self, frame: Frame, message: impl Into<Cow<'static, str>>) -> Error {
        let head = Error::from(MessageError::new(frame.function(), message.into(), None));
        self.annotate(frame, None, head, None)
    }

    // ------------------------------------------------------------------------
    // Wrapping
    // ------------------------------------------------------------------------

    /// Record the caller's location, unless the chain already carries one.
    ///
    /// Wrapping a chain that already holds a structured node adds nothing and
    /// returns the same handle.
    #[track_caller]
    pub fn wrap(&self, err: impl Into<Error>) -> Error {
        self.annotate(Frame::caller(), None, err.into(), None)
    }

    /// [`wrap`](Self::wrap) plus explicit attributes.
    #[track_caller]
    pub fn wrap_attrs(&self, err: impl Into<Error>, attrs: impl IntoIterator<Item = Attr>) -> Error {
        self.annotate(Frame::caller(), None, err.into(), attrs)
    }

    /// [`wrap_attrs`](Self::wrap_attrs) plus the context's pending attributes.
    ///
    /// On a key collision explicit attributes beat context attributes, which
    /// beat the location.
    #[track_caller]
    pub fn wrap_ctx(
        &self,
        ctx: Option<&Context>,
        err: impl Into<Error>,
        attrs: impl IntoIterator<Item = Attr>,
    ) -> Error {
        self.annotate(Frame::caller(), ctx, err.into(), attrs)
    }

    /// Prefix the message with `text` (and the function name, when captured).
    ///
    /// Unlike [`wrap`](Self::wrap) this always creates a node, since the
    /// message changes.
    #[track_caller]
    pub fn wrapf(&self, err: impl Into<Error>, text: impl Into<Cow<'static, str>>) -> Error {
        self.wrapf_in(Frame::caller(), err, text)
    }

    /// [`wrapf`](Self::wrapf) at an explicit frame.
    pub fn wrapf_in(
        &self,
        frame: Frame,
        err: impl Into<Error>,
        text: impl Into<Cow<'static, str>>,
    ) -> Error {
        let head = Error::from(MessageError::new(
            frame.function(),
            text.into(),
            Some(err.into()),
        ));
        self.annotate(frame, None, head, None)
    }

    /// Wrap the error in `slot`, if any, and store the result back.
    ///
    /// Meant for the tail of a function that owns its result, possibly more
    /// than once:
    ///
    /// ```rust
    /// use attrerr::{Attr, Context, Error};
    ///
    /// fn load(ctx: &Context) -> Result<u32, Error> {
    ///     let mut out = "x".parse::<u32>().map_err(Error::from);
    ///     attrerr::wrap_after(Some(ctx), &mut out, [Attr::string("step", "parse")]);
    ///     attrerr::wrap_after(Some(ctx), &mut out, None);
    ///     out
    /// }
    ///
    /// let ctx = Context::background().attach([Attr::uint("req", 1)]);
    /// let err = load(&ctx).unwrap_err();
    /// assert_eq!(err.get::<u64>("req"), Ok(1));
    /// assert_eq!(err.get::<String>("step").as_deref(), Ok("parse"));
    /// ```
    #[track_caller]
    pub fn wrap_after<T>(
        &self,
        ctx: Option<&Context>,
        slot: &mut Result<T, Error>,
        attrs: impl IntoIterator<Item = Attr>,
    ) {
        if let Err(err) = slot {
            *err = self.annotate(Frame::caller(), ctx, err.clone(), attrs);
        }
    }

    // ------------------------------------------------------------------------
    // Scopes
    // ------------------------------------------------------------------------

    /// A scope whose deferred actions wrap with this factory.
    pub fn scope(&self) -> Scope<'_> {
        Scope::new(self)
    }

    /// Run `body` with a fresh scope and finish it with the body's result.
    ///
    /// ```rust
    /// use attrerr::{Attr, Error};
    ///
    /// let closed = std::cell::Cell::new(false);
    /// let out: Result<(), Error> = attrerr::default_errors().scoped(|scope| {
    ///     scope.defer(|| {
    ///         closed.set(true);
    ///         Ok::<_, Error>(())
    ///     });
    ///     scope.wrap_after(None, [Attr::string("op", "sync")]);
    ///     Err(attrerr::new("write failed"))
    /// });
    /// assert!(closed.get());
    /// assert_eq!(out.unwrap_err().get::<String>("op").as_deref(), Ok("sync"));
    /// ```
    pub fn scoped<'a, T, E, F>(&'a self, body: F) -> Result<T, Error>
    where
        F: FnOnce(&mut Scope<'a>) -> Result<T, E>,
        E: Into<Error>,
    {
        let mut scope = self.scope();
        let result = body(&mut scope);
        scope.finish(result)
    }

    // ------------------------------------------------------------------------
    // Core
    // ------------------------------------------------------------------------

    /// Build one structured node over `err`.
    ///
    /// Priority on key collisions: explicit attrs, then context attrs, then
    /// the location. The location is only recorded when no node in the tree
    /// is structured yet. With nothing to add to an already structured tree,
    /// `err` is returned as is.
    pub(crate) fn annotate(
        &self,
        frame: Frame,
        ctx: Option<&Context>,
        err: Error,
        attrs: impl IntoIterator<Item = Attr>,
    ) -> Error {
        let mut builder = StoreBuilder::new();
        for attr in attrs {
            builder.insert(attr);
        }
        for attr in context::read(ctx) {
            builder.insert_if_absent(attr.clone());
        }

        let structured = chain::contains_attr_error(err.as_std());
        let key = self.config.source_key();
        if !structured && !key.is_empty() && !builder.contains(key) {
            builder.insert(Attr::string(
                key.to_string(),
                frame.location(self.config.package_prefix()),
            ));
        }

        if structured && builder.is_empty() {
            return err;
        }
        Error::from(AttrError::new(err, builder.build(), self.config.clone()))
    }
}

/// The process-wide factory behind the crate-level functions.
pub fn default_errors() -> &'static Errors {
    static DEFAULT: OnceLock<Errors> = OnceLock::new();
    DEFAULT.get_or_init(Errors::default)
}

// ============================================================================
// Joining
// ============================================================================

/// Join the present errors.
///
/// `None` when every member is absent; a single present member is returned
/// unchanged; otherwise a [`JoinedError`] in the given order.
///
/// ```rust
/// use attrerr::Error;
///
/// assert!(attrerr::join::<_, Error>([None, None]).is_none());
///
/// let only = attrerr::new("only");
/// let joined = attrerr::join([None, Some(only.clone())]).unwrap();
/// assert!(joined.ptr_eq(&only));
/// ```
pub fn join<I, E>(errs: I) -> Option<Error>
where
    I: IntoIterator<Item = Option<E>>,
    E: Into<Error>,
{
    let mut errors: Vec<Error> = errs.into_iter().flatten().map(Into::into).collect();
    match errors.len() {
        0 => None,
        1 => errors.pop(),
        _ => Some(Error::from(JoinedError::new(errors))),
    }
}

/// Run every cleanup, then join their errors with the one already in `slot`.
///
/// All cleanups run even when earlier ones fail. Cleanup errors come first and
/// the original error last, so the original wins key collisions when the
/// result is flattened. `slot` is left untouched when every cleanup succeeds.
///
/// ```rust
/// use attrerr::Error;
///
/// let closed = std::cell::RefCell::new(Vec::new());
/// let close = |name: &'static str| {
///     let closed = &closed;
///     move || {
///         closed.borrow_mut().push(name);
///         Err::<(), _>(attrerr::new(name))
///     }
/// };
///
/// let mut out: Result<(), Error> = Ok(());
/// attrerr::join_after(&mut out, [close("a"), close("b")]);
/// assert_eq!(*closed.borrow(), ["a", "b"]);
/// assert_eq!(out.unwrap_err().as_joined().map(|j| j.len()), Some(2));
/// ```
pub fn join_after<T, I, F, E>(slot: &mut Result<T, Error>, cleanups: I)
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Result<(), E>,
    E: Into<Error>,
{
    let mut failures: Vec<Error> = Vec::new();
    for cleanup in cleanups {
        if let Err(err) = cleanup() {
            failures.push(err.into());
        }
    }
    if failures.is_empty() {
        return;
    }
    if let Err(original) = slot {
        failures.push(original.clone());
    }
    if let Some(joined) = join(failures.into_iter().map(Some)) {
        *slot = Err(joined);
    }
}
