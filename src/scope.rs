//! Deferred cleanup and wrapping for one operation.
//!
//! A [`Scope`] collects actions while an operation runs and executes them in
//! reverse registration order when the operation's result is known:
//!
//! - cleanups registered with [`Scope::defer`] always run, and their errors are
//!   joined with the outcome;
//! - wraps registered with [`Scope::wrap_after`] annotate the outcome only if
//!   it is an error.
//!
//! If a scope is dropped before [`Scope::finish`] (early return or unwinding),
//! pending cleanups still run and failures are reported with `tracing::warn!`.
//! Pending wraps are discarded: there is no outcome to annotate.

use std::fmt;

use crate::context::Context;
use crate::error::Error;
use crate::frame::Frame;
use crate::value::Attr;
use crate::wrap::{Errors, join_after};

type Cleanup<'a> = Box<dyn FnOnce() -> Result<(), Error> + 'a>;

enum Deferred<'a> {
    Cleanup(Cleanup<'a>),
    Wrap {
        frame: Frame,
        ctx: Option<Context>,
        attrs: Vec<Attr>,
    },
}

/// Guaranteed-release actions for one operation.
///
/// ```rust
/// use attrerr::{Attr, Error};
///
/// struct Conn;
/// impl Conn {
///     fn close(self) -> Result<(), Error> {
///         Err(attrerr::wrap_attrs(attrerr::new("close failed"), [Attr::bool("dirty", true)]))
///     }
/// }
///
/// let errors = attrerr::default_errors();
/// let mut scope = errors.scope();
/// let conn = Conn;
/// scope.defer(move || conn.close());
/// scope.wrap_after(None, [Attr::string("op", "flush")]);
///
/// let err = scope.finish(Err::<(), _>(attrerr::new("flush failed"))).unwrap_err();
/// assert_eq!(err.get::<bool>("dirty"), Ok(true));
/// assert_eq!(err.get::<String>("op").as_deref(), Ok("flush"));
/// ```
pub struct Scope<'a> {
    errors: &'a Errors,
    deferred: Vec<Deferred<'a>>,
}

impl<'a> Scope<'a> {
    pub fn new(errors: &'a Errors) -> Self {
        Self {
            errors,
            deferred: Vec::new(),
        }
    }

    /// Register a cleanup. It runs on finish or drop, whatever the outcome.
    pub fn defer<F, E>(&mut self, cleanup: F)
    where
        F: FnOnce() -> Result<(), E> + 'a,
        E: Into<Error>,
    {
        self.deferred
            .push(Deferred::Cleanup(Box::new(move || cleanup().map_err(Into::into))));
    }

    /// Register a wrap of the outcome, located at this call.
    #[track_caller]
    pub fn wrap_after(&mut self, ctx: Option<&Context>, attrs: impl IntoIterator<Item = Attr>) {
        self.deferred.push(Deferred::Wrap {
            frame: Frame::caller(),
            ctx: ctx.cloned(),
            attrs: attrs.into_iter().collect(),
        });
    }

    /// Number of actions still pending.
    pub fn pending(&self) -> usize {
        self.deferred.len()
    }

    /// Run every pending action, last registered first, against `result`.
    pub fn finish<T, E: Into<Error>>(mut self, result: Result<T, E>) -> Result<T, Error> {
        let mut slot = result.map_err(Into::into);
        self.run(&mut slot);
        slot
    }

    fn run<T>(&mut self, slot: &mut Result<T, Error>) {
        while let Some(action) = self.deferred.pop() {
            match action {
                Deferred::Cleanup(cleanup) => join_after(slot, [cleanup]),
                Deferred::Wrap { frame, ctx, attrs } => {
                    if let Err(err) = slot {
                        *err = self.errors.annotate(frame, ctx.as_ref(), err.clone(), attrs);
                    }
                }
            }
        }
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        if self.deferred.is_empty() {
            return;
        }
        self.deferred
            .retain(|action| matches!(action, Deferred::Cleanup(_)));
        let mut slot: Result<(), Error> = Ok(());
        self.run(&mut slot);
        if let Err(err) = slot {
            tracing::warn!(error = %err.log_value(), "cleanup failed in unfinished scope");
        }
    }
}

impl fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("config", self.errors.config())
            .field("pending", &self.deferred.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn runs_in_reverse_order() {
        let order = RefCell::new(Vec::new());
        let errors = Errors::default();
        let mut scope = errors.scope();
        for i in 0..3 {
            let order = &order;
            scope.defer(move || {
                order.borrow_mut().push(i);
                Ok::<_, Error>(())
            });
        }
        assert_eq!(scope.pending(), 3);
        assert!(scope.finish(Ok::<_, Error>(())).is_ok());
        assert_eq!(*order.borrow(), [2, 1, 0]);
    }

    #[test]
    fn every_cleanup_runs_after_failures() {
        let ran = RefCell::new(0);
        let errors = Errors::default();
        let mut scope = errors.scope();
        for name in ["a", "b"] {
            let ran = &ran;
            scope.defer(move || {
                *ran.borrow_mut() += 1;
                Err::<(), _>(Error::msg(name))
            });
        }
        let err = scope.finish(Ok::<_, Error>(())).unwrap_err();
        assert_eq!(*ran.borrow(), 2);
        // "b" ran first, so "a" was joined in front of it.
        assert_eq!(err.as_joined().map(|j| j.len()), Some(2));
        assert_eq!(err.to_string(), "a\nb");
    }

    #[test]
    fn wrap_only_touches_errors() {
        let errors = Errors::default();
        let mut scope = errors.scope();
        scope.wrap_after(None, [Attr::uint("k", 1)]);
        assert_eq!(scope.finish(Ok::<_, Error>(5)).ok(), Some(5));
    }

    #[test]
    fn drop_runs_pending_cleanups() {
        let ran = RefCell::new(false);
        {
            let errors = Errors::default();
            let mut scope = errors.scope();
            scope.defer(|| {
                *ran.borrow_mut() = true;
                Ok::<_, Error>(())
            });
        }
        assert!(*ran.borrow());
    }
}
