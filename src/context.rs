//! Request-scoped attributes carried until the next wrap.
//!
//! A [`Context`] is a chain of immutable layers. [`Context::attach`] never
//! mutates the receiver; it returns a new layer holding `new ++ existing`, so
//! two threads extending the same parent never see each other's attributes.

use std::fmt;
use std::sync::Arc;

use crate::value::Attr;

/// Attributes waiting to be merged into the next error wrapped with this context.
///
/// ```rust
/// use attrerr::{Attr, Context};
///
/// let root = Context::background().attach([Attr::uint("request_id", 42)]);
/// let child = root.attach([Attr::string("user", "ada")]);
///
/// assert_eq!(root.attrs().len(), 1);
/// let keys: Vec<_> = child.attrs().iter().map(Attr::key).collect();
/// assert_eq!(keys, ["user", "request_id"]);
/// ```
#[derive(Clone, Default)]
pub struct Context {
    attrs: Option<Arc<[Attr]>>,
}

impl Context {
    /// An empty root context.
    pub fn background() -> Self {
        Self::default()
    }

    /// A new layer with `attrs` listed before this context's attributes.
    ///
    /// Listed-first attributes take priority when merged into an error.
    pub fn attach(&self, attrs: impl IntoIterator<Item = Attr>) -> Context {
        let mut layer: Vec<Attr> = attrs.into_iter().collect();
        layer.extend(self.attrs().iter().cloned());
        Context {
            attrs: Some(layer.into()),
        }
    }

    pub fn attrs(&self) -> &[Attr] {
        self.attrs.as_deref().unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.attrs().is_empty()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("attrs", &self.attrs()).finish()
    }
}

/// The pending attributes of `ctx`, empty for `None`.
pub fn read(ctx: Option<&Context>) -> &[Attr] {
    ctx.map(Context::attrs).unwrap_or(&[])
}

/// [`Context::attach`] for an optional context. `None` stays `None`.
pub fn attach(ctx: Option<&Context>, attrs: impl IntoIterator<Item = Attr>) -> Option<Context> {
    ctx.map(|c| c.attach(attrs))
}
