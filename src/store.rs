//! Per-error attribute storage.
//!
//! [`AttrStore`] keeps up to [`INLINE_ATTRS`] attributes without touching the
//! heap. Once built it cannot grow: an error's metadata is fixed at creation so
//! that two threads wrapping the same error never race on a shared list.

use std::fmt;

use crate::value::Attr;

/// Number of attributes stored inline before spilling to the heap.
pub const INLINE_ATTRS: usize = 5;

// ============================================================================
// AttrVec - configurable storage backend
// ============================================================================

/// Stack-first attribute storage using smallvec.
#[cfg(feature = "smallvec")]
type AttrVec = smallvec::SmallVec<[Attr; INLINE_ATTRS]>;

/// Stack-first attribute storage using the built-in InlineVec (default).
#[cfg(not(feature = "smallvec"))]
type AttrVec = crate::inline_vec::InlineVec<Attr, INLINE_ATTRS>;

// ============================================================================
// AttrStore
// ============================================================================

/// An ordered, immutable set of attributes with unique keys.
///
/// ```rust
/// use attrerr::{Attr, AttrStore};
///
/// let store = AttrStore::new([
///     Attr::string("user", "ada"),
///     Attr::uint("id", 1),
///     Attr::string("user", "grace"),
/// ]);
/// assert_eq!(store.len(), 2);
/// // Last write wins, first position kept.
/// let keys: Vec<_> = store.iter().map(|a| a.to_string()).collect();
/// assert_eq!(keys, ["user=grace", "id=1"]);
/// ```
#[derive(Clone, Default)]
pub struct AttrStore {
    attrs: AttrVec,
}

impl AttrStore {
    /// Store `attrs` in insertion order.
    ///
    /// Duplicate keys are last-write-wins; attributes with an empty key are dropped.
    pub fn new(attrs: impl IntoIterator<Item = Attr>) -> Self {
        let mut builder = StoreBuilder::new();
        for attr in attrs {
            builder.insert(attr);
        }
        builder.build()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// A fresh traversal of the attributes, in insertion order.
    #[inline]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.attrs.iter(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Attr> {
        self.iter().find(|a| a.key() == key)
    }

    /// True when the attributes live entirely inline.
    pub fn is_inline(&self) -> bool {
        !self.attrs.spilled()
    }
}

impl fmt::Debug for AttrStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a AttrStore {
    type Item = &'a Attr;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the attributes of an [`AttrStore`].
#[derive(Clone)]
pub struct Iter<'a> {
    #[cfg(feature = "smallvec")]
    inner: core::slice::Iter<'a, Attr>,
    #[cfg(not(feature = "smallvec"))]
    inner: crate::inline_vec::InlineVecIter<'a, Attr>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Attr;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl ExactSizeIterator for Iter<'_> {}

// ============================================================================
// StoreBuilder - the only way to add attributes
// ============================================================================

/// Collects attributes for a node under construction.
///
/// Crate-private: users get an immutable [`AttrStore`].
pub(crate) struct StoreBuilder {
    attrs: AttrVec,
}

impl StoreBuilder {
    pub(crate) fn new() -> Self {
        Self {
            attrs: AttrVec::new(),
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.attrs.iter().position(|a| a.key() == key)
    }

    /// Insert, replacing the value of an existing key in place.
    pub(crate) fn insert(&mut self, attr: Attr) {
        if attr.key().is_empty() {
            return;
        }
        match self.position(attr.key()) {
            Some(idx) => {
                if let Some(slot) = self.attrs.get_mut(idx) {
                    *slot = attr;
                }
            }
            None => self.attrs.push(attr),
        }
    }

    /// Insert only if the key is not present yet.
    pub(crate) fn insert_if_absent(&mut self, attr: Attr) {
        if attr.key().is_empty() || self.position(attr.key()).is_some() {
            return;
        }
        self.attrs.push(attr);
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub(crate) fn build(self) -> AttrStore {
        AttrStore { attrs: self.attrs }
    }
}
