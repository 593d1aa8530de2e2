//! Walking error chains and folding their metadata.
//!
//! Precedence when the same key appears more than once:
//!
//! - Along a chain, the node closest to the head (most recently wrapped) wins.
//! - Among the children of one [`JoinedError`], children are folded in order
//!   and a later sibling overwrites an earlier one.
//!
//! A joined node's folded set is then treated like any other node at that
//! depth: it only fills keys not already set closer to the head.

use std::borrow::Cow;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;

use crate::config::AttrCompare;
use crate::error::{AttrError, JoinedError, LookupError};
use crate::value::{Attr, FromValue, Value};

// ============================================================================
// AttrMap - insertion-ordered, deduplicated attributes
// ============================================================================

/// Flattened metadata of an error chain.
///
/// Keys are unique. Iteration follows the order keys were first set during the
/// fold: head to root, joined children in listed order.
#[derive(Clone, Default)]
pub struct AttrMap {
    entries: Vec<Attr>,
    /// Key to position in `entries`.
    index: HashMap<Cow<'static, str>, usize>,
}

impl AttrMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.position(key).map(|idx| self.entries[idx].value())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Typed lookup. Absence and type mismatch are reported, never panicked on.
    pub fn get_as<T: FromValue>(&self, key: &str) -> Result<T, LookupError> {
        let value = self.get(key).ok_or_else(|| LookupError::NotFound {
            key: key.to_string(),
        })?;
        T::from_value(value).ok_or_else(|| LookupError::WrongType {
            key: key.to_string(),
            expected: T::KIND,
            found: value.kind(),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attr> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(Attr::key)
    }

    /// Consume into a vector sorted with `compare`.
    pub fn into_sorted(mut self, compare: AttrCompare) -> Vec<Attr> {
        self.entries.sort_by(compare);
        self.entries
    }

    pub fn into_vec(self) -> Vec<Attr> {
        self.entries
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    fn push(&mut self, attr: Attr) {
        self.index.insert(attr.key_cow().clone(), self.entries.len());
        self.entries.push(attr);
    }

    /// Overwrite an existing key in place, or append.
    pub(crate) fn insert(&mut self, attr: Attr) {
        match self.position(attr.key()) {
            Some(idx) => self.entries[idx] = attr,
            None => self.push(attr),
        }
    }

    pub(crate) fn insert_if_absent(&mut self, attr: Attr) {
        if !self.contains_key(attr.key()) {
            self.push(attr);
        }
    }

    /// Remove a key, returning its attribute. Later entries shift down by one.
    pub(crate) fn take(&mut self, key: &str) -> Option<Attr> {
        let idx = self.index.remove(key)?;
        for pos in self.index.values_mut() {
            if *pos > idx {
                *pos -= 1;
            }
        }
        Some(self.entries.remove(idx))
    }
}

impl PartialEq for AttrMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl fmt::Debug for AttrMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|a| (a.key(), a.value())))
            .finish()
    }
}

impl IntoIterator for AttrMap {
    type Item = Attr;
    type IntoIter = std::vec::IntoIter<Attr>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a AttrMap {
    type Item = &'a Attr;
    type IntoIter = std::slice::Iter<'a, Attr>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ============================================================================
// Flatten
// ============================================================================

/// Fold every structured node's attributes in `err`'s tree into one map.
///
/// Returns an empty map when the tree holds no [`AttrError`].
///
/// ```rust
/// use attrerr::{Attr, Config, Errors};
///
/// let errors = Errors::with_config(Config::builder().source_key("").build());
/// let inner = errors.wrap_attrs(std::io::Error::other("eof"), [Attr::uint("a", 1), Attr::uint("k", 1)]);
/// let outer = errors.wrap_attrs(inner, [Attr::uint("b", 2), Attr::uint("k", 2)]);
///
/// let map = attrerr::flatten(&outer);
/// let rendered: Vec<_> = map.iter().map(|a| a.to_string()).collect();
/// assert_eq!(rendered, ["b=2", "k=2", "a=1"]);
/// ```
pub(crate) fn flatten(err: &(dyn StdError + 'static)) -> AttrMap {
    let mut out = AttrMap::new();
    fold_chain(err, &mut out);
    out
}

/// [`flatten`], sorted with `compare`.
pub(crate) fn flatten_sorted(err: &(dyn StdError + 'static), compare: AttrCompare) -> Vec<Attr> {
    flatten(err).into_sorted(compare)
}

fn fold_chain(err: &(dyn StdError + 'static), out: &mut AttrMap) {
    let mut cur = Some(err);
    while let Some(e) = cur {
        if let Some(node) = e.downcast_ref::<AttrError>() {
            for attr in node.attrs() {
                out.insert_if_absent(attr.clone());
            }
        } else if let Some(joined) = e.downcast_ref::<JoinedError>() {
            let mut siblings = AttrMap::new();
            for child in joined.errors() {
                for attr in flatten(child.as_std()) {
                    siblings.insert(attr);
                }
            }
            for attr in siblings {
                out.insert_if_absent(attr);
            }
            return;
        }
        cur = e.source();
    }
}

// ============================================================================
// Tree walking
// ============================================================================

/// Depth-first, pre-order search over the chain and every joined child.
pub(crate) fn find_map<'a, R, F>(err: &'a (dyn StdError + 'static), f: &mut F) -> Option<R>
where
    F: FnMut(&'a (dyn StdError + 'static)) -> Option<R>,
{
    let mut cur = Some(err);
    while let Some(e) = cur {
        if let Some(found) = f(e) {
            return Some(found);
        }
        if let Some(joined) = e.downcast_ref::<JoinedError>() {
            return joined
                .errors()
                .iter()
                .find_map(|child| find_map(child.as_std(), &mut *f));
        }
        cur = e.source();
    }
    None
}

/// True if any node in the tree is an [`AttrError`].
pub(crate) fn contains_attr_error(err: &(dyn StdError + 'static)) -> bool {
    find_map(err, &mut |e| e.is::<AttrError>().then_some(())).is_some()
}

/// Iterator over a `source()` chain, head first.
///
/// Stops at a [`JoinedError`], whose children are separate chains.
#[derive(Clone)]
pub struct Chain<'a> {
    next: Option<&'a (dyn StdError + 'static)>,
}

impl<'a> Chain<'a> {
    pub fn new(head: &'a (dyn StdError + 'static)) -> Self {
        Self { next: Some(head) }
    }
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a (dyn StdError + 'static);

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next?;
        self.next = cur.source();
        Some(cur)
    }
}
