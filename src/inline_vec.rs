//! Append-only small vector backing the attribute store.
//!
//! The first `N` elements live in an inline array, the rest in a `Vec` that is
//! only allocated on overflow. Safe Rust only; compiled when the `smallvec`
//! feature is off.

#![cfg(not(feature = "smallvec"))]

use std::fmt;
use std::slice;

/// Up to `N` elements inline, then a heap tail.
///
/// Inline slots are `Option<T>` so the type needs no `unsafe` to track
/// initialization. Elements are only ever appended; the store built on top of
/// this is immutable once constructed, so there is no removal API.
pub struct InlineVec<T, const N: usize> {
    /// Number of elements stored (inline or heap).
    len: usize,
    /// Inline storage slots.
    inline: [Option<T>; N],
    /// Heap storage for overflow. Empty (and unallocated) until first spillover.
    heap: Vec<T>,
}

impl<T, const N: usize> InlineVec<T, N> {
    /// Create a new empty InlineVec.
    #[inline]
    pub const fn new() -> Self {
        Self {
            len: 0,
            inline: [const { None }; N],
            heap: Vec::new(),
        }
    }

    /// Returns the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true once any element lives on the heap.
    #[inline]
    pub fn spilled(&self) -> bool {
        !self.heap.is_empty()
    }

    /// Append an element.
    #[inline]
    pub fn push(&mut self, value: T) {
        if self.len < N {
            self.inline[self.len] = Some(value);
        } else {
            self.heap.push(value);
        }
        self.len += 1;
    }

    /// Get element at index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        if index < N {
            self.inline[index].as_ref()
        } else {
            self.heap.get(index - N)
        }
    }

    /// Get a mutable reference to the element at index.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len {
            return None;
        }
        if index < N {
            self.inline[index].as_mut()
        } else {
            self.heap.get_mut(index - N)
        }
    }

    /// Iterate over elements, inline slots first.
    #[inline]
    pub fn iter(&self) -> InlineVecIter<'_, T> {
        InlineVecIter {
            inline: self.inline[..self.len.min(N)].iter(),
            heap: self.heap.iter(),
        }
    }
}

impl<T, const N: usize> Default for InlineVec<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, const N: usize> Clone for InlineVec<T, N> {
    fn clone(&self) -> Self {
        Self {
            len: self.len,
            inline: self.inline.clone(),
            heap: self.heap.clone(),
        }
    }
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for InlineVec<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Borrowing iterator: the occupied inline slots, then the heap tail.
pub struct InlineVecIter<'a, T> {
    inline: slice::Iter<'a, Option<T>>,
    heap: slice::Iter<'a, T>,
}

impl<T> Clone for InlineVecIter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            inline: self.inline.clone(),
            heap: self.heap.clone(),
        }
    }
}

impl<'a, T> Iterator for InlineVecIter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        // Occupied slots are always `Some`; `flatten` just skips the check.
        match self.inline.by_ref().flatten().next() {
            Some(item) => Some(item),
            None => self.heap.next(),
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.inline.len() + self.heap.len();
        (remaining, Some(remaining))
    }
}

impl<T> DoubleEndedIterator for InlineVecIter<'_, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        match self.heap.next_back() {
            Some(item) => Some(item),
            None => self.inline.by_ref().rev().flatten().next(),
        }
    }
}

impl<T> ExactSizeIterator for InlineVecIter<'_, T> {}
