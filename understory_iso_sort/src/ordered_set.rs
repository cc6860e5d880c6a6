// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Insertion-ordered set with O(1) membership, insert, and removal.

use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::HashMap;

/// A set that iterates in insertion order and removes in O(1).
///
/// Removal swaps the last element into the vacated slot, so the relative
/// order of the remaining items is preserved except for the one that moved.
/// Items are copied in, which suits small handles such as
/// [`ObjectId`](crate::ObjectId).
///
/// ```
/// use understory_iso_sort::OrderedSet;
///
/// let mut set = OrderedSet::new();
/// set.insert(1_u32);
/// set.insert(2);
/// set.insert(3);
/// set.insert(2);
/// assert_eq!(set.as_slice(), &[1, 2, 3]);
///
/// set.remove(&1);
/// assert_eq!(set.as_slice(), &[3, 2]);
/// assert!(!set.contains(&1));
/// ```
#[derive(Clone, Debug)]
pub struct OrderedSet<T> {
    items: Vec<T>,
    slots: HashMap<T, usize>,
}

impl<T> Default for OrderedSet<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            slots: HashMap::new(),
        }
    }
}

impl<T: Copy + Eq + Hash> OrderedSet<T> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty set with room for `capacity` items.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            slots: HashMap::with_capacity(capacity),
        }
    }

    /// Insert `item` at the end. Returns `false` if it was already present.
    pub fn insert(&mut self, item: T) -> bool {
        if self.slots.contains_key(&item) {
            return false;
        }
        self.slots.insert(item, self.items.len());
        self.items.push(item);
        true
    }

    /// Remove `item`. Returns `false` if it was not present.
    pub fn remove(&mut self, item: &T) -> bool {
        let Some(slot) = self.slots.remove(item) else {
            return false;
        };
        self.items.swap_remove(slot);
        if let Some(&moved) = self.items.get(slot) {
            *self
                .slots
                .get_mut(&moved)
                .expect("ordered set invariant violated: moved item has no slot") = slot;
        }
        true
    }

    /// Whether `item` is present.
    #[inline]
    pub fn contains(&self, item: &T) -> bool {
        self.slots.contains_key(item)
    }

    /// Remove every item, keeping allocations.
    pub fn clear(&mut self) {
        self.items.clear();
        self.slots.clear();
    }

    /// Number of items.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in iteration order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Iterate items in iteration order.
    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<'a, T: Copy + Eq + Hash> IntoIterator for &'a OrderedSet<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn insert_is_idempotent() {
        let mut set = OrderedSet::new();
        assert!(set.insert(7_u32));
        assert!(!set.insert(7));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn remove_last_does_not_reindex() {
        let mut set = OrderedSet::new();
        set.insert(1_u32);
        set.insert(2);
        assert!(set.remove(&2));
        assert_eq!(set.as_slice(), &[1]);
        assert!(set.contains(&1));
        assert!(!set.remove(&2));
    }

    #[test]
    fn remove_middle_keeps_indices_consistent() {
        let mut set = OrderedSet::new();
        for i in 0..5_u32 {
            set.insert(i);
        }
        set.remove(&1);
        assert_eq!(set.as_slice(), &[0, 4, 2, 3]);

        // The moved item must still be removable through its new slot.
        set.remove(&4);
        assert_eq!(set.as_slice(), &[0, 3, 2]);
        set.remove(&0);
        set.remove(&2);
        set.remove(&3);
        assert!(set.is_empty());
    }

    #[test]
    fn clear_then_reuse() {
        let mut set = OrderedSet::with_capacity(4);
        set.insert(1_u32);
        set.insert(2);
        set.clear();
        assert!(set.is_empty());
        set.insert(2);
        set.insert(1);
        let items: Vec<_> = set.iter().copied().collect();
        assert_eq!(items, vec![2, 1]);
    }
}
