/// `BTMap` is an ordered map stored in a B-tree whose order (M) is a const generic.
/// M is the element count at which a node must split, it must be odd and at least 3.
/// Every node other than the root holds between M/2 and M-1 elements at rest.
///
/// General guide to implementation:
///
/// [`BTMap`] has a length and a root `Node`. A `Node` has a vector of pairs and,
/// if it is not a leaf, a vector of child nodes with one more entry than the pairs.
///
/// Mutations recurse from the root. Each recursive call reports back to its caller
/// (overflow on insert, underflow on remove), and the caller repairs the child
/// it just visited: splitting it, or borrowing for it from a sibling, or merging it with one.
///
/// An order that is even or less than 3 is rejected when the map is constructed:
///
/// ```compile_fail
/// let _m = btmap::bt::BTMap::<i32, i32, 4>::new();
/// ```
pub struct BTMap<K, V, const M: usize> {
    pub(crate) len: usize,
    pub(crate) root: Node<K, V, M>,
}
impl<K, V, const M: usize> Default for BTMap<K, V, M> {
    fn default() -> Self {
        Self::new()
    }
}
impl<K, V, const M: usize> BTMap<K, V, M> {
    /// This should produce a compile-time error if M is unusable.
    const CHECK_M: usize = {
        assert!(M >= 3, "BTMap order must be at least 3");
        assert!(M % 2 == 1, "BTMap order must be odd");
        0
    };

    /// Returns a new, empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            len: Self::CHECK_M,
            root: Node::default(),
        }
    }

    /// Clear the map.
    pub fn clear(&mut self) {
        self.len = 0;
        self.root = Node::default();
    }

    /// Get number of key-value pairs in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Is the map empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of node levels, 1 for a map whose root is a leaf.
    #[must_use]
    pub fn height(&self) -> usize {
        let mut h = 1;
        let mut n = &self.root;
        while let Some(c) = n.c.first() {
            h += 1;
            n = c;
        }
        h
    }

    /// Insert key-value pair into map, or if key is already in map, replaces value and returns old value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V>
    where
        K: Ord,
    {
        let result = match self.root.insert(key, value) {
            Insert::Replaced(old) => Some(old),
            Insert::Added => None,
            Insert::Overflow => {
                self.new_root();
                None
            }
        };
        if result.is_none() {
            self.len += 1;
        }
        check_invariants!(self);
        result
    }

    /// Root is full: split it and grow the tree by one level.
    fn new_root(&mut self) {
        let (med, left, right) = std::mem::take(&mut self.root).split();
        let mut root = Node::default();
        root.v.push(med);
        root.c.reserve(M + 1);
        root.c.push(left);
        root.c.push(right);
        self.root = root;
        trace!("root split, height now {}", self.height());
    }

    /// Does the map have an entry for the specified key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.get_key_value(key).is_some()
    }

    /// Remove key-value pair from map, returning just the value.
    /// Removing a key that is not present changes nothing and returns None.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.remove_entry(key).map(|(_k, v)| v)
    }

    /// Remove key-value pair from map.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let (kv, underflow) = self.root.remove(key)?;
        self.len -= 1;
        if underflow && self.root.v.is_empty() {
            // Merging has emptied the root into its only child.
            if let Some(child) = self.root.c.pop() {
                self.root = child;
                trace!("root collapsed, height now {}", self.height());
            }
        }
        check_invariants!(self);
        Some(kv)
    }

    /// Get reference to the value corresponding to the key.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.get_key_value(key).map(|(_k, v)| v)
    }

    /// Get a mutable reference to the value corresponding to the key.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.root.get_mut(key)
    }

    /// Get references to the corresponding key and value.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.root.get_key_value(key)
    }

    /// Breadth-first rendering of the node keys, one line per level.
    ///
    /// ```
    ///     let mut m = btmap::BTMap::new();
    ///     for i in 1..=5 {
    ///         m.insert(i, ());
    ///     }
    ///     assert_eq!(m.dump(), "[2,4]\n[1] [3] [5] \n");
    /// ```
    #[must_use]
    pub fn dump(&self) -> String
    where
        K: Display,
    {
        Dump(&self.root).to_string()
    }

    /// Validate the structure of the whole tree, returning the first violation found.
    pub fn check(&self) -> Result<(), CheckError>
    where
        K: Ord,
    {
        let mut leaf_depth = None;
        let counted = self.root.check(0, None, None, &mut leaf_depth)?;
        if counted != self.len {
            return Err(CheckError::LenMismatch {
                len: self.len,
                counted,
            });
        }
        Ok(())
    }

    /// Key-value pairs in ascending key order.
    pub(crate) fn entries(&self) -> Vec<(&K, &V)> {
        let mut result = Vec::with_capacity(self.len);
        self.root.walk(&mut |k, v| result.push((k, v)));
        result
    }
}

impl<K: Clone, V: Clone, const M: usize> Clone for BTMap<K, V, M> {
    fn clone(&self) -> Self {
        Self {
            len: self.len,
            root: self.root.clone(),
        }
    }
}
impl<K: PartialEq, V: PartialEq, const M: usize> PartialEq for BTMap<K, V, M> {
    fn eq(&self, other: &BTMap<K, V, M>) -> bool {
        self.len == other.len && self.entries() == other.entries()
    }
}
impl<K: Eq, V: Eq, const M: usize> Eq for BTMap<K, V, M> {}

impl<K: Ord, V, const M: usize> FromIterator<(K, V)> for BTMap<K, V, M> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> BTMap<K, V, M> {
        let mut map = BTMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
impl<K: Ord, V, const M: usize, const N: usize> From<[(K, V); N]> for BTMap<K, V, M> {
    fn from(arr: [(K, V); N]) -> BTMap<K, V, M> {
        arr.into_iter().collect()
    }
}
impl<K: Ord, V, const M: usize> Extend<(K, V)> for BTMap<K, V, M> {
    fn extend<T>(&mut self, iter: T)
    where
        T: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}
impl<K, Q, V, const M: usize> std::ops::Index<&Q> for BTMap<K, V, M>
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
{
    type Output = V;

    /// Returns a reference to the value corresponding to the supplied key.
    ///
    /// Panics if the key is not present in the `BTMap`.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}
impl<K: Debug, V: Debug, const M: usize> Debug for BTMap<K, V, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries()).finish()
    }
}

use crate::{check::CheckError, dump::Dump};
use arrayvec::ArrayVec;
use log::trace;
use std::{
    borrow::Borrow,
    fmt,
    fmt::{Debug, Display},
};

/// Element storage: a node holds M elements only between an insert and the split that follows.
pub(crate) type PairVec<K, V, const M: usize> = ArrayVec<(K, V), M>;

type Split<K, V, const M: usize> = ((K, V), Node<K, V, M>, Node<K, V, M>);

/// Result of inserting into a subtree.
enum Insert<V> {
    Replaced(V),
    Added,
    /// Subtree root now holds M elements, caller must split it.
    Overflow,
}

/// Removed pair and whether the subtree root fell below the minimum.
type Removed<K, V> = Option<((K, V), bool)>;

#[derive(Clone, Debug)]
pub(crate) struct Node<K, V, const M: usize> {
    pub(crate) v: PairVec<K, V, M>,
    pub(crate) c: Vec<Node<K, V, M>>,
}
impl<K, V, const M: usize> Default for Node<K, V, M> {
    fn default() -> Self {
        Self {
            v: ArrayVec::new(),
            c: Vec::new(),
        }
    }
}
impl<K, V, const M: usize> Node<K, V, M> {
    /// Minimum element count for a node other than the root.
    pub(crate) const D: usize = M / 2;

    pub(crate) fn is_leaf(&self) -> bool {
        self.c.is_empty()
    }

    fn full(&self) -> bool {
        self.v.len() == M
    }

    fn underfull(&self) -> bool {
        self.v.len() < Self::D
    }

    /// Has an element to spare for a sibling.
    fn rich(&self) -> bool {
        self.v.len() > Self::D
    }

    /// Ok(i) if key is at i, otherwise Err(i) where i is the position (or child) it belongs in.
    fn find<Q>(&self, key: &Q) -> Result<usize, usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.v.binary_search_by(|x| x.0.borrow().cmp(key))
    }

    fn insert(&mut self, key: K, value: V) -> Insert<V>
    where
        K: Ord,
    {
        let i = match self.find(&key) {
            Ok(i) => return Insert::Replaced(std::mem::replace(&mut self.v[i].1, value)),
            Err(i) => i,
        };
        if self.is_leaf() {
            self.v.insert(i, (key, value));
        } else {
            match self.c[i].insert(key, value) {
                Insert::Overflow => self.split_child(i),
                other => return other,
            }
        }
        if self.full() {
            Insert::Overflow
        } else {
            Insert::Added
        }
    }

    /// Split a node holding exactly M elements into (median, left, right).
    fn split(mut self) -> Split<K, V, M> {
        let mid = M / 2;
        let mut right = Node {
            v: self.v.drain(mid + 1..).collect(),
            c: Vec::new(),
        };
        if !self.is_leaf() {
            right.c = self.c.split_off(mid + 1);
        }
        let med = self.v.remove(mid);
        (med, self, right)
    }

    fn split_child(&mut self, i: usize) {
        let (med, left, right) = std::mem::take(&mut self.c[i]).split();
        self.c[i] = left;
        self.v.insert(i, med);
        self.c.insert(i + 1, right);
        trace!("split child {}, parent now holds {} elements", i, self.v.len());
    }

    fn remove<Q>(&mut self, key: &Q) -> Removed<K, V>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let kv = match self.find(key) {
            Ok(i) if self.is_leaf() => self.v.remove(i),
            Err(_) if self.is_leaf() => return None,
            Ok(i) => {
                // Replace with the in-order predecessor taken from the left subtree.
                let (pred, underflow) = self.c[i].remove_rightmost()?;
                let kv = std::mem::replace(&mut self.v[i], pred);
                if underflow {
                    self.fix_from_right(i);
                }
                kv
            }
            Err(i) => {
                let (kv, underflow) = self.c[i].remove(key)?;
                if underflow {
                    if i == self.v.len() {
                        self.fix_from_left(i);
                    } else {
                        self.fix_from_right(i);
                    }
                }
                kv
            }
        };
        Some((kv, self.underfull()))
    }

    /// Remove the greatest pair in the subtree.
    fn remove_rightmost(&mut self) -> Removed<K, V> {
        if self.is_leaf() {
            let kv = self.v.pop()?;
            return Some((kv, self.underfull()));
        }
        let last = self.c.len() - 1;
        let (kv, underflow) = self.c[last].remove_rightmost()?;
        if underflow {
            self.fix_from_left(last);
        }
        Some((kv, self.underfull()))
    }

    /// Child at pos is underfull, borrow from or merge with its right sibling.
    fn fix_from_right(&mut self, pos: usize) {
        debug_assert!(pos < self.v.len());
        if self.c[pos + 1].rich() {
            let (left, right) = self.c.split_at_mut(pos + 1);
            let (child, sib) = (&mut left[pos], &mut right[0]);
            let med = std::mem::replace(&mut self.v[pos], sib.v.remove(0));
            child.v.push(med);
            if !sib.is_leaf() {
                child.c.push(sib.c.remove(0));
            }
            trace!("borrowed from right sibling of child {}", pos);
        } else {
            let med = self.v.remove(pos);
            let sib = self.c.remove(pos + 1);
            let child = &mut self.c[pos];
            child.v.push(med);
            child.absorb(sib);
            trace!("merged child {} with right sibling", pos);
        }
    }

    /// Child at pos is underfull, borrow from or merge with its left sibling.
    fn fix_from_left(&mut self, pos: usize) {
        debug_assert!(pos > 0 && pos == self.v.len());
        if self.c[pos - 1].rich() {
            let (left, right) = self.c.split_at_mut(pos);
            let (sib, child) = (&mut left[pos - 1], &mut right[0]);
            let last = sib.v.len() - 1;
            let med = std::mem::replace(&mut self.v[pos - 1], sib.v.remove(last));
            child.v.insert(0, med);
            if let Some(c) = sib.c.pop() {
                child.c.insert(0, c);
            }
            trace!("borrowed from left sibling of child {}", pos);
        } else {
            let child = self.c.remove(pos);
            let med = self.v.remove(pos - 1);
            let sib = &mut self.c[pos - 1];
            sib.v.push(med);
            sib.absorb(child);
            trace!("merged child {} into left sibling", pos);
        }
    }

    /// Append the pairs and children of a right-hand neighbour.
    fn absorb(&mut self, other: Self) {
        self.v.extend(other.v);
        self.c.extend(other.c);
    }

    fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        match self.find(key) {
            Ok(i) => {
                let kv = &self.v[i];
                Some((&kv.0, &kv.1))
            }
            Err(i) => self.c.get(i)?.get_key_value(key),
        }
    }

    fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        match self.find(key) {
            Ok(i) => Some(&mut self.v[i].1),
            Err(i) => self.c.get_mut(i)?.get_mut(key),
        }
    }

    /// Visit pairs in ascending key order.
    pub(crate) fn walk<'a, F>(&'a self, action: &mut F)
    where
        F: FnMut(&'a K, &'a V),
    {
        for (i, kv) in self.v.iter().enumerate() {
            if let Some(c) = self.c.get(i) {
                c.walk(action);
            }
            action(&kv.0, &kv.1);
        }
        if let Some(c) = self.c.get(self.v.len()) {
            c.walk(action);
        }
    }
} // End impl Node
