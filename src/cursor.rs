//! Cursors and borrowing iterators over a `HashTable`.
//!
//! A [`Cursor`] is a detached position: it names a node and the bucket it
//! was found in, and borrows nothing. That keeps it usable while the table
//! is mutated elsewhere, which is what makes cursors chain-stable.
//!
//! Invalidation contract
//! - Inserting or erasing *other* nodes never invalidates a cursor, even
//!   nodes in the same chain: successors are read from the arena at the
//!   time the cursor is advanced.
//! - Erasing the node a cursor points at turns it stale. Stale cursors
//!   resolve to `None`; generational keys prevent them from aliasing a
//!   node inserted later. Advancing a stale cursor returns `end()`.
//! - A rehash (explicit, via `reserve`, or triggered by an insert)
//!   invalidates every cursor. Nodes are relinked into a new bucket array
//!   and no cursor recovery is attempted. Debug builds panic when an
//!   invalidated cursor is used; release builds stay memory safe but may
//!   skip or repeat nodes when advancing it.

use crate::epoch::Stamp;
use crate::node::{successor, Arena, BucketArray, Chain, Node, NodeKey};
use crate::table::{HashTable, KeyMode};
use core::hash::{Hash, Hasher};
use core::iter::FusedIterator;

/// Position of one element in a [`HashTable`], or the end position.
#[derive(Copy, Clone, Debug)]
pub struct Cursor {
    pub(crate) node: Option<NodeKey>,
    pub(crate) bucket: usize,
    pub(crate) stamp: Stamp,
}

impl Cursor {
    #[inline]
    pub(crate) fn new(node: Option<NodeKey>, bucket: usize, stamp: Stamp) -> Self {
        Self {
            node,
            bucket,
            stamp,
        }
    }

    /// True for the past-the-end position.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    /// Bucket index the element was located in; `bucket_count()` for the
    /// end position.
    #[inline]
    pub fn bucket(&self) -> usize {
        self.bucket
    }

    pub fn key<'a, K, V, M, S>(&self, table: &'a HashTable<K, V, M, S>) -> Option<&'a K>
    where
        M: KeyMode,
    {
        table.cursor_node(*self).map(|n| &n.key)
    }

    pub fn value<'a, K, V, M, S>(&self, table: &'a HashTable<K, V, M, S>) -> Option<&'a V>
    where
        M: KeyMode,
    {
        table.cursor_node(*self).map(|n| &n.value)
    }

    pub fn entry<'a, K, V, M, S>(&self, table: &'a HashTable<K, V, M, S>) -> Option<(&'a K, &'a V)>
    where
        M: KeyMode,
    {
        table.cursor_node(*self).map(|n| (&n.key, &n.value))
    }

    pub fn value_mut<'a, K, V, M, S>(
        &self,
        table: &'a mut HashTable<K, V, M, S>,
    ) -> Option<&'a mut V>
    where
        M: KeyMode,
    {
        table.cursor_node_mut(*self).map(|n| &mut n.value)
    }
}

// Positions compare by node only: every end cursor is equal to every other.
impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Eq for Cursor {}

impl Hash for Cursor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.hash(state);
    }
}

/// Iterator over `(&K, &V)` in bucket order, then chain order.
pub struct Iter<'a, K, V> {
    nodes: &'a Arena<K, V>,
    buckets: &'a BucketArray,
    pos: Option<(usize, NodeKey)>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(nodes: &'a Arena<K, V>, buckets: &'a BucketArray) -> Self {
        Self {
            nodes,
            buckets,
            pos: buckets.next_occupied(0),
            remaining: nodes.len(),
        }
    }
}

impl<'a, K, V> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (bucket, key) = self.pos?;
        let node = &self.nodes[key];
        self.pos = successor(self.nodes, self.buckets, key, bucket);
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in arena order.
pub struct IterMut<'a, K, V> {
    it: slotmap::basic::IterMut<'a, NodeKey, Node<K, V>>,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(nodes: &'a mut Arena<K, V>) -> Self {
        Self {
            it: nodes.iter_mut(),
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, n)| (&n.key, &mut n.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

/// Owning iterator over `(K, V)` in arena order.
pub struct IntoIter<K, V> {
    it: slotmap::basic::IntoIter<NodeKey, Node<K, V>>,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(nodes: Arena<K, V>) -> Self {
        Self {
            it: nodes.into_iter(),
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, n)| (n.key, n.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

/// Iterator over the elements of a single bucket chain.
pub struct BucketIter<'a, K, V> {
    chain: Chain<'a, K, V>,
}

impl<'a, K, V> BucketIter<'a, K, V> {
    pub(crate) fn new(nodes: &'a Arena<K, V>, head: Option<NodeKey>) -> Self {
        Self {
            chain: Chain::new(nodes, head),
        }
    }
}

impl<'a, K, V> Iterator for BucketIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.chain.next().map(|(_, n)| (&n.key, &n.value))
    }
}

impl<K, V> FusedIterator for BucketIter<'_, K, V> {}

/// Iterator over every element whose key equals a probe. Equal keys share
/// a hash and therefore a chain, so only that chain is walked.
pub struct GetAll<'a, K, V, Q: ?Sized> {
    chain: Chain<'a, K, V>,
    hash: u64,
    probe: &'a Q,
}

impl<'a, K, V, Q: ?Sized> GetAll<'a, K, V, Q> {
    pub(crate) fn new(chain: Chain<'a, K, V>, hash: u64, probe: &'a Q) -> Self {
        Self { chain, hash, probe }
    }
}

impl<'a, K, V, Q> Iterator for GetAll<'a, K, V, Q>
where
    K: core::borrow::Borrow<Q>,
    Q: ?Sized + Eq,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let (hash, probe) = (self.hash, self.probe);
        self.chain
            .find(|(_, n)| n.hash == hash && n.key.borrow() == probe)
            .map(|(_, n)| (&n.key, &n.value))
    }
}

impl<K, V, Q> FusedIterator for GetAll<'_, K, V, Q>
where
    K: core::borrow::Borrow<Q>,
    Q: ?Sized + Eq,
{
}
