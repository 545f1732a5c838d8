//! Hash nodes and the bucket array of chain heads.
//!
//! Nodes live in a generational arena and link to their chain successor by
//! key, so a stale key never aliases a node inserted later. The bucket array
//! only stores chain heads; each chain is threaded through `Node::next`.

use crate::error::TryReserveError;
use core::alloc::Layout;
use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Generational index of a node in the table's arena.
    pub(crate) struct NodeKey;
}

pub(crate) type Arena<K, V> = SlotMap<NodeKey, Node<K, V>>;

#[derive(Clone, Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    // Computed once on insert; rehashing never calls back into `K: Hash`.
    pub(crate) hash: u64,
    pub(crate) next: Option<NodeKey>,
}

/// Fixed-length sequence of chain heads. Never empty.
#[derive(Clone, Debug)]
pub(crate) struct BucketArray {
    heads: Box<[Option<NodeKey>]>,
}

impl BucketArray {
    /// Allocates `len` empty buckets through the global allocator, aborting
    /// on failure like `Vec` does.
    pub(crate) fn with_len(len: usize) -> Self {
        debug_assert!(len > 0);
        Self {
            heads: vec![None; len].into_boxed_slice(),
        }
    }

    /// Allocates `len` empty buckets, reporting allocator failure instead of
    /// aborting.
    pub(crate) fn try_with_len(len: usize) -> Result<Self, TryReserveError> {
        debug_assert!(len > 0);
        let layout = Layout::array::<Option<NodeKey>>(len)
            .map_err(|_| TryReserveError::CapacityOverflow)?;
        if injected_failure() {
            return Err(TryReserveError::AllocError { layout });
        }
        let mut heads = Vec::new();
        heads
            .try_reserve_exact(len)
            .map_err(|_| TryReserveError::AllocError { layout })?;
        heads.resize(len, None);
        Ok(Self {
            heads: heads.into_boxed_slice(),
        })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.heads.len()
    }

    #[inline]
    pub(crate) fn index_for(&self, hash: u64) -> usize {
        (hash % self.heads.len() as u64) as usize
    }

    #[inline]
    pub(crate) fn head(&self, bucket: usize) -> Option<NodeKey> {
        self.heads[bucket]
    }

    #[inline]
    pub(crate) fn set_head(&mut self, bucket: usize, head: Option<NodeKey>) {
        self.heads[bucket] = head;
    }

    /// Replaces the head of `bucket`, returning the previous one.
    #[inline]
    pub(crate) fn replace_head(&mut self, bucket: usize, head: Option<NodeKey>) -> Option<NodeKey> {
        core::mem::replace(&mut self.heads[bucket], head)
    }

    /// First non-empty bucket at or after `start`, with its head.
    pub(crate) fn next_occupied(&self, start: usize) -> Option<(usize, NodeKey)> {
        self.heads
            .get(start..)?
            .iter()
            .enumerate()
            .find_map(|(i, h)| h.map(|k| (start + i, k)))
    }

    pub(crate) fn clear(&mut self) {
        self.heads.fill(None);
    }
}

/// Walks one chain from a head, yielding each node with its key.
pub(crate) struct Chain<'a, K, V> {
    nodes: &'a Arena<K, V>,
    cur: Option<NodeKey>,
}

impl<'a, K, V> Chain<'a, K, V> {
    pub(crate) fn new(nodes: &'a Arena<K, V>, head: Option<NodeKey>) -> Self {
        Self { nodes, cur: head }
    }
}

impl<'a, K, V> Iterator for Chain<'a, K, V> {
    type Item = (NodeKey, &'a Node<K, V>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let k = self.cur?;
        let node = &self.nodes[k];
        self.cur = node.next;
        Some((k, node))
    }
}

/// Position following `(key, bucket)` in table order: the chain successor,
/// or the head of the next non-empty bucket. `None` once `key` is gone.
pub(crate) fn successor<K, V>(
    nodes: &Arena<K, V>,
    buckets: &BucketArray,
    key: NodeKey,
    bucket: usize,
) -> Option<(usize, NodeKey)> {
    match nodes.get(key)?.next {
        Some(next) => Some((bucket, next)),
        None => buckets.next_occupied(bucket + 1),
    }
}

#[cfg(test)]
thread_local! {
    static FAIL_NEXT_ALLOC: core::cell::Cell<bool> = const { core::cell::Cell::new(false) };
}

/// Makes the next `BucketArray::try_with_len` on this thread report an
/// allocation failure.
#[cfg(test)]
pub(crate) fn fail_next_alloc() {
    FAIL_NEXT_ALLOC.with(|f| f.set(true));
}

#[cfg(test)]
fn injected_failure() -> bool {
    FAIL_NEXT_ALLOC.with(|f| f.replace(false))
}

#[cfg(not(test))]
#[inline(always)]
fn injected_failure() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push<K, V>(nodes: &mut Arena<K, V>, buckets: &mut BucketArray, key: K, value: V, hash: u64) -> NodeKey {
        let b = buckets.index_for(hash);
        let next = buckets.head(b);
        let k = nodes.insert(Node {
            key,
            value,
            hash,
            next,
        });
        buckets.set_head(b, Some(k));
        k
    }

    #[test]
    fn index_is_hash_mod_len() {
        let b = BucketArray::with_len(7);
        assert_eq!(b.len(), 7);
        assert_eq!(b.index_for(0), 0);
        assert_eq!(b.index_for(13), 6);
        assert_eq!(b.index_for(u64::MAX), (u64::MAX % 7) as usize);
    }

    #[test]
    fn try_with_len_reports_overflow() {
        match BucketArray::try_with_len(usize::MAX) {
            Err(TryReserveError::CapacityOverflow) => {}
            other => panic!("unexpected result: {:?}", other.map(|b| b.len())),
        }
        assert_eq!(BucketArray::try_with_len(5).unwrap().len(), 5);
    }

    #[test]
    fn chain_is_reverse_insertion_order() {
        let mut nodes: Arena<&str, i32> = SlotMap::with_key();
        let mut buckets = BucketArray::with_len(1);
        push(&mut nodes, &mut buckets, "a", 1, 10);
        push(&mut nodes, &mut buckets, "b", 2, 20);
        push(&mut nodes, &mut buckets, "c", 3, 30);
        let keys: Vec<_> = Chain::new(&nodes, buckets.head(0))
            .map(|(_, n)| n.key)
            .collect();
        assert_eq!(keys, ["c", "b", "a"]);
    }

    #[test]
    fn successor_crosses_bucket_boundaries() {
        let mut nodes: Arena<u64, ()> = SlotMap::with_key();
        let mut buckets = BucketArray::with_len(5);
        let k1 = push(&mut nodes, &mut buckets, 1, (), 1);
        let k6 = push(&mut nodes, &mut buckets, 6, (), 6);
        let k4 = push(&mut nodes, &mut buckets, 4, (), 4);

        assert_eq!(buckets.next_occupied(0), Some((1, k6)));
        assert_eq!(successor(&nodes, &buckets, k6, 1), Some((1, k1)));
        assert_eq!(successor(&nodes, &buckets, k1, 1), Some((4, k4)));
        assert_eq!(successor(&nodes, &buckets, k4, 4), None);
        assert_eq!(buckets.next_occupied(5), None);
    }

    #[test]
    fn successor_of_removed_node_is_none() {
        let mut nodes: Arena<u64, ()> = SlotMap::with_key();
        let mut buckets = BucketArray::with_len(5);
        let k1 = push(&mut nodes, &mut buckets, 1, (), 1);
        push(&mut nodes, &mut buckets, 3, (), 3);
        buckets.set_head(1, None);
        nodes.remove(k1);
        assert_eq!(successor(&nodes, &buckets, k1, 1), None);
    }

    #[test]
    fn injected_failure_fires_once() {
        fail_next_alloc();
        assert!(matches!(
            BucketArray::try_with_len(3),
            Err(TryReserveError::AllocError { .. })
        ));
        assert_eq!(BucketArray::try_with_len(3).map(|b| b.len()).ok(), Some(3));
    }

    #[test]
    fn clear_empties_every_head() {
        let mut nodes: Arena<u64, ()> = SlotMap::with_key();
        let mut buckets = BucketArray::with_len(3);
        for h in 0..6 {
            push(&mut nodes, &mut buckets, h, (), h);
        }
        buckets.clear();
        assert_eq!(buckets.next_occupied(0), None);
        assert_eq!(buckets.len(), 3);
    }
}
