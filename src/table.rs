//! HashTable: the separate-chaining engine behind every adapter.

use crate::config::{validate_load_factor, TableConfig};
use crate::cursor::{BucketIter, Cursor, GetAll, IntoIter, Iter, IterMut};
use crate::epoch::DebugEpoch;
use crate::error::{infallible, Error, TryReserveError};
use crate::node::{successor, Arena, BucketArray, Chain, Node, NodeKey};
use crate::policy::PrimeRehashPolicy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use hashbrown::hash_map::DefaultHashBuilder;
use slotmap::SlotMap;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Unique {}
    impl Sealed for super::Multi {}
}

/// Key-uniqueness mode of a table, fixed by its type.
pub trait KeyMode: sealed::Sealed {
    const UNIQUE: bool;
}

/// Inserting an existing key is rejected and leaves the table unchanged.
#[derive(Copy, Clone, Debug)]
pub enum Unique {}

/// Every insert links a new node, equal keys included.
#[derive(Copy, Clone, Debug)]
pub enum Multi {}

impl KeyMode for Unique {
    const UNIQUE: bool = true;
}

impl KeyMode for Multi {
    const UNIQUE: bool = false;
}

/// Separate-chaining hash table.
///
/// Elements are nodes in a generational arena, threaded into singly linked
/// chains whose heads live in a bucket array. A node with hash `h` always
/// sits in bucket `h % bucket_count()`. Inserts push at the chain head, so
/// iteration order is bucket order, then reverse insertion order within a
/// chain; a rehash reshuffles it.
///
/// See [`Cursor`] for the cursor invalidation contract.
#[derive(Clone)]
pub struct HashTable<K, V, M = Unique, S = DefaultHashBuilder> {
    hasher: S,
    buckets: BucketArray,
    nodes: Arena<K, V>,
    policy: PrimeRehashPolicy,
    epoch: DebugEpoch,
    _mode: PhantomData<M>,
}

impl<K, V, M: KeyMode> HashTable<K, V, M> {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_bucket_count(bucket_hint: usize) -> Self {
        Self::with_bucket_count_and_hasher(bucket_hint, Default::default())
    }

    pub fn with_config(config: TableConfig) -> Result<Self, Error> {
        Self::with_config_and_hasher(config, Default::default())
    }
}

impl<K, V, M: KeyMode> Default for HashTable<K, V, M> {
    fn default() -> Self {
        Self::new()
    }
}

// Structural operations that never hash or compare keys.
impl<K, V, M: KeyMode, S> HashTable<K, V, M, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_bucket_count_and_hasher(0, hasher)
    }

    pub fn with_bucket_count_and_hasher(bucket_hint: usize, hasher: S) -> Self {
        let policy = PrimeRehashPolicy::default();
        Self::from_parts(
            BucketArray::with_len(policy.bucket_count_for_hint(bucket_hint)),
            policy,
            hasher,
        )
    }

    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Result<Self, Error> {
        config.validate()?;
        let policy = config.policy();
        let buckets = BucketArray::try_with_len(policy.bucket_count_for_hint(config.bucket_hint))?;
        Ok(Self::from_parts(buckets, policy, hasher))
    }

    fn from_parts(buckets: BucketArray, policy: PrimeRehashPolicy, hasher: S) -> Self {
        Self {
            hasher,
            buckets,
            nodes: SlotMap::with_key(),
            policy,
            epoch: DebugEpoch::new(),
            _mode: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn policy(&self) -> &PrimeRehashPolicy {
        &self.policy
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of elements chained in bucket `bucket`.
    ///
    /// # Panics
    /// If `bucket >= bucket_count()`.
    pub fn bucket_size(&self, bucket: usize) -> usize {
        self.chain(bucket).count()
    }

    /// Elements of bucket `bucket` in chain order.
    ///
    /// # Panics
    /// If `bucket >= bucket_count()`.
    pub fn bucket_iter(&self, bucket: usize) -> BucketIter<'_, K, V> {
        BucketIter::new(&self.nodes, self.buckets.head(bucket))
    }

    pub fn load_factor(&self) -> f32 {
        self.len() as f32 / self.bucket_count() as f32
    }

    pub fn max_load_factor(&self) -> f32 {
        self.policy.max_load_factor()
    }

    /// Drops every element. The bucket count is kept.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.buckets.clear();
    }

    /// Cursor to the first element, or `end()` when empty.
    pub fn begin(&self) -> Cursor {
        match self.buckets.next_occupied(0) {
            Some((bucket, key)) => self.cursor(Some(key), bucket),
            None => self.end(),
        }
    }

    pub fn end(&self) -> Cursor {
        self.cursor(None, self.bucket_count())
    }

    /// Cursor to the element after `cursor`: the next node in its chain, or
    /// the head of the next non-empty bucket. Advancing the last element, a
    /// stale cursor, or `end()` yields `end()`.
    pub fn advance(&self, cursor: Cursor) -> Cursor {
        self.epoch.check(cursor.stamp);
        let Some(key) = cursor.node else {
            return self.end();
        };
        match successor(&self.nodes, &self.buckets, key, cursor.bucket) {
            Some((bucket, next)) => self.cursor(Some(next), bucket),
            None => self.end(),
        }
    }

    /// Removes the element at `cursor` and returns a cursor to the element
    /// that followed it. Cursors to every other element stay valid.
    ///
    /// `cursor` must point at a live element; debug builds panic otherwise,
    /// release builds return `end()`.
    pub fn erase_at(&mut self, cursor: Cursor) -> Cursor {
        let next = self.advance(cursor);
        let removed = self.remove_at(cursor);
        debug_assert!(removed.is_some(), "erase through an end or stale cursor");
        if removed.is_some() {
            next
        } else {
            self.end()
        }
    }

    /// Erases from `first` up to but excluding `last`, in cursor order, and
    /// returns the cursor that stopped the walk: `last`, or `end()` if
    /// `last` was never reached.
    pub fn erase_range(&mut self, first: Cursor, last: Cursor) -> Cursor {
        let mut cur = first;
        while cur != last && !cur.is_end() {
            cur = self.erase_at(cur);
        }
        cur
    }

    /// Removes the element at `cursor`, returning it. `None` for `end()` and
    /// stale cursors.
    pub fn remove_at(&mut self, cursor: Cursor) -> Option<(K, V)> {
        self.epoch.check(cursor.stamp);
        let key = cursor.node?;
        let bucket = self.buckets.index_for(self.nodes.get(key)?.hash);
        self.unlink(bucket, key).map(|n| (n.key, n.value))
    }

    /// Rebuilds the bucket array with `bucket_hint` rounded up to the prime
    /// progression, relinking every node into its new bucket.
    ///
    /// The new array is allocated before anything is touched; relinking
    /// itself cannot fail. On error the table is unchanged. On success every
    /// outstanding cursor is invalidated.
    pub fn try_rehash(&mut self, bucket_hint: usize) -> Result<(), TryReserveError> {
        let bucket_count = self.policy.bucket_count_for_hint(bucket_hint);
        let mut fresh = BucketArray::try_with_len(bucket_count).map_err(|e| {
            log::debug!("bucket array allocation of {bucket_count} buckets failed: {e:?}");
            e
        })?;
        for bucket in 0..self.buckets.len() {
            let mut cur = self.buckets.replace_head(bucket, None);
            while let Some(key) = cur {
                let node = &mut self.nodes[key];
                cur = node.next;
                node.next = fresh.replace_head(fresh.index_for(node.hash), Some(key));
            }
        }
        log::trace!(
            "rehash {} -> {} buckets ({} elements)",
            self.buckets.len(),
            bucket_count,
            self.nodes.len()
        );
        self.buckets = fresh;
        self.epoch.advance();
        Ok(())
    }

    pub fn rehash(&mut self, bucket_hint: usize) {
        infallible(self.try_rehash(bucket_hint))
    }

    /// Grows the bucket array so that `additional` more elements fit under
    /// the maximum load factor. Never shrinks.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        match self
            .policy
            .needs_rehash(self.bucket_count(), self.len(), additional)
        {
            Some(bucket_count) => self.try_rehash(bucket_count),
            None => Ok(()),
        }
    }

    pub fn reserve(&mut self, additional: usize) {
        infallible(self.try_reserve(additional))
    }

    /// Replaces the maximum load factor, growing the table if the current
    /// element count no longer fits under it. Lowering the factor never
    /// shrinks the table.
    pub fn set_max_load_factor(&mut self, max_load_factor: f32) -> Result<(), Error> {
        validate_load_factor(max_load_factor)?;
        let policy = PrimeRehashPolicy::new(max_load_factor)
            .with_growth_factor(self.policy.growth_factor());
        let wanted = policy.next_bucket_count(self.len(), self.len());
        if self.len() > 0 && wanted > self.bucket_count() {
            self.try_rehash(wanted)?;
        }
        self.policy = policy;
        Ok(())
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.nodes, &self.buckets)
    }

    /// Mutable iteration in arena order, which is not bucket order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&mut self.nodes)
    }

    pub(crate) fn cursor_node(&self, cursor: Cursor) -> Option<&Node<K, V>> {
        self.epoch.check(cursor.stamp);
        self.nodes.get(cursor.node?)
    }

    pub(crate) fn cursor_node_mut(&mut self, cursor: Cursor) -> Option<&mut Node<K, V>> {
        self.epoch.check(cursor.stamp);
        self.nodes.get_mut(cursor.node?)
    }

    /// Every node sits in bucket `hash % bucket_count` and the chain lengths
    /// add up to `len`.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let mut total = 0;
        for b in 0..self.bucket_count() {
            for (_, n) in self.chain(b) {
                assert_eq!(self.buckets.index_for(n.hash), b, "node in wrong bucket");
                total += 1;
            }
        }
        assert_eq!(total, self.len(), "chains and arena disagree");
    }

    #[inline]
    fn cursor(&self, node: Option<NodeKey>, bucket: usize) -> Cursor {
        Cursor::new(node, bucket, self.epoch.stamp())
    }

    #[inline]
    fn chain(&self, bucket: usize) -> Chain<'_, K, V> {
        Chain::new(&self.nodes, self.buckets.head(bucket))
    }

    /// Links a new node at the head of its bucket. Growth must already
    /// have happened.
    fn link(&mut self, key: K, value: V, hash: u64) -> Cursor {
        let bucket = self.buckets.index_for(hash);
        let next = self.buckets.head(bucket);
        let k = self.nodes.insert(Node {
            key,
            value,
            hash,
            next,
        });
        self.buckets.set_head(bucket, Some(k));
        self.cursor(Some(k), bucket)
    }

    /// Unlinks `target` from the chain of `bucket` and frees it. Chains are
    /// singly linked, so the predecessor is found by scanning.
    fn unlink(&mut self, bucket: usize, target: NodeKey) -> Option<Node<K, V>> {
        let mut prev: Option<NodeKey> = None;
        let mut cur = self.buckets.head(bucket);
        while let Some(k) = cur {
            let next = self.nodes[k].next;
            if k == target {
                match prev {
                    None => self.buckets.set_head(bucket, next),
                    Some(p) => self.nodes[p].next = next,
                }
                return self.nodes.remove(k);
            }
            prev = Some(k);
            cur = next;
        }
        None
    }
}

// Keyed operations.
impl<K, V, M, S> HashTable<K, V, M, S>
where
    K: Eq + Hash,
    M: KeyMode,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    fn find_node<Q>(&self, hash: u64, q: &Q) -> Option<(usize, NodeKey)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let bucket = self.buckets.index_for(hash);
        self.chain(bucket)
            .find(|(_, n)| n.hash == hash && n.key.borrow() == q)
            .map(|(k, _)| (bucket, k))
    }

    /// Cursor to an element whose key equals `q`, or `end()`.
    pub fn find<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.find_node(self.make_hash(q), q) {
            Some((bucket, key)) => self.cursor(Some(key), bucket),
            None => self.end(),
        }
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_node(self.make_hash(q), q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(q).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (_, key) = self.find_node(self.make_hash(q), q)?;
        let node = &self.nodes[key];
        Some((&node.key, &node.value))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (_, key) = self.find_node(self.make_hash(q), q)?;
        self.nodes.get_mut(key).map(|n| &mut n.value)
    }

    /// All elements whose key equals `q`, in chain order.
    pub fn get_all<'a, Q>(&'a self, q: &'a Q) -> GetAll<'a, K, V, Q>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        GetAll::new(self.chain(self.buckets.index_for(hash)), hash, q)
    }

    pub fn count<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_all(q).count()
    }

    /// Bucket index a key equal to `q` lives in, whether or not it is present.
    pub fn bucket<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
    {
        self.buckets.index_for(self.make_hash(q))
    }

    /// Removes every element whose key equals `q` and returns how many were
    /// removed. Removing nothing is not an error.
    pub fn erase<Q>(&mut self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let bucket = self.buckets.index_for(hash);
        let mut removed = 0;
        let mut prev: Option<NodeKey> = None;
        let mut cur = self.buckets.head(bucket);
        while let Some(k) = cur {
            let node = &self.nodes[k];
            let next = node.next;
            if node.hash == hash && node.key.borrow() == q {
                match prev {
                    None => self.buckets.set_head(bucket, next),
                    Some(p) => self.nodes[p].next = next,
                }
                self.nodes.remove(k);
                removed += 1;
            } else {
                prev = Some(k);
            }
            cur = next;
        }
        removed
    }

    /// Removes the first element whose key equals `q`, returning it.
    pub fn take<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (bucket, key) = self.find_node(self.make_hash(q), q)?;
        self.unlink(bucket, key).map(|n| (n.key, n.value))
    }

    /// Shared insert path. In unique mode an equal key short-circuits before
    /// `make_value` runs. Growth happens before linking, so the new node is
    /// placed directly in its final bucket.
    fn try_insert_inner<F>(&mut self, key: K, make_value: F) -> Result<(Cursor, bool), TryReserveError>
    where
        F: FnOnce() -> V,
    {
        let hash = self.make_hash(&key);
        if M::UNIQUE {
            if let Some((bucket, existing)) = self.find_node(hash, &key) {
                return Ok((self.cursor(Some(existing), bucket), false));
            }
        }
        self.try_reserve(1)?;
        Ok((self.link(key, make_value(), hash), true))
    }
}

impl<K, V, S> HashTable<K, V, Unique, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Inserts `key -> value` unless an equal key is present. Returns the
    /// cursor to the element with that key and whether it was inserted; a
    /// rejected `value` is dropped and the table is unchanged.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<(Cursor, bool), TryReserveError> {
        self.try_insert_inner(key, || value)
    }

    pub fn insert(&mut self, key: K, value: V) -> (Cursor, bool) {
        infallible(self.try_insert(key, value))
    }

    /// Like [`try_insert`](Self::try_insert), but only builds the value when
    /// the key is absent.
    pub fn try_insert_with<F>(&mut self, key: K, default: F) -> Result<(Cursor, bool), TryReserveError>
    where
        F: FnOnce() -> V,
    {
        self.try_insert_inner(key, default)
    }

    pub fn insert_with<F>(&mut self, key: K, default: F) -> (Cursor, bool)
    where
        F: FnOnce() -> V,
    {
        infallible(self.try_insert_with(key, default))
    }

    /// Inserts `key -> value`, or overwrites the value of an equal key and
    /// returns the previous one.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> (Cursor, Option<V>) {
        let hash = self.make_hash(&key);
        if let Some((bucket, existing)) = self.find_node(hash, &key) {
            let old = core::mem::replace(&mut self.nodes[existing].value, value);
            return (self.cursor(Some(existing), bucket), Some(old));
        }
        infallible(self.try_reserve(1));
        (self.link(key, value, hash), None)
    }
}

impl<K, V, S> HashTable<K, V, Multi, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Links a new element, even when equal keys are already present.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Cursor, TryReserveError> {
        self.try_insert_inner(key, || value).map(|(c, _)| c)
    }

    pub fn insert(&mut self, key: K, value: V) -> Cursor {
        infallible(self.try_insert(key, value))
    }
}

impl<K, V, M, S> Extend<(K, V)> for HashTable<K, V, M, S>
where
    K: Eq + Hash,
    M: KeyMode,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (k, v) in iter {
            infallible(self.try_insert_inner(k, || v));
        }
    }
}

impl<K, V, M, S> FromIterator<(K, V)> for HashTable<K, V, M, S>
where
    K: Eq + Hash,
    M: KeyMode,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::with_hasher(S::default());
        table.extend(iter);
        table
    }
}

impl<K, V, M: KeyMode, S> IntoIterator for HashTable<K, V, M, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.nodes)
    }
}

impl<'a, K, V, M: KeyMode, S> IntoIterator for &'a HashTable<K, V, M, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, M: KeyMode, S> fmt::Debug for HashTable<K, V, M, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
