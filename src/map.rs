//! Key/value adapters over [`HashTable`]: a unique-key map and a multimap.

use crate::config::TableConfig;
use crate::cursor::{GetAll, IntoIter, Iter, IterMut};
use crate::error::{Error, TryReserveError};
use crate::table::{HashTable, Multi, Unique};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::ops::Index;
use hashbrown::hash_map::DefaultHashBuilder;

/// Map with unique keys. Inserting an existing key leaves the stored value
/// in place; use [`insert_or_assign`](HashMap::insert_or_assign) to
/// overwrite.
#[derive(Clone)]
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    table: HashTable<K, V, Unique, S>,
}

impl<K, V> HashMap<K, V> {
    pub fn new() -> Self {
        Self {
            table: HashTable::new(),
        }
    }

    pub fn with_bucket_count(bucket_hint: usize) -> Self {
        Self {
            table: HashTable::with_bucket_count(bucket_hint),
        }
    }

    pub fn with_config(config: TableConfig) -> Result<Self, Error> {
        Ok(Self {
            table: HashTable::with_config(config)?,
        })
    }
}

impl<K, V> Default for HashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> HashMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            table: HashTable::with_hasher(hasher),
        }
    }

    pub fn with_bucket_count_and_hasher(bucket_hint: usize, hasher: S) -> Self {
        Self {
            table: HashTable::with_bucket_count_and_hasher(bucket_hint, hasher),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn clear(&mut self) {
        self.table.clear()
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        self.table.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.table.iter_mut()
    }

    pub fn keys(&self) -> impl ExactSizeIterator<Item = &K> + '_ {
        self.table.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> + '_ {
        self.table.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl ExactSizeIterator<Item = &mut V> + '_ {
        self.table.iter_mut().map(|(_, v)| v)
    }

    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    pub fn bucket_size(&self, bucket: usize) -> usize {
        self.table.bucket_size(bucket)
    }

    pub fn load_factor(&self) -> f32 {
        self.table.load_factor()
    }

    pub fn max_load_factor(&self) -> f32 {
        self.table.max_load_factor()
    }

    pub fn set_max_load_factor(&mut self, max_load_factor: f32) -> Result<(), Error> {
        self.table.set_max_load_factor(max_load_factor)
    }

    pub fn rehash(&mut self, bucket_hint: usize) {
        self.table.rehash(bucket_hint)
    }

    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional)
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.table.try_reserve(additional)
    }

    /// The underlying table, for cursor and bucket level access.
    pub fn as_table(&self) -> &HashTable<K, V, Unique, S> {
        &self.table
    }

    pub fn as_table_mut(&mut self) -> &mut HashTable<K, V, Unique, S> {
        &mut self.table
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Inserts `key -> value` if `key` is absent. Returns whether it was
    /// inserted.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.table.insert(key, value).1
    }

    pub fn try_insert(&mut self, key: K, value: V) -> Result<bool, TryReserveError> {
        self.table.try_insert(key, value).map(|(_, inserted)| inserted)
    }

    /// Inserts `key -> value`, returning the value it replaced.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> Option<V> {
        self.table.insert_or_assign(key, value).1
    }

    pub fn get<Q>(&self, k: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get(k)
    }

    pub fn get_mut<Q>(&mut self, k: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get_mut(k)
    }

    pub fn get_key_value<Q>(&self, k: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get_key_value(k)
    }

    pub fn contains_key<Q>(&self, k: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.contains_key(k)
    }

    pub fn remove<Q>(&mut self, k: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.take(k).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, k: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.take(k)
    }
}

impl<K, Q, V, S> Index<&Q> for HashMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Eq + Hash,
    S: BuildHasher,
{
    type Output = V;

    /// # Panics
    /// If the key is not present.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not present in HashMap")
    }
}

impl<K, V, S> PartialEq for HashMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Eq for HashMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for HashMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.table, f)
    }
}

impl<K, V, S> Extend<(K, V)> for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.table.extend(iter)
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            table: HashTable::from_iter(iter),
        }
    }
}

impl<K, V, S> IntoIterator for HashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.table.into_iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.table.iter()
    }
}

/// Map that keeps every inserted pair, equal keys included.
#[derive(Clone)]
pub struct HashMultiMap<K, V, S = DefaultHashBuilder> {
    table: HashTable<K, V, Multi, S>,
}

impl<K, V> HashMultiMap<K, V> {
    pub fn new() -> Self {
        Self {
            table: HashTable::new(),
        }
    }

    pub fn with_bucket_count(bucket_hint: usize) -> Self {
        Self {
            table: HashTable::with_bucket_count(bucket_hint),
        }
    }

    pub fn with_config(config: TableConfig) -> Result<Self, Error> {
        Ok(Self {
            table: HashTable::with_config(config)?,
        })
    }
}

impl<K, V> Default for HashMultiMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> HashMultiMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            table: HashTable::with_hasher(hasher),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn clear(&mut self) {
        self.table.clear()
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        self.table.iter()
    }

    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional)
    }

    pub fn as_table(&self) -> &HashTable<K, V, Multi, S> {
        &self.table
    }

    pub fn as_table_mut(&mut self) -> &mut HashTable<K, V, Multi, S> {
        &mut self.table
    }
}

impl<K, V, S> HashMultiMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn insert(&mut self, key: K, value: V) {
        self.table.insert(key, value);
    }

    pub fn try_insert(&mut self, key: K, value: V) -> Result<(), TryReserveError> {
        self.table.try_insert(key, value).map(|_| ())
    }

    /// Every pair whose key equals `k`.
    pub fn get_all<'a, Q>(&'a self, k: &'a Q) -> GetAll<'a, K, V, Q>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get_all(k)
    }

    pub fn count<Q>(&self, k: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.count(k)
    }

    pub fn contains_key<Q>(&self, k: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.contains_key(k)
    }

    /// Removes every pair whose key equals `k`, returning how many there were.
    pub fn remove_all<Q>(&mut self, k: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.erase(k)
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for HashMultiMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.table, f)
    }
}

impl<K, V, S> Extend<(K, V)> for HashMultiMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.table.extend(iter)
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashMultiMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            table: HashTable::from_iter(iter),
        }
    }
}

impl<K, V, S> IntoIterator for HashMultiMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.table.into_iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashMultiMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.table.iter()
    }
}
