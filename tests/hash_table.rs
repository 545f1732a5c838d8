// HashTable integration suite.
//
// Each test documents what behavior is being verified. The core invariants
// exercised through the public API:
// - Placement: every element is reachable from bucket `hash % bucket_count`.
// - Uniqueness: unique tables reject duplicates without side effects.
// - Growth: bucket counts follow the prime progression and never shrink
//   on insert.
// - Cursors: erasing one element leaves cursors to its chain siblings valid.
use chained_hashtable::{HashTable, Multi, TableConfig, Unique, PRIMES};
use std::collections::BTreeMap;
use std::hash::{BuildHasher, Hasher};

// Hashes integers to themselves so bucket placement can be asserted.
#[derive(Clone, Default)]
struct IdentityBuildHasher;
struct IdentityHasher(u64);

impl BuildHasher for IdentityBuildHasher {
    type Hasher = IdentityHasher;
    fn build_hasher(&self) -> IdentityHasher {
        IdentityHasher(0)
    }
}

impl Hasher for IdentityHasher {
    fn write(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = (self.0 << 8) | u64::from(*b);
        }
    }
    fn write_u64(&mut self, n: u64) {
        self.0 = n;
    }
    fn finish(&self) -> u64 {
        self.0
    }
}

type IdTable<V, M = Unique> = HashTable<u64, V, M, IdentityBuildHasher>;

// Test: growth from the minimum bucket count.
// Verifies: three inserts into a one-bucket table all land, are findable,
// and force the bucket count to at least three.
#[test]
fn insert_three_from_single_bucket() {
    let mut t: HashTable<u32, &str> = HashTable::with_bucket_count(1);
    assert_eq!(t.bucket_count(), 1);
    for (k, v) in [(1, "a"), (2, "b"), (3, "c")] {
        let (c, inserted) = t.insert(k, v);
        assert!(inserted);
        assert_eq!(c.value(&t), Some(&v));
    }
    assert_eq!(t.len(), 3);
    assert_eq!(t.get(&2), Some(&"b"));
    assert!(t.bucket_count() >= 3);
    assert!(PRIMES.contains(&(t.bucket_count() as u32)));
}

// Test: duplicate insert in unique mode.
// Verifies: size unchanged, inserted == false, cursor points at the
// existing element whose value is untouched.
#[test]
fn duplicate_insert_is_a_noop() {
    let mut t: HashTable<String, i32> = HashTable::new();
    let (first, _) = t.insert("dup".to_string(), 1);
    let (again, inserted) = t.insert("dup".to_string(), 2);
    assert!(!inserted);
    assert_eq!(first, again);
    assert_eq!(t.len(), 1);
    assert_eq!(t.get("dup"), Some(&1));
}

// Test: multi mode keeps every copy and erase-by-key removes them all.
#[test]
fn multi_erase_removes_every_copy() {
    let mut t: HashTable<u32, &str, Multi> = HashTable::new();
    for v in ["x", "y", "z"] {
        t.insert(5, v);
    }
    assert_eq!(t.len(), 3);
    assert_eq!(t.count(&5), 3);
    assert_eq!(t.erase(&5), 3);
    assert!(t.find(&5).is_end());
    assert_eq!(t.len(), 0);
}

// Test: growth at the second element of a one-bucket table.
// Assumes: default max load factor 1.0 and growth factor 2.0.
// Verifies: the table grows to the next prime (2) before linking the
// second key, and keys whose hashes differ mod 2 end up in different
// buckets.
#[test]
fn single_bucket_grows_at_second_element() {
    let mut t: IdTable<&str> = HashTable::with_bucket_count_and_hasher(1, IdentityBuildHasher);
    t.insert(1, "one");
    assert_eq!(t.bucket_count(), 1);
    assert_eq!(t.bucket_size(0), 1);

    t.insert(2, "two");
    assert_eq!(t.bucket_count(), 2);
    assert_eq!(t.get(&1), Some(&"one"));
    assert_eq!(t.get(&2), Some(&"two"));
    assert_eq!(t.bucket(&1), 1);
    assert_eq!(t.bucket(&2), 0);
    assert_eq!(t.bucket_size(0), 1);
    assert_eq!(t.bucket_size(1), 1);
}

// Test: collisions chain in reverse insertion order.
// Assumes: max load factor 2.0 lets two elements share one bucket.
#[test]
fn colliding_keys_chain_head_first() {
    let config = TableConfig::new().with_bucket_hint(1).with_max_load_factor(2.0);
    let mut t: IdTable<&str> = HashTable::with_config_and_hasher(config, IdentityBuildHasher).unwrap();
    t.insert(1, "one");
    t.insert(2, "two");
    assert_eq!(t.bucket_count(), 1);
    let chain: Vec<u64> = t.bucket_iter(0).map(|(k, _)| *k).collect();
    assert_eq!(chain, vec![2, 1]);
}

// Test: placement invariant through public accessors.
// Verifies: after a mix of inserts, erases and rehashes, every key is
// listed by exactly the bucket its hash selects.
#[test]
fn every_key_lives_in_its_bucket() {
    let mut t: IdTable<u64> = HashTable::with_hasher(IdentityBuildHasher);
    for k in 0..500 {
        t.insert(k * 7, k);
    }
    for k in (0..500).step_by(3) {
        t.erase(&(k * 7));
    }
    t.rehash(2000);
    t.rehash(10);
    for bucket in 0..t.bucket_count() {
        for (k, _) in t.bucket_iter(bucket) {
            assert_eq!((*k % t.bucket_count() as u64) as usize, bucket);
            assert_eq!(t.bucket(k), bucket);
        }
    }
    let total: usize = (0..t.bucket_count()).map(|b| t.bucket_size(b)).sum();
    assert_eq!(total, t.len());
}

// Test: rehash round trip.
// Verifies: the multiset of (key, value) pairs is identical before and
// after a rehash to a larger bucket count.
#[test]
fn rehash_preserves_multiset() {
    let mut t: HashTable<u32, u32, Multi> = HashTable::new();
    for i in 0..300 {
        t.insert(i % 40, i);
    }
    let collect = |t: &HashTable<u32, u32, Multi>| {
        let mut m: BTreeMap<(u32, u32), usize> = BTreeMap::new();
        for (k, v) in t {
            *m.entry((*k, *v)).or_default() += 1;
        }
        m
    };
    let before = collect(&t);
    let buckets = t.bucket_count();
    t.rehash(buckets * 4);
    assert!(t.bucket_count() >= buckets * 4);
    assert_eq!(before, collect(&t));
}

// Test: growth is monotonic under inserts.
#[test]
fn bucket_count_never_drops_on_insert() {
    let mut t: HashTable<u32, ()> = HashTable::new();
    let mut last = t.bucket_count();
    for i in 0..5_000 {
        t.insert(i, ());
        assert!(t.bucket_count() >= last);
        assert!(t.load_factor() <= t.max_load_factor());
        last = t.bucket_count();
    }
}

// Test: erase-by-cursor in a shared chain.
// Assumes: three keys that all select bucket 0 of a 7-bucket table.
// Verifies: erasing the middle element returns its successor and leaves
// the cursors to both siblings readable; the erased cursor goes stale.
#[test]
fn sibling_cursors_survive_erase() {
    let mut t: IdTable<&str, Multi> = HashTable::with_bucket_count_and_hasher(7, IdentityBuildHasher);
    assert_eq!(t.bucket_count(), 7);
    t.insert(0, "zero");
    t.insert(7, "seven");
    t.insert(14, "fourteen");

    let head = t.begin();
    let middle = t.advance(head);
    let tail = t.advance(middle);
    assert_eq!(head.key(&t), Some(&14));
    assert_eq!(middle.key(&t), Some(&7));
    assert_eq!(tail.key(&t), Some(&0));

    let next = t.erase_at(middle);
    assert_eq!(next, tail);
    assert_eq!(middle.key(&t), None);
    assert_eq!(head.value(&t), Some(&"fourteen"));
    assert_eq!(tail.value(&t), Some(&"zero"));
    assert_eq!(t.bucket_size(0), 2);
}

// Test: a cursor taken before a rehash is rejected in debug builds.
#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "cursor used after a rehash")]
fn cursor_after_rehash_panics_in_debug() {
    let mut t: HashTable<u32, u32> = HashTable::new();
    let (c, _) = t.insert(1, 1);
    t.rehash(100);
    let _ = c.value(&t);
}

// Test: full traversal with cursors.
// Verifies: begin/advance visits exactly len() elements and ends at end().
#[test]
fn cursor_walk_visits_everything() {
    let t: HashTable<u32, u32> = (0..64).map(|i| (i, i * 2)).collect();
    let mut c = t.begin();
    let mut seen = 0;
    while c != t.end() {
        let (k, v) = c.entry(&t).unwrap();
        assert_eq!(*v, k * 2);
        seen += 1;
        c = t.advance(c);
    }
    assert_eq!(seen, t.len());
}
