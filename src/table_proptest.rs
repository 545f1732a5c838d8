#![cfg(test)]

// Property tests for HashTable kept inside the crate so they can check the
// bucket placement invariant directly.

use crate::table::{HashTable, Multi, Unique};
use proptest::prelude::*;
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};
use std::rc::Rc;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    InsertWith(usize, i32),
    Erase(usize),
    EraseAt(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Rehash(usize),
    Reserve(usize),
    Clear,
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::InsertWith(i, v)),
            2 => idx.clone().prop_map(OpI::Erase),
            2 => idx.clone().prop_map(OpI::EraseAt),
            2 => idx.clone().prop_map(OpI::Find),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            2 => (any::<bool>(), 0usize..64).prop_map(|(explicit, n)| if explicit {
                OpI::Rehash(n)
            } else {
                OpI::Reserve(n / 2)
            }),
            1 => Just(OpI::Clear),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run_unique<S: BuildHasher>(
    mut sut: HashTable<Key, i32, Unique, S>,
    pool: Vec<String>,
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, i32> = HashMap::new();
    let default_calls = Rc::new(Cell::new(0));
    let mut max_buckets = sut.bucket_count();

    for op in ops {
        let mut explicit_rehash = false;
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(&pool, i);
                let already = model.contains_key(&k);
                let (c, inserted) = sut.insert(k.clone(), v);
                prop_assert_eq!(inserted, !already, "insert must fail only on duplicate");
                prop_assert_eq!(c.key(&sut), Some(&k));
                if inserted {
                    model.insert(k, v);
                } else {
                    prop_assert_eq!(c.value(&sut), model.get(&k), "duplicate keeps old value");
                }
            }
            OpI::InsertWith(i, v) => {
                let k = key_from(&pool, i);
                let already = model.contains_key(&k);
                let counter = default_calls.clone();
                let before = counter.get();
                let (_, inserted) = sut.insert_with(k.clone(), move || {
                    counter.set(counter.get() + 1);
                    v
                });
                prop_assert_eq!(inserted, !already);
                if inserted {
                    prop_assert_eq!(default_calls.get(), before + 1, "default must run exactly once on success");
                    model.insert(k, v);
                } else {
                    prop_assert_eq!(default_calls.get(), before, "default must not run on duplicate");
                }
            }
            OpI::Erase(i) => {
                let k = key_from(&pool, i);
                let expected = usize::from(model.remove(&k).is_some());
                prop_assert_eq!(sut.erase(&k), expected);
                prop_assert!(sut.find(&k).is_end(), "erase then find must miss");
            }
            OpI::EraseAt(i) => {
                let k = key_from(&pool, i);
                let c = sut.find(&k);
                if c.is_end() {
                    prop_assert!(!model.contains_key(&k));
                } else {
                    // The returned cursor is the erased element's successor.
                    let next = sut.advance(c);
                    let got = sut.erase_at(c);
                    prop_assert_eq!(got, next);
                    model.remove(&k);
                    prop_assert!(c.key(&sut).is_none(), "erased cursor must go stale");
                }
            }
            OpI::Find(i) => {
                let k = key_from(&pool, i);
                let c = sut.find(&k);
                prop_assert_eq!(c.value(&sut), model.get(&k));
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(&pool, i);
                if let Some(v) = sut.get_mut(&k) {
                    *v = v.saturating_add(d);
                    let mv = model.get_mut(&k).expect("present in model");
                    *mv = mv.saturating_add(d);
                } else {
                    prop_assert!(!model.contains_key(&k));
                }
            }
            OpI::Rehash(n) => {
                let before: BTreeMap<_, _> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                sut.rehash(n);
                explicit_rehash = true;
                let after: BTreeMap<_, _> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(before, after, "rehash preserves contents");
            }
            OpI::Reserve(n) => {
                let buckets = sut.bucket_count();
                sut.reserve(n);
                prop_assert!(sut.bucket_count() >= buckets);
                prop_assert!((sut.len() + n) as f64 <= sut.bucket_count() as f64 * sut.max_load_factor() as f64);
            }
            OpI::Clear => {
                let buckets = sut.bucket_count();
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.bucket_count(), buckets);
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.iter().map(|(k, _)| k.clone()).collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
            }
        }

        // Post-conditions after each op
        sut.assert_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert_eq!(sut.iter().count(), model.len());
        // Automatic growth never shrinks the table.
        if !explicit_rehash {
            prop_assert!(sut.bucket_count() >= max_buckets);
        }
        max_buckets = sut.bucket_count();
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - Duplicate keys are rejected without mutation; `insert_with` is lazy.
// - Erase-then-find misses; erasing by cursor returns the successor.
// - Rehash preserves every (key, value) pair.
// - Every node sits in bucket `hash % bucket_count` after each op.
// - Bucket count never decreases except through an explicit rehash.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_unique_state_machine((pool, ops) in arb_scenario()) {
        run_unique(HashTable::new(), pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: Same state-machine invariants as above, under worst-case
// collision behavior (constant hasher). Every element shares one chain.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_unique_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_unique(HashTable::with_hasher(ConstBuildHasher), pool, ops)?;
    }
}

fn model_count(model: &BTreeMap<Key, Vec<i32>>, k: &Key) -> usize {
    model.get(k).map_or(0, Vec::len)
}

// Property: Multi-key tables always insert, count equal keys, and erase all
// of them at once. Compared against a map of sorted value lists.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_multi_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: HashTable<Key, i32, Multi> = HashTable::new();
        let mut model: BTreeMap<Key, Vec<i32>> = BTreeMap::new();

        for op in ops {
            match op {
                OpI::Insert(i, v) | OpI::InsertWith(i, v) => {
                    let k = key_from(&pool, i);
                    let c = sut.insert(k.clone(), v);
                    prop_assert_eq!(c.value(&sut), Some(&v));
                    model.entry(k).or_default().push(v);
                }
                OpI::Erase(i) => {
                    let k = key_from(&pool, i);
                    let expected = model.remove(&k).map_or(0, |vs| vs.len());
                    prop_assert_eq!(sut.erase(&k), expected);
                    prop_assert_eq!(sut.count(&k), 0);
                }
                OpI::EraseAt(i) => {
                    let k = key_from(&pool, i);
                    let c = sut.find(&k);
                    if let Some((_, v)) = sut.remove_at(c) {
                        let vs = model.get_mut(&k).expect("present in model");
                        let pos = vs.iter().position(|x| *x == v).expect("value in model");
                        vs.remove(pos);
                        if vs.is_empty() {
                            model.remove(&k);
                        }
                    } else {
                        prop_assert_eq!(model_count(&model, &k), 0);
                    }
                }
                OpI::Find(i) => {
                    let k = key_from(&pool, i);
                    prop_assert_eq!(sut.count(&k), model_count(&model, &k));
                    let mut got: Vec<i32> = sut.get_all(&k).map(|(_, v)| *v).collect();
                    got.sort();
                    let mut want = model.get(&k).cloned().unwrap_or_default();
                    want.sort();
                    prop_assert_eq!(got, want);
                }
                OpI::Contains(s) => {
                    let has_model = model.keys().any(|k| k.0 == s);
                    prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
                }
                OpI::Mutate(_, _) | OpI::Iterate => {
                    let mut got: Vec<(Key, i32)> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                    got.sort();
                    let mut want: Vec<(Key, i32)> = model
                        .iter()
                        .flat_map(|(k, vs)| vs.iter().map(move |v| (k.clone(), *v)))
                        .collect();
                    want.sort();
                    prop_assert_eq!(got, want);
                }
                OpI::Rehash(n) => sut.rehash(n),
                OpI::Reserve(n) => sut.reserve(n),
                OpI::Clear => {
                    sut.clear();
                    model.clear();
                }
            }

            sut.assert_invariants();
            let total: usize = model.values().map(Vec::len).sum();
            prop_assert_eq!(sut.len(), total);
        }
    }
}
