use chained_hashtable::{HashMap, HashMultiSet};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap as StdHashMap};

// Model operations on HashMap and compare against std's map.
proptest! {
    #[test]
    fn prop_map_matches_std(ops in proptest::collection::vec((0u8..=5u8, 0u16..64u16, any::<i32>()), 1..200)) {
        let mut m: HashMap<u16, i32> = HashMap::new();
        let mut model: StdHashMap<u16, i32> = StdHashMap::new();

        for (op, k, v) in ops {
            match op {
                // insert keeps the existing value
                0 => {
                    let inserted = m.insert(k, v);
                    prop_assert_eq!(inserted, !model.contains_key(&k));
                    model.entry(k).or_insert(v);
                }
                1 => {
                    prop_assert_eq!(m.insert_or_assign(k, v), model.insert(k, v));
                }
                2 => {
                    prop_assert_eq!(m.remove(&k), model.remove(&k));
                }
                3 => {
                    prop_assert_eq!(m.get(&k), model.get(&k));
                }
                4 => {
                    if let Some(x) = m.get_mut(&k) {
                        *x = x.wrapping_add(v);
                    }
                    if let Some(x) = model.get_mut(&k) {
                        *x = x.wrapping_add(v);
                    }
                }
                // explicit rehash, possibly below the element count
                _ => m.rehash(k as usize),
            }
            prop_assert_eq!(m.len(), model.len());
        }

        let got: BTreeMap<u16, i32> = m.iter().map(|(k, v)| (*k, *v)).collect();
        let want: BTreeMap<u16, i32> = model.into_iter().collect();
        prop_assert_eq!(got, want);
    }
}

// Multiset counts match a counting model across inserts and removals.
proptest! {
    #[test]
    fn prop_multiset_counts(ops in proptest::collection::vec((0u8..=2u8, 0u8..16u8), 1..200)) {
        let mut s: HashMultiSet<u8> = HashMultiSet::new();
        let mut model: BTreeMap<u8, usize> = BTreeMap::new();

        for (op, k) in ops {
            match op {
                0 => {
                    s.insert(k);
                    *model.entry(k).or_default() += 1;
                }
                1 => {
                    let removed = s.remove_one(&k);
                    let entry = model.entry(k).or_default();
                    prop_assert_eq!(removed, *entry > 0);
                    *entry = entry.saturating_sub(1);
                }
                _ => {
                    prop_assert_eq!(s.remove_all(&k), model.remove(&k).unwrap_or(0));
                }
            }
            prop_assert_eq!(s.count(&k), model.get(&k).copied().unwrap_or(0));
        }
        prop_assert_eq!(s.len(), model.values().sum::<usize>());
    }
}
