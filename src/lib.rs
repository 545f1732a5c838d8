//! chained-hashtable: a separate-chaining hash table engine with
//! prime-progression rehashing and cursors that survive unrelated
//! mutations.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one table engine, parameterized by key-uniqueness mode, that
//!   map, multimap, set and multiset adapters share.
//! - Layers:
//!   - PrimeRehashPolicy: pure sizing logic. Decides bucket counts from
//!     element counts using a fixed table of primes and a max load factor.
//!   - Node storage: elements live in a generational slotmap arena and are
//!     threaded into singly linked chains; the bucket array holds chain
//!     heads only.
//!   - HashTable<K, V, M, S>: the engine. `M` is `Unique` or `Multi` and is
//!     fixed by the type, so "insert rejects duplicates" is a property of
//!     the table type rather than a runtime flag.
//!   - HashMap / HashMultiMap / HashSet / HashMultiSet: thin adapters with
//!     std-like signatures over the engine.
//!
//! Invariants
//! - The bucket array is never empty.
//! - Each node caches its `u64` hash and sits in bucket
//!   `hash % bucket_count()`.
//! - `len()` equals the number of nodes reachable from the buckets.
//! - Automatic growth only ever increases the bucket count. An explicit
//!   `rehash(n)` takes `n` as given (rounded up to a prime) and may shrink
//!   the table past its load factor; the next insert grows it back.
//! - Unique tables never hold two equal keys.
//!
//! Cursors
//! - A `Cursor` is a `Copy` position token that does not borrow the table.
//!   It stays valid across inserts that do not rehash and across erasure of
//!   other elements. Erasing its own element makes it stale: reads through
//!   it return `None`, never another element.
//! - A rehash invalidates every cursor. Debug builds stamp cursors with a
//!   rehash epoch and panic on use after a rehash; release builds carry no
//!   extra state.
//!
//! Failure boundaries
//! - A rehash allocates the new bucket array fallibly before touching the
//!   table and relinks nodes from their cached hashes, so user `Hash` code
//!   never runs mid-rehash and an allocation failure leaves the table as it
//!   was. `try_*` methods report the failure as `TryReserveError`.
//! - User `Hash`/`Eq` run only while probing, when the structure is
//!   consistent.
//!
//! Notes and non-goals
//! - Single-threaded; no internal synchronization.
//! - Keys are immutable once inserted.
//! - No custom allocator parameter.

mod config;
pub mod cursor;
mod epoch;
mod error;
pub mod map;
mod node;
pub mod policy;
pub mod set;
mod table;
mod table_proptest;

// Public surface
pub use config::{TableConfig, DEFAULT_GROWTH_FACTOR, DEFAULT_MAX_LOAD_FACTOR};
pub use cursor::Cursor;
pub use error::{ConfigError, Error, TryReserveError};
pub use map::{HashMap, HashMultiMap};
pub use policy::{PrimeRehashPolicy, PRIMES};
pub use set::{HashMultiSet, HashSet};
pub use table::{HashTable, KeyMode, Multi, Unique};
