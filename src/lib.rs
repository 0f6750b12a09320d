//! structural-hashmap: a single-threaded map whose keys are matched by
//! structure, so records, lists and scalars can all serve as keys.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a map where `{idx: 0, flag: true}` and `{flag: true, idx: 0}`
//!   are the same key, while `[0, 1]` and `[1, 0]` are not.
//! - Layers:
//!   - Canonicalizer (`Fingerprinter<K>`): turns a key into an
//!     order-independent `Fingerprint`. Record fields are sorted by name;
//!     list order is kept.
//!   - Equivalence (`Equivalence<K>`): deep structural equality; the only
//!     authority on whether two keys are the same key.
//!   - BucketStore: fingerprint -> bucket of `(K, V)` entries, backed by a
//!     `HashTable` index over a `SlotMap` of buckets.
//!   - StructuralHashMap<K, V, C, E, S>: public API. Every operation
//!     fingerprints, finds the bucket, then scans it with the equivalence
//!     policy.
//!
//! Constraints
//! - Fingerprints may collide across non-equivalent keys (the string
//!   `"{flag:1,idx:0}"` and the record `{idx: 0, flag: true}` share one by
//!   default); such keys live side by side in one bucket.
//! - Equivalent keys must fingerprint identically. Custom policies have to
//!   keep that contract or lookups silently miss.
//! - No empty bucket is ever stored; `size()` is the sum of bucket lengths.
//! - Single-threaded: no locking. The map is plain owned data.
//!
//! Iteration
//! - Bucket-major: bucket order is the slot order of the bucket arena, not
//!   insertion order; entries within a bucket keep insertion order. An
//!   overwrite keeps its position, a removal shifts later entries down.
//! - Borrowing iterators freeze the map. `Cursor` snapshots the bucket list
//!   and reads bucket contents live, so the map can change between steps.
//!
//! Errors
//! - Absence is `Ok(None)` / `Ok(false)`. The only errors are keys a
//!   fingerprinter cannot process (`KeyError`), which reach the caller
//!   unchanged with the map untouched.
//!
//! Notes and non-goals
//! - No persistence, no concurrent access, no tuning of rehashing.
//! - Overwriting keeps the first-stored key; only the value is replaced.
//! - Logging goes through the `log` facade at `trace`/`debug` level.

mod bucket_store;
pub mod canonical;
pub mod equivalence;
pub mod iter;
pub mod key;
mod map;

// Public surface
pub use canonical::{CanonicalOptions, Canonicalizer, Fingerprint, Fingerprinter};
pub use equivalence::{Equivalence, PartialEqEquivalence, StructuralEq};
pub use iter::Cursor;
pub use key::{Key, KeyError};
pub use map::StructuralHashMap;
