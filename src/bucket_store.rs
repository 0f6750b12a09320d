//! BucketStore: fingerprint -> bucket storage with generational bucket ids.
//!
//! Buckets live in a `SlotMap`; a `HashTable` indexes them by the hash of
//! their fingerprint. The store knows nothing about key equivalence: it only
//! places, finds and drops whole buckets. Callers keep the invariant that a
//! bucket present in the store is non-empty.

use crate::canonical::Fingerprint;
use core::hash::BuildHasher;
use hashbrown::HashTable;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Generational id of a bucket. Stale ids never resolve to a newer bucket.
    pub struct BucketId;
}

#[derive(Clone, Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
}

#[derive(Clone, Debug)]
pub(crate) struct Bucket<K, V> {
    fingerprint: Fingerprint,
    hash: u64,
    pub(crate) entries: Vec<Entry<K, V>>,
}

impl<K, V> Bucket<K, V> {
    pub(crate) fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }
}

#[derive(Clone)]
pub(crate) struct BucketStore<K, V, S> {
    hasher: S,
    index: HashTable<BucketId>,
    buckets: SlotMap<BucketId, Bucket<K, V>>,
}

impl<K, V, S> BucketStore<K, V, S>
where
    S: BuildHasher,
{
    pub(crate) fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::new(),
            buckets: SlotMap::with_key(),
        }
    }

    fn make_hash(&self, fp: &Fingerprint) -> u64 {
        self.hasher.hash_one(fp)
    }

    pub(crate) fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Entry count: sum of bucket lengths, computed on demand.
    pub(crate) fn len(&self) -> usize {
        self.buckets.values().map(|b| b.entries.len()).sum()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn find(&self, fp: &Fingerprint) -> Option<BucketId> {
        let hash = self.make_hash(fp);
        self.index
            .find(hash, |&id| {
                self.buckets
                    .get(id)
                    .map(|b| &b.fingerprint == fp)
                    .unwrap_or(false)
            })
            .copied()
    }

    pub(crate) fn bucket(&self, id: BucketId) -> Option<&Bucket<K, V>> {
        self.buckets.get(id)
    }

    pub(crate) fn bucket_mut(&mut self, id: BucketId) -> Option<&mut Bucket<K, V>> {
        self.buckets.get_mut(id)
    }

    /// Create a bucket holding a single entry. The caller has checked that
    /// no bucket exists for `fp`.
    pub(crate) fn insert_bucket(&mut self, fp: Fingerprint, key: K, value: V) -> BucketId {
        let hash = self.make_hash(&fp);
        log::trace!("creating bucket for fingerprint {}", fp);
        let id = self.buckets.insert(Bucket {
            fingerprint: fp,
            hash,
            entries: vec![Entry { key, value }],
        });
        let buckets = &self.buckets;
        let _ = self.index.insert_unique(hash, id, |&kk| {
            buckets.get(kk).map(|b| b.hash).unwrap_or(0)
        });
        id
    }

    /// Unlink and return a bucket.
    pub(crate) fn remove_bucket(&mut self, id: BucketId) -> Option<Bucket<K, V>> {
        let bucket = self.buckets.remove(id)?;
        log::trace!("dropping empty bucket for fingerprint {}", bucket.fingerprint);
        if let Ok(slot) = self.index.find_entry(bucket.hash, |&kk| kk == id) {
            let _ = slot.remove();
        }
        Some(bucket)
    }

    pub(crate) fn clear(&mut self) {
        log::trace!("clearing {} buckets", self.buckets.len());
        self.index.clear();
        self.buckets.clear();
    }

    /// Current bucket ids in iteration order.
    pub(crate) fn bucket_ids(&self) -> Vec<BucketId> {
        self.buckets.keys().collect()
    }

    pub(crate) fn buckets(&self) -> slotmap::basic::Values<'_, BucketId, Bucket<K, V>> {
        self.buckets.values()
    }

    pub(crate) fn buckets_mut(&mut self) -> slotmap::basic::ValuesMut<'_, BucketId, Bucket<K, V>> {
        self.buckets.values_mut()
    }

    pub(crate) fn into_buckets(self) -> slotmap::basic::IntoIter<BucketId, Bucket<K, V>> {
        self.buckets.into_iter()
    }
}
