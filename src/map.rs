//! StructuralHashMap: public map surface over the bucket store.
//!
//! Every key-taking operation fingerprints the key, finds the candidate
//! bucket, then scans it in order with the equivalence policy. Fingerprint
//! failures propagate as `Err` and leave the map untouched; absence is never
//! an error.

use crate::bucket_store::{BucketId, BucketStore, Entry};
use crate::canonical::{CanonicalOptions, Canonicalizer, Fingerprint, Fingerprinter};
use crate::equivalence::{Equivalence, StructuralEq};
use crate::iter::{Cursor, IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
use crate::key::{Key, KeyError};
use core::fmt;
use core::hash::BuildHasher;
use std::collections::hash_map::RandomState;

/// Where a key lives, or would live.
enum Slot {
    /// No bucket for this fingerprint.
    Vacant(Fingerprint),
    /// Bucket exists, no equivalent key in it.
    Collision(BucketId),
    Occupied(BucketId, usize),
}

/// A map whose keys are matched by structural equivalence.
///
/// `C` fingerprints keys for bucket placement, `E` decides sameness inside a
/// bucket, and `S` hashes fingerprints for the bucket index.
#[derive(Clone)]
pub struct StructuralHashMap<K, V, C = Canonicalizer, E = StructuralEq, S = RandomState> {
    canonicalizer: C,
    equivalence: E,
    pub(crate) store: BucketStore<K, V, S>,
}

impl<V> StructuralHashMap<Key, V> {
    pub fn new() -> Self {
        Self::with_options(CanonicalOptions::default())
    }

    pub fn with_options(options: CanonicalOptions) -> Self {
        Self::with_policies(Canonicalizer::new(options), StructuralEq)
    }

    /// Build from an entry sequence via repeated [`set`](Self::set); later
    /// duplicates win. Stops at the first key that cannot be fingerprinted.
    pub fn from_entries<Q, I>(entries: I) -> Result<Self, KeyError>
    where
        Q: Into<Key>,
        I: IntoIterator<Item = (Q, V)>,
    {
        Self::from_entries_with_options(entries, CanonicalOptions::default())
    }

    pub fn from_entries_with_options<Q, I>(
        entries: I,
        options: CanonicalOptions,
    ) -> Result<Self, KeyError>
    where
        Q: Into<Key>,
        I: IntoIterator<Item = (Q, V)>,
    {
        let mut map = Self::with_options(options);
        map.try_extend(entries.into_iter().map(|(k, v)| (k.into(), v)))?;
        Ok(map)
    }

    pub fn options(&self) -> &CanonicalOptions {
        self.canonicalizer.options()
    }
}

impl<V> Default for StructuralHashMap<Key, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C, E> StructuralHashMap<K, V, C, E>
where
    C: Fingerprinter<K>,
    E: Equivalence<K>,
{
    /// Use caller-supplied fingerprint and equivalence policies.
    pub fn with_policies(canonicalizer: C, equivalence: E) -> Self {
        Self::with_policies_and_hasher(canonicalizer, equivalence, RandomState::new())
    }
}

impl<K, V, C, E, S> StructuralHashMap<K, V, C, E, S>
where
    S: BuildHasher,
{
    pub fn with_policies_and_hasher(canonicalizer: C, equivalence: E, hasher: S) -> Self {
        Self {
            canonicalizer,
            equivalence,
            store: BucketStore::with_hasher(hasher),
        }
    }

    pub fn canonicalizer(&self) -> &C {
        &self.canonicalizer
    }

    pub fn equivalence(&self) -> &E {
        &self.equivalence
    }

    pub fn hasher(&self) -> &S {
        self.store.hasher()
    }

    /// Number of entries; sums bucket lengths on every call.
    pub fn size(&self) -> usize {
        self.store.len()
    }

    pub fn len(&self) -> usize {
        self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Number of distinct fingerprints currently in use.
    pub fn bucket_count(&self) -> usize {
        self.store.bucket_count()
    }

    /// Drop every entry and bucket.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Entries, bucket-major. Same as [`entries`](Self::entries).
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.store.buckets(), self.store.len())
    }

    pub fn entries(&self) -> Iter<'_, K, V> {
        self.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let len = self.store.len();
        IterMut::new(self.store.buckets_mut(), len)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// A detached cursor over the current bucket list.
    ///
    /// Unlike [`iter`](Self::iter) it does not borrow the map, so the map may
    /// be mutated between steps; see [`Cursor`] for what the cursor observes.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.store.bucket_ids())
    }

    /// Visit every entry as `(value, key, map)`.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&V, &K, &Self),
    {
        for (k, v) in self.iter() {
            f(v, k, self);
        }
    }

    /// Visit every entry with a caller-supplied receiver threaded through.
    pub fn for_each_with<R, F>(&self, receiver: &mut R, mut f: F)
    where
        F: FnMut(&mut R, &V, &K, &Self),
    {
        for (k, v) in self.iter() {
            f(receiver, v, k, self);
        }
    }
}

impl<K, V, C, E, S> StructuralHashMap<K, V, C, E, S>
where
    C: Fingerprinter<K>,
    E: Equivalence<K>,
    S: BuildHasher,
{
    pub fn fingerprint(&self, key: &K) -> Result<Fingerprint, KeyError> {
        self.canonicalizer.fingerprint(key)
    }

    fn locate(&self, key: &K) -> Result<Slot, KeyError> {
        let fp = self.canonicalizer.fingerprint(key)?;
        let Some((id, bucket)) = self
            .store
            .find(&fp)
            .and_then(|id| self.store.bucket(id).map(|b| (id, b)))
        else {
            return Ok(Slot::Vacant(fp));
        };
        Ok(
            match bucket
                .entries
                .iter()
                .position(|e| self.equivalence.equivalent(key, &e.key))
            {
                Some(i) => Slot::Occupied(id, i),
                None => Slot::Collision(id),
            },
        )
    }

    pub fn get(&self, key: &K) -> Result<Option<&V>, KeyError> {
        Ok(match self.locate(key)? {
            Slot::Occupied(id, i) => self
                .store
                .bucket(id)
                .and_then(|b| b.entries.get(i))
                .map(|e| &e.value),
            Slot::Vacant(_) | Slot::Collision(_) => None,
        })
    }

    /// Stored key and value for a key equivalent to `key`.
    pub fn get_key_value(&self, key: &K) -> Result<Option<(&K, &V)>, KeyError> {
        Ok(match self.locate(key)? {
            Slot::Occupied(id, i) => self
                .store
                .bucket(id)
                .and_then(|b| b.entries.get(i))
                .map(|e| (&e.key, &e.value)),
            Slot::Vacant(_) | Slot::Collision(_) => None,
        })
    }

    pub fn get_mut(&mut self, key: &K) -> Result<Option<&mut V>, KeyError> {
        Ok(match self.locate(key)? {
            Slot::Occupied(id, i) => self
                .store
                .bucket_mut(id)
                .and_then(|b| b.entries.get_mut(i))
                .map(|e| &mut e.value),
            Slot::Vacant(_) | Slot::Collision(_) => None,
        })
    }

    pub fn has(&self, key: &K) -> Result<bool, KeyError> {
        Ok(matches!(self.locate(key)?, Slot::Occupied(..)))
    }

    pub fn contains_key(&self, key: &K) -> Result<bool, KeyError> {
        self.has(key)
    }

    /// Insert or overwrite, returning the previous value.
    ///
    /// An overwrite keeps the stored key and its position; a new key is
    /// appended to the end of its bucket.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, KeyError> {
        match self.locate(&key)? {
            Slot::Vacant(fp) => {
                self.store.insert_bucket(fp, key, value);
                Ok(None)
            }
            Slot::Collision(id) => {
                if let Some(bucket) = self.store.bucket_mut(id) {
                    log::debug!(
                        "fingerprint collision on {}: bucket grows to {} entries",
                        bucket.fingerprint(),
                        bucket.entries.len() + 1
                    );
                    bucket.entries.push(Entry { key, value });
                }
                Ok(None)
            }
            Slot::Occupied(id, i) => Ok(self
                .store
                .bucket_mut(id)
                .and_then(|b| b.entries.get_mut(i))
                .map(|e| core::mem::replace(&mut e.value, value))),
        }
    }

    /// Fluent insert.
    pub fn set(&mut self, key: K, value: V) -> Result<&mut Self, KeyError> {
        self.insert(key, value)?;
        Ok(self)
    }

    /// Remove the entry for `key`, returning the stored key and value.
    ///
    /// Later entries in the same bucket shift down; a bucket left empty is
    /// dropped from the store.
    pub fn remove(&mut self, key: &K) -> Result<Option<(K, V)>, KeyError> {
        let Slot::Occupied(id, i) = self.locate(key)? else {
            return Ok(None);
        };
        let Some(bucket) = self.store.bucket_mut(id) else {
            return Ok(None);
        };
        let entry = bucket.entries.remove(i);
        if bucket.entries.is_empty() {
            self.store.remove_bucket(id);
        }
        Ok(Some((entry.key, entry.value)))
    }

    /// Remove the entry for `key`; `Ok(false)` if there was none.
    pub fn delete(&mut self, key: &K) -> Result<bool, KeyError> {
        Ok(self.remove(key)?.is_some())
    }

    /// [`set`](Self::set) each entry in order. Entries before a failing key
    /// stay inserted.
    pub fn try_extend<I>(&mut self, entries: I) -> Result<(), KeyError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in entries {
            self.insert(k, v)?;
        }
        Ok(())
    }

    /// Build with caller-supplied policies from an entry sequence.
    pub fn from_entries_with_policies<I>(
        entries: I,
        canonicalizer: C,
        equivalence: E,
    ) -> Result<Self, KeyError>
    where
        I: IntoIterator<Item = (K, V)>,
        S: Default,
    {
        let mut map = Self::with_policies_and_hasher(canonicalizer, equivalence, S::default());
        map.try_extend(entries)?;
        Ok(map)
    }
}

impl<K, V, C, E, S> fmt::Debug for StructuralHashMap<K, V, C, E, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, C, E, S: BuildHasher> IntoIterator for &'a StructuralHashMap<K, V, C, E, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, C, E, S: BuildHasher> IntoIterator for &'a mut StructuralHashMap<K, V, C, E, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, C, E, S: BuildHasher> IntoIterator for StructuralHashMap<K, V, C, E, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        let len = self.store.len();
        IntoIter::new(self.store.into_buckets(), len)
    }
}
