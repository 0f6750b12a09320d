//! Iteration over a `StructuralHashMap`.
//!
//! All views are bucket-major: buckets in store order, and entries within a
//! bucket in their current bucket order. No order is promised across
//! fingerprints. Borrowing iterators see a frozen map; [`Cursor`] does not
//! borrow and observes mutation between steps.

use crate::bucket_store::{Bucket, BucketId, Entry};
use crate::map::StructuralHashMap;
use core::hash::BuildHasher;
use core::iter::FusedIterator;

/// Iterator over `(&K, &V)`.
pub struct Iter<'a, K, V> {
    buckets: slotmap::basic::Values<'a, BucketId, Bucket<K, V>>,
    entries: core::slice::Iter<'a, Entry<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(
        buckets: slotmap::basic::Values<'a, BucketId, Bucket<K, V>>,
        len: usize,
    ) -> Self {
        Self {
            buckets,
            entries: <&[Entry<K, V>]>::default().iter(),
            remaining: len,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(e) = self.entries.next() {
                self.remaining -= 1;
                return Some((&e.key, &e.value));
            }
            self.entries = self.buckets.next()?.entries.iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)`.
pub struct IterMut<'a, K, V> {
    buckets: slotmap::basic::ValuesMut<'a, BucketId, Bucket<K, V>>,
    entries: core::slice::IterMut<'a, Entry<K, V>>,
    remaining: usize,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(
        buckets: slotmap::basic::ValuesMut<'a, BucketId, Bucket<K, V>>,
        len: usize,
    ) -> Self {
        Self {
            buckets,
            entries: <&mut [Entry<K, V>]>::default().iter_mut(),
            remaining: len,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(e) = self.entries.next() {
                self.remaining -= 1;
                return Some((&e.key, &mut e.value));
            }
            self.entries = self.buckets.next()?.entries.iter_mut();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator over `(K, V)`.
pub struct IntoIter<K, V> {
    buckets: slotmap::basic::IntoIter<BucketId, Bucket<K, V>>,
    entries: std::vec::IntoIter<Entry<K, V>>,
    remaining: usize,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(buckets: slotmap::basic::IntoIter<BucketId, Bucket<K, V>>, len: usize) -> Self {
        Self {
            buckets,
            entries: Vec::new().into_iter(),
            remaining: len,
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(e) = self.entries.next() {
                self.remaining -= 1;
                return Some((e.key, e.value));
            }
            let (_, bucket) = self.buckets.next()?;
            self.entries = bucket.entries.into_iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

pub struct Keys<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

pub struct ValuesMut<'a, K, V> {
    pub(crate) inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

/// Explicit cursor that survives mutation of the map between steps.
///
/// The bucket list is snapshotted when the cursor is created; bucket
/// contents are read live on every step:
/// - buckets removed since the snapshot are skipped;
/// - buckets created since the snapshot are not visited;
/// - entries appended to a snapshotted bucket are visited;
/// - removing an entry at or before the cursor's position in the current
///   bucket shifts the rest down, so one entry may be skipped.
///
/// A cursor must be advanced with the map that created it.
#[derive(Clone, Debug)]
pub struct Cursor {
    buckets: Vec<BucketId>,
    bucket: usize,
    entry: usize,
}

impl Cursor {
    pub(crate) fn new(buckets: Vec<BucketId>) -> Self {
        Self {
            buckets,
            bucket: 0,
            entry: 0,
        }
    }

    /// Advance to the next live entry.
    pub fn next_entry<'a, K, V, C, E, S>(
        &mut self,
        map: &'a StructuralHashMap<K, V, C, E, S>,
    ) -> Option<(&'a K, &'a V)>
    where
        S: BuildHasher,
    {
        while let Some(&id) = self.buckets.get(self.bucket) {
            if let Some(e) = map.store.bucket(id).and_then(|b| b.entries.get(self.entry)) {
                self.entry += 1;
                return Some((&e.key, &e.value));
            }
            self.bucket += 1;
            self.entry = 0;
        }
        None
    }

    /// Restart from the first snapshotted bucket.
    pub fn rewind(&mut self) {
        self.bucket = 0;
        self.entry = 0;
    }

    pub fn is_exhausted(&self) -> bool {
        self.bucket >= self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Key, StructuralHashMap};
    use std::collections::BTreeSet;

    /// Invariant: size_hint is exact and shrinks as entries are yielded.
    #[test]
    fn exact_size() {
        let m = StructuralHashMap::from_entries([(0, 'a'), (1, 'b'), (2, 'c')]).unwrap();
        let mut it = m.iter();
        assert_eq!(it.len(), 3);
        it.next();
        assert_eq!(it.len(), 2);
        assert_eq!(it.count(), 2);
    }

    /// Invariant: iter_mut updates are seen by later lookups.
    #[test]
    fn iter_mut_and_values_mut() {
        let mut m = StructuralHashMap::from_entries([(0, 1), (1, 2)]).unwrap();
        for (_k, v) in m.iter_mut() {
            *v *= 10;
        }
        for v in m.values_mut() {
            *v += 1;
        }
        assert_eq!(m.get(&Key::from(0)).unwrap(), Some(&11));
        assert_eq!(m.get(&Key::from(1)).unwrap(), Some(&21));
    }

    /// Invariant: the owning iterator yields every entry exactly once.
    #[test]
    fn into_iter_yields_all() {
        let m = StructuralHashMap::from_entries([(0, 'a'), (1, 'b'), (2, 'c')]).unwrap();
        let got: BTreeSet<char> = m.into_iter().map(|(_, v)| v).collect();
        assert_eq!(got, ['a', 'b', 'c'].into_iter().collect());
    }

    /// Invariant: a cursor on an unmutated map matches `iter` and can rewind.
    #[test]
    fn cursor_matches_iter() {
        let m = StructuralHashMap::from_entries([(0, 'a'), (1, 'b'), (2, 'c')]).unwrap();
        let mut c = m.cursor();
        let mut seen = Vec::new();
        while let Some((_, v)) = c.next_entry(&m) {
            seen.push(*v);
        }
        assert!(c.is_exhausted());
        let expected: Vec<char> = m.values().copied().collect();
        assert_eq!(seen, expected);

        c.rewind();
        assert_eq!(c.next_entry(&m).map(|(_, v)| *v), expected.first().copied());
    }

    /// Invariant: the cursor skips removed buckets, ignores new buckets, and
    /// sees entries appended to snapshotted buckets.
    #[test]
    fn cursor_observes_mutation() {
        let mut m = StructuralHashMap::from_entries([(0, 'a'), (1, 'b')]).unwrap();
        let mut c = m.cursor();

        m.delete(&Key::from(1)).unwrap();
        m.set(Key::from(2), 'c').unwrap();
        // "0" shares the bucket of 0 in coerce mode.
        m.set(Key::from("0"), 'z').unwrap();

        let mut seen = Vec::new();
        while let Some((_, v)) = c.next_entry(&m) {
            seen.push(*v);
        }
        assert_eq!(seen, vec!['a', 'z']);
    }
}
