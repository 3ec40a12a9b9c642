//! # KvStore
//!
//! In-memory ordered byte-key store with the cursor semantics of the embedded
//! engine the codecs are written against: keys compare as unsigned
//! byte strings (lexicographic, shorter prefix first), iteration is in key
//! order, and values can be patched in place.
//!
//! It is deliberately raw: keys and values are whatever the codecs produce.

use std::collections::BTreeMap;
use std::ops::Bound;

#[derive(Debug, Default)]
pub struct KvStore {
    map: BTreeMap<Vec<u8>, Vec<u8>>,
    approx_size: usize,
}

impl KvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a value, returning the previous one.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Option<Vec<u8>> {
        let added = key.len() + value.len();
        let key_len = key.len();
        let old = self.map.insert(key, value);
        if let Some(ref ov) = old {
            self.approx_size = self.approx_size.saturating_sub(key_len + ov.len());
        }
        self.approx_size += added;
        old
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.map.get(key).map(Vec::as_slice)
    }

    /// Mutable access to a stored value for in-place partial updates.
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut [u8]> {
        self.map.get_mut(key).map(Vec::as_mut_slice)
    }

    pub fn delete(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        let old = self.map.remove(key);
        if let Some(ref ov) = old {
            self.approx_size = self.approx_size.saturating_sub(key.len() + ov.len());
        }
        old
    }

    /// Ordered iterator over every entry.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.map.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    /// Forward cursor positioned at the first key `>= start`.
    pub fn seek<'a>(&'a self, start: &[u8]) -> impl Iterator<Item = (&'a [u8], &'a [u8])> + 'a {
        self.map
            .range::<[u8], _>((Bound::Included(start), Bound::Unbounded))
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    /// Backward cursor positioned at the last key `<= start`.
    pub fn seek_back<'a>(
        &'a self,
        start: &[u8],
    ) -> impl Iterator<Item = (&'a [u8], &'a [u8])> + 'a {
        self.map
            .range::<[u8], _>((Bound::Unbounded, Bound::Included(start)))
            .rev()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    /// Entries whose key starts with `prefix`, in key order.
    pub fn prefix<'a>(&'a self, prefix: &'a [u8]) -> impl Iterator<Item = (&'a [u8], &'a [u8])> + 'a {
        self.seek(prefix).take_while(move |(k, _)| k.starts_with(prefix))
    }

    /// Removes every entry whose key starts with `prefix`, returning how many went.
    pub fn delete_prefix(&mut self, prefix: &[u8]) -> usize {
        let doomed: Vec<Vec<u8>> = self.prefix(prefix).map(|(k, _)| k.to_vec()).collect();
        for key in &doomed {
            self.delete(key);
        }
        doomed.len()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Sum of key and value lengths currently stored.
    pub fn approx_size(&self) -> usize {
        self.approx_size
    }
}
