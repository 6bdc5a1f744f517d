use std::{fmt, mem};

use crate::error::MapError;
use crate::hashing;

/// Default bucket count used by [`ChainedMap::new`]
const DEFAULT_CAPACITY: usize = 64;

/// A single key-value entry in a bucket chain
#[derive(Debug)]
struct Entry {
    /// The owned key; a private copy the caller can no longer touch
    key: String,
    /// The value associated with the key
    value: i32,
    /// The next entry in the same bucket's chain, if any
    next: Option<Box<Entry>>,
}

/// One bucket's chain: empty, or the owned head entry
type Chain = Option<Box<Entry>>;

/// A hash table with a fixed bucket count and separate chaining.
///
/// Keys are routed to buckets with [`hashing::bucket_index`] and collisions
/// are resolved by a singly-linked chain per bucket, newest entry first. The
/// bucket count is set at construction and never changes; there is no
/// resizing or rehashing.
///
/// Inserting a key that is already present does not replace it: the new entry
/// becomes the chain head and *shadows* the older one until it is removed.
///
/// Note: This implementation is not thread-safe. For concurrent access, use
/// `ConcurrentChainedMap`.
#[derive(Debug)]
pub struct ChainedMap {
    /// The bucket chains; the length is fixed at construction
    buckets: Vec<Chain>,
    /// Number of entries across all chains, shadowed duplicates included
    len: usize,
}

impl Default for ChainedMap {
    fn default() -> Self {
        Self::new()
    }
}

impl Extend<(String, i32)> for ChainedMap {
    fn extend<T: IntoIterator<Item = (String, i32)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl ChainedMap {
    /// Creates a new `ChainedMap` with the default bucket count
    #[must_use]
    pub fn new() -> Self {
        Self::build(DEFAULT_CAPACITY)
    }

    /// Creates a new `ChainedMap` with exactly `capacity` buckets.
    ///
    /// The bucket count is immutable for the map's lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::ZeroCapacity`] when `capacity` is zero; a map with
    /// no buckets has nowhere to route a key.
    pub fn with_capacity(capacity: usize) -> Result<Self, MapError> {
        if capacity == 0 {
            return Err(MapError::ZeroCapacity);
        }
        Ok(Self::build(capacity))
    }

    /// Builds a map with `capacity` empty buckets; callers guarantee
    /// `capacity >= 1`
    fn build(capacity: usize) -> Self {
        Self { buckets: std::iter::repeat_with(|| None).take(capacity).collect(), len: 0 }
    }

    /// Routes a key to its bucket index for this map's capacity
    fn bucket_of(&self, key: &str) -> usize {
        hashing::bucket_index(key, self.buckets.len())
    }

    /// Inserts a key-value pair as the new head of its bucket's chain.
    ///
    /// Always succeeds, and never checks whether the key is already present:
    /// inserting a duplicate grows the chain with a second entry that shadows
    /// the first for lookups until the newer one is removed.
    pub fn insert(&mut self, key: String, value: i32) {
        let index = self.bucket_of(&key);
        if let Some(slot) = self.buckets.get_mut(index) {
            let previous = slot.take();
            *slot = Some(Box::new(Entry { key, value, next: previous }));
            self.len = self.len.saturating_add(1);
        }
    }

    /// Returns true if any entry in the map has the given key
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Retrieves the value of the first entry with the given key.
    ///
    /// "First" is chain order: the most recently inserted entry for the key
    /// wins when duplicates shadow each other.
    pub fn get(&self, key: &str) -> Option<&i32> {
        let mut current = self.buckets.get(self.bucket_of(key))?.as_deref();
        while let Some(entry) = current {
            if entry.key == key {
                return Some(&entry.value);
            }
            current = entry.next.as_deref();
        }
        None
    }

    /// Gets a mutable reference to the value of the first entry with the
    /// given key
    pub fn get_mut(&mut self, key: &str) -> Option<&mut i32> {
        let index = self.bucket_of(key);
        let mut current = self.buckets.get_mut(index).and_then(Option::as_deref_mut);
        while let Some(entry) = current {
            if entry.key == key {
                return Some(&mut entry.value);
            }
            current = entry.next.as_deref_mut();
        }
        None
    }

    /// Overwrites the value of the first entry with the given key and
    /// returns the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::KeyNotFound`] when no entry has the key; the map
    /// is left untouched.
    pub fn update(&mut self, key: &str, value: i32) -> Result<i32, MapError> {
        match self.get_mut(key) {
            Some(slot) => Ok(mem::replace(slot, value)),
            None => Err(MapError::KeyNotFound(key.to_owned())),
        }
    }

    /// Unlinks the first entry with the given key from its chain and returns
    /// its value.
    ///
    /// Only the first match is removed: a shadowed duplicate further down the
    /// chain re-surfaces for subsequent lookups. The rest of the chain and
    /// every other bucket keep their order.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::KeyNotFound`] when no entry has the key; the map
    /// is left untouched.
    pub fn remove(&mut self, key: &str) -> Result<i32, MapError> {
        let index = self.bucket_of(key);
        let Some(mut link) = self.buckets.get_mut(index) else {
            return Err(MapError::KeyNotFound(key.to_owned()));
        };
        loop {
            if link.as_deref().is_some_and(|entry| entry.key == key) {
                let Some(mut removed) = link.take() else {
                    // Unreachable: the probe above saw a matching head.
                    return Err(MapError::KeyNotFound(key.to_owned()));
                };
                *link = removed.next.take();
                self.len = self.len.saturating_sub(1);
                return Ok(removed.value);
            }
            match link {
                Some(entry) => link = &mut entry.next,
                None => return Err(MapError::KeyNotFound(key.to_owned())),
            }
        }
    }

    /// Returns the number of entries in the map, counting shadowed duplicates
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the map holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the fixed bucket count of the map
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the ratio of entries to buckets; with chaining this can
    /// exceed 1.0
    #[must_use]
    #[allow(clippy::arithmetic_side_effects, clippy::cast_precision_loss)]
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.buckets.len() as f64
    }

    /// Returns an iterator over the key-value pairs, visiting buckets in
    /// index order and each chain head to tail
    #[must_use]
    #[allow(clippy::iter_without_into_iter)]
    pub fn iter(&self) -> Iter<'_> {
        Iter { buckets: &self.buckets, index: 0, current: None }
    }

    /// Releases every entry in every bucket, keeping the buckets themselves.
    ///
    /// Chains are unlinked iteratively: a bucket with a very long chain must
    /// not consume stack proportional to its length.
    pub fn clear(&mut self) {
        for slot in &mut self.buckets {
            let mut next = slot.take();
            while let Some(mut entry) = next {
                next = entry.next.take();
            }
        }
        self.len = 0;
    }
}

impl Drop for ChainedMap {
    fn drop(&mut self) {
        // The derived drop would recurse through `next` boxes chain-deep.
        self.clear();
    }
}

impl Clone for ChainedMap {
    fn clone(&self) -> Self {
        Self { buckets: self.buckets.iter().map(clone_chain).collect(), len: self.len }
    }
}

/// Clones one chain iteratively, preserving entry order
fn clone_chain(chain: &Chain) -> Chain {
    let mut head = None;
    let mut tail = &mut head;
    let mut current = chain.as_deref();
    while let Some(entry) = current {
        let link = tail.insert(Box::new(Entry {
            key: entry.key.clone(),
            value: entry.value,
            next: None,
        }));
        tail = &mut link.next;
        current = entry.next.as_deref();
    }
    head
}

impl fmt::Display for ChainedMap {
    /// Prints every bucket in index order with its chain head to tail, and
    /// an explicit marker for empty buckets. Diagnostic only; the exact
    /// format is not a stable interface.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, chain) in self.buckets.iter().enumerate() {
            write!(f, "bucket {index}:")?;
            let mut current = chain.as_deref();
            if current.is_none() {
                writeln!(f, " (empty)")?;
                continue;
            }
            while let Some(entry) = current {
                write!(f, " {{\"{key}\": {value}}}", key = entry.key, value = entry.value)?;
                current = entry.next.as_deref();
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Iterator over the key-value pairs of a [`ChainedMap`]
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    /// The map's bucket slots
    buckets: &'a [Chain],
    /// Index of the next bucket to visit
    index: usize,
    /// Cursor within the current chain
    current: Option<&'a Entry>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a i32);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current {
                self.current = entry.next.as_deref();
                return Some((entry.key.as_str(), &entry.value));
            }
            let chain = self.buckets.get(self.index)?;
            self.index = self.index.saturating_add(1);
            self.current = chain.as_deref();
        }
    }
}
