use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::error::MapError;
use crate::hashing;

/// Default bucket count used by [`ConcurrentChainedMap::new`]
const DEFAULT_CAPACITY: usize = 64;

/// A single key-value entry in a bucket chain
#[derive(Debug)]
struct Entry {
    /// The owned key
    key: String,
    /// The value associated with the key
    value: i32,
    /// The next entry in the same bucket's chain, if any
    next: Option<Box<Entry>>,
}

/// One bucket's chain: empty, or the owned head entry
type Chain = Option<Box<Entry>>;

/// A thread-safe hash table with a fixed bucket count and separate chaining.
///
/// Sharding is per bucket: every chain sits behind its own [`Mutex`], so
/// operations on different buckets never contend and operations on the same
/// bucket are mutually exclusive for the duration of the whole scan. Because
/// the bucket count never changes, no global lock is needed and a key's
/// bucket is stable for the map's lifetime.
///
/// The chain semantics match `ChainedMap`: inserting an existing key adds a
/// shadowing entry at the chain head rather than replacing the old one.
///
/// All operations take `&self`; share the map with [`std::sync::Arc`].
#[derive(Debug)]
pub struct ConcurrentChainedMap {
    /// Per-bucket chains, each behind its own lock; the length is fixed at
    /// construction
    buckets: Vec<Mutex<Chain>>,
    /// Number of entries across all chains, shadowed duplicates included
    len: AtomicUsize,
}

impl ConcurrentChainedMap {
    /// Creates a new `ConcurrentChainedMap` with the default bucket count
    #[must_use]
    pub fn new() -> Self {
        Self::build(DEFAULT_CAPACITY)
    }

    /// Creates a new `ConcurrentChainedMap` with exactly `capacity` buckets.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::ZeroCapacity`] when `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Result<Self, MapError> {
        if capacity == 0 {
            return Err(MapError::ZeroCapacity);
        }
        Ok(Self::build(capacity))
    }

    /// Builds a map with `capacity` empty buckets; callers guarantee
    /// `capacity >= 1`
    fn build(capacity: usize) -> Self {
        let mut buckets = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            buckets.push(Mutex::new(None));
        }
        Self { buckets, len: AtomicUsize::new(0) }
    }

    /// Routes a key to its bucket index for this map's capacity
    fn bucket_of(&self, key: &str) -> usize {
        hashing::bucket_index(key, self.buckets.len())
    }

    /// Locks the chain of the bucket at `index`.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned, i.e. another thread panicked while
    /// holding it.
    #[allow(clippy::expect_used)]
    fn lock_bucket(&self, index: usize) -> MutexGuard<'_, Chain> {
        self.buckets
            .get(index)
            .and_then(|bucket| bucket.lock().ok())
            .expect("bucket lock poisoned")
    }

    /// Inserts a key-value pair as the new head of its bucket's chain.
    ///
    /// Duplicate keys shadow older entries, exactly as in `ChainedMap`.
    ///
    /// # Panics
    ///
    /// Panics if the bucket's lock is poisoned.
    pub fn insert(&self, key: String, value: i32) {
        let index = self.bucket_of(&key);
        let mut chain = self.lock_bucket(index);
        let previous = chain.take();
        *chain = Some(Box::new(Entry { key, value, next: previous }));
        drop(chain);
        self.len.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns true if any entry in the map has the given key
    ///
    /// # Panics
    ///
    /// Panics if the bucket's lock is poisoned.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Retrieves the value of the first entry with the given key.
    ///
    /// The value is copied out so no lock outlives the call.
    ///
    /// # Panics
    ///
    /// Panics if the bucket's lock is poisoned.
    pub fn get(&self, key: &str) -> Option<i32> {
        let chain = self.lock_bucket(self.bucket_of(key));
        let mut current = chain.as_deref();
        while let Some(entry) = current {
            if entry.key == key {
                return Some(entry.value);
            }
            current = entry.next.as_deref();
        }
        None
    }

    /// Overwrites the value of the first entry with the given key and
    /// returns the previous value.
    ///
    /// The bucket stays locked for the whole scan-and-write, so a concurrent
    /// `remove` of the same entry cannot interleave.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::KeyNotFound`] when no entry has the key.
    ///
    /// # Panics
    ///
    /// Panics if the bucket's lock is poisoned.
    pub fn update(&self, key: &str, value: i32) -> Result<i32, MapError> {
        let index = self.bucket_of(key);
        let mut chain = self.lock_bucket(index);
        let mut current = chain.as_deref_mut();
        while let Some(entry) = current {
            if entry.key == key {
                return Ok(mem::replace(&mut entry.value, value));
            }
            current = entry.next.as_deref_mut();
        }
        Err(MapError::KeyNotFound(key.to_owned()))
    }

    /// Unlinks the first entry with the given key from its chain and returns
    /// its value.
    ///
    /// A shadowed duplicate further down the chain re-surfaces for
    /// subsequent lookups.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::KeyNotFound`] when no entry has the key.
    ///
    /// # Panics
    ///
    /// Panics if the bucket's lock is poisoned.
    pub fn remove(&self, key: &str) -> Result<i32, MapError> {
        let index = self.bucket_of(key);
        let mut chain = self.lock_bucket(index);
        let mut link: &mut Chain = &mut chain;
        loop {
            if link.as_deref().is_some_and(|entry| entry.key == key) {
                let Some(mut removed) = link.take() else {
                    // Unreachable: the probe above saw a matching head.
                    return Err(MapError::KeyNotFound(key.to_owned()));
                };
                *link = removed.next.take();
                drop(chain);
                self.len.fetch_sub(1, Ordering::Relaxed);
                return Ok(removed.value);
            }
            match link {
                Some(entry) => link = &mut entry.next,
                None => return Err(MapError::KeyNotFound(key.to_owned())),
            }
        }
    }

    /// Returns the number of entries in the map, counting shadowed
    /// duplicates.
    ///
    /// The count is a moment-in-time snapshot while other threads mutate.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// Returns true if the map holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the fixed bucket count of the map
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns an iterator over the key-value pairs.
    ///
    /// Buckets are snapshotted one at a time in index order, so the iterator
    /// never holds more than one bucket lock and never blocks writers on
    /// other buckets. Pairs are copied out; concurrent mutations after a
    /// bucket was snapshotted are not reflected.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter { map: self, index: 0, pending: VecDeque::new() }
    }

    /// Releases every entry in every bucket, keeping the buckets themselves.
    ///
    /// Buckets are cleared one at a time; a concurrent insert into an
    /// already-cleared bucket survives.
    ///
    /// # Panics
    ///
    /// Panics if a bucket's lock is poisoned.
    pub fn clear(&self) {
        for index in 0..self.buckets.len() {
            let mut chain = self.lock_bucket(index);
            let mut released: usize = 0;
            let mut next = chain.take();
            while let Some(mut entry) = next {
                next = entry.next.take();
                released = released.saturating_add(1);
            }
            drop(chain);
            self.len.fetch_sub(released, Ordering::Relaxed);
        }
    }
}

impl Drop for ConcurrentChainedMap {
    fn drop(&mut self) {
        // Tear chains down iteratively, and without panicking on a lock a
        // dead thread poisoned.
        for slot in &mut self.buckets {
            let chain = match slot.get_mut() {
                Ok(chain) => chain,
                Err(poisoned) => poisoned.into_inner(),
            };
            let mut next = chain.take();
            while let Some(mut entry) = next {
                next = entry.next.take();
            }
        }
    }
}

impl Default for ConcurrentChainedMap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConcurrentChainedMap {
    /// Prints every bucket in index order, locking one bucket at a time.
    /// Diagnostic only; the exact format is not a stable interface.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for index in 0..self.buckets.len() {
            let chain = self.lock_bucket(index);
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

/// Iterator over bucket-at-a-time snapshots of a [`ConcurrentChainedMap`]
#[derive(Debug)]
pub struct Iter<'a> {
    /// The map being iterated
    map: &'a ConcurrentChainedMap,
    /// Index of the next bucket to snapshot
    index: usize,
    /// Pairs copied out of the most recently snapshotted bucket
    pending: VecDeque<(String, i32)>,
}

impl Iterator for Iter<'_> {
    type Item = (String, i32);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(pair) = self.pending.pop_front() {
                return Some(pair);
            }
            if self.index >= self.map.buckets.len() {
                return None;
            }
            let chain = self.map.lock_bucket(self.index);
            self.index = self.index.saturating_add(1);
            let mut current = chain.as_deref();
            while let Some(entry) = current {
                self.pending.push_back((entry.key.clone(), entry.value));
                current = entry.next.as_deref();
            }
        }
    }
}

impl<'a> IntoIterator for &'a ConcurrentChainedMap {
    type Item = (String, i32);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_insert_and_get() {
        let map = ConcurrentChainedMap::new();
        map.insert("key1".to_string(), 1);
        map.insert("key2".to_string(), 2);
        map.insert("key3".to_string(), 3);

        assert_eq!(map.get("key1"), Some(1));
        assert_eq!(map.get("key2"), Some(2));
        assert_eq!(map.get("key3"), Some(3));
        assert_eq!(map.get("key4"), None);
    }

    #[test]
    fn test_update() {
        let map = ConcurrentChainedMap::new();
        map.insert("key1".to_string(), 1);

        assert_eq!(map.update("key1", 10), Ok(1));
        assert_eq!(map.get("key1"), Some(10));
        assert_eq!(map.update("key2", 5), Err(MapError::KeyNotFound("key2".to_string())));
    }

    #[test]
    fn test_remove() {
        let map = ConcurrentChainedMap::new();
        map.insert("key1".to_string(), 1);
        map.insert("key2".to_string(), 2);

        assert_eq!(map.remove("key1"), Ok(1));
        assert_eq!(map.get("key1"), None);
        assert_eq!(map.get("key2"), Some(2));
        assert_eq!(map.remove("key1"), Err(MapError::KeyNotFound("key1".to_string())));
    }

    #[test]
    fn test_duplicate_insert_shadows_then_resurfaces() {
        let map = ConcurrentChainedMap::new();
        map.insert("x".to_string(), 1);
        map.insert("x".to_string(), 2);

        assert_eq!(map.get("x"), Some(2));
        assert_eq!(map.len(), 2);

        assert_eq!(map.remove("x"), Ok(2));
        assert_eq!(map.get("x"), Some(1));

        assert_eq!(map.remove("x"), Ok(1));
        assert!(!map.contains_key("x"));
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        assert_eq!(ConcurrentChainedMap::with_capacity(0).err(), Some(MapError::ZeroCapacity));
    }

    #[test]
    fn test_len_and_is_empty() {
        let map = ConcurrentChainedMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);

        map.insert("key1".to_string(), 1);
        assert!(!map.is_empty());
        assert_eq!(map.len(), 1);

        map.insert("key2".to_string(), 2);
        assert_eq!(map.len(), 2);

        map.remove("key1").unwrap();
        assert_eq!(map.len(), 1);

        map.remove("key2").unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_iter_snapshots_every_bucket() {
        let map = ConcurrentChainedMap::with_capacity(8).unwrap();
        for i in 0..20 {
            map.insert(format!("key-{i}"), i);
        }

        let mut seen: Vec<i32> = map.iter().map(|(_, v)| v).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..20).collect::<Vec<i32>>());
    }

    #[test]
    fn test_clear() {
        let map = ConcurrentChainedMap::with_capacity(4).unwrap();
        map.insert("key1".to_string(), 1);
        map.insert("key2".to_string(), 2);

        map.clear();

        assert!(map.is_empty());
        assert_eq!(map.get("key1"), None);
        assert_eq!(map.capacity(), 4);
    }

    #[test]
    fn test_concurrent_inserts() {
        let map = Arc::new(ConcurrentChainedMap::new());
        let mut handles = vec![];

        // 8 threads, each inserting 100 distinct keys.
        for t in 0..8 {
            let map_clone = Arc::clone(&map);
            let handle = thread::spawn(move || {
                for i in 0..100 {
                    let key = format!("key-{t}-{i}");
                    let value = t * 100 + i;
                    map_clone.insert(key, value);
                }
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.join().unwrap();
        }

        // Per-bucket locking loses nothing: every insert must have landed.
        assert_eq!(map.len(), 800);
        for t in 0..8 {
            for i in 0..100 {
                let key = format!("key-{t}-{i}");
                assert_eq!(map.get(&key), Some(t * 100 + i));
            }
        }
    }

    #[test]
    fn test_concurrent_churn_on_one_bucket() {
        // Capacity 1 funnels every thread through the same chain, so insert
        // and remove on it must be strictly serialized.
        let map = Arc::new(ConcurrentChainedMap::with_capacity(1).unwrap());
        let mut handles = vec![];

        for t in 0..4 {
            let map_clone = Arc::clone(&map);
            let handle = thread::spawn(move || {
                for i in 0..50 {
                    let key = format!("key-{t}-{i}");
                    map_clone.insert(key.clone(), i);
                    assert_eq!(map_clone.remove(&key), Ok(i));
                }
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(map.is_empty());
    }

    #[test]
    fn test_concurrent_reads_writes_and_removes() {
        let map = Arc::new(ConcurrentChainedMap::new());

        // Preload some data.
        for i in 0..100 {
            map.insert(format!("key-{i}"), i);
        }

        let mut writer_handles = vec![];
        for t in 0..4 {
            let map_clone = Arc::clone(&map);
            writer_handles.push(thread::spawn(move || {
                for i in 0..50 {
                    map_clone.insert(format!("key-writer-{t}-{i}"), t * 100 + i);
                }
            }));
        }

        let mut reader_handles = vec![];
        for _ in 0..4 {
            let map_clone = Arc::clone(&map);
            reader_handles.push(thread::spawn(move || {
                let mut read_count = 0;
                for i in 0..100 {
                    if map_clone.get(&format!("key-{i}")).is_some() {
                        read_count += 1;
                    }
                }
                read_count
            }));
        }

        // Two removers split the preloaded range, so every removal succeeds
        // exactly once.
        let mut remover_handles = vec![];
        for t in 0..2usize {
            let map_clone = Arc::clone(&map);
            remover_handles.push(thread::spawn(move || {
                let mut remove_count = 0;
                for i in (t * 50)..((t + 1) * 50) {
                    if map_clone.remove(&format!("key-{i}")).is_ok() {
                        remove_count += 1;
                    }
                }
                remove_count
            }));
        }

        for handle in writer_handles {
            handle.join().unwrap();
        }
        let total_removed: usize =
            remover_handles.into_iter().map(|handle| handle.join().unwrap()).sum();
        // Readers race the removers, so each sees between 0 and 100 keys.
        let total_reads: i32 =
            reader_handles.into_iter().map(|handle| handle.join().unwrap()).sum();
        assert!(total_reads <= 400);

        assert_eq!(total_removed, 100);
        assert_eq!(map.len(), 100 + 200 - 100);
    }
}
