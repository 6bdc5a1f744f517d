//! # Chained Map
//!
//! A Rust implementation of a hash table with a fixed bucket count and
//! separate chaining.
//!
//! This crate provides two hash map implementations:
//!
//! - `ChainedMap`: a single-threaded implementation for exclusive ownership
//! - `ConcurrentChainedMap`: a thread-safe implementation with one lock per
//!   bucket
//!
//! Both map `String` keys to `i32` values, route keys with a deterministic
//! polynomial hash, and resolve collisions with a singly-linked chain per
//! bucket. The bucket count is chosen at construction and never changes:
//! there is no resizing and no rehashing, so a key's bucket is stable for
//! the map's lifetime.
//!
//! One deliberate quirk to be aware of: inserting a key that already exists
//! does not replace the old entry. The new entry lands at the head of the
//! chain and *shadows* the old one, which re-surfaces once the newer entry
//! is removed.
//!
//! ## Basic Usage
//!
//! ```rust
//! use chainmap::ChainedMap;
//!
//! // Create a new map
//! let mut map = ChainedMap::new();
//!
//! // Insert values
//! map.insert("apple".to_string(), 1);
//! map.insert("banana".to_string(), 2);
//!
//! // Retrieve values
//! assert_eq!(map.get("apple"), Some(&1));
//!
//! // Update in place; the previous value comes back
//! assert_eq!(map.update("apple", 10), Ok(1));
//! assert_eq!(map.get("apple"), Some(&10));
//!
//! // Inserting an existing key shadows it instead of replacing it
//! map.insert("banana".to_string(), 20);
//! assert_eq!(map.get("banana"), Some(&20));
//! assert_eq!(map.remove("banana"), Ok(20));
//! assert_eq!(map.get("banana"), Some(&2));
//! ```
//!
//! ## Fixed Capacity
//!
//! ```rust
//! use chainmap::{ChainedMap, MapError};
//!
//! // The bucket count is fixed at construction, and zero is rejected
//! let map = ChainedMap::with_capacity(10)?;
//! assert_eq!(map.capacity(), 10);
//! assert_eq!(ChainedMap::with_capacity(0).err(), Some(MapError::ZeroCapacity));
//! # Ok::<(), MapError>(())
//! ```
//!
//! ## Concurrent Usage
//!
//! ```rust
//! use chainmap::ConcurrentChainedMap;
//! use std::sync::Arc;
//! use std::thread;
//!
//! // Create a shared map
//! let map = Arc::new(ConcurrentChainedMap::new());
//!
//! // Clone references for different threads
//! let map1 = Arc::clone(&map);
//! let map2 = Arc::clone(&map);
//!
//! // Spawn threads that modify the map concurrently
//! let t1 = thread::spawn(move || {
//!     for i in 0..100 {
//!         map1.insert(format!("key-{i}"), i);
//!     }
//! });
//!
//! let t2 = thread::spawn(move || {
//!     for i in 100..200 {
//!         map2.insert(format!("key-{i}"), i);
//!     }
//! });
//!
//! // Wait for threads to complete
//! t1.join().unwrap();
//! t2.join().unwrap();
//!
//! // Each bucket is guarded by its own lock, so every insert lands
//! assert_eq!(map.len(), 200);
//! ```

/// Module implementing the single-threaded chained hash map
mod chained_map;
/// Module implementing the thread-safe chained hash map with per-bucket locks
mod concurrent_chained_map;
/// Error type shared by both map implementations
mod error;
/// The deterministic string-to-bucket hashing function
pub mod hashing;
/// Utility functions and traits for the maps
mod utils;

pub use chained_map::ChainedMap;
pub use concurrent_chained_map::ConcurrentChainedMap;
pub use error::MapError;
pub use utils::MapExtensions;
