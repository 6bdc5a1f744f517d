//! Utility functions and traits for the chained map implementations

use crate::{ChainedMap, ConcurrentChainedMap};

/// Extension trait for map implementations that provides additional utility
/// methods
pub trait MapExtensions {
    /// Returns the keys of the map as a Vec, shadowed duplicates included
    fn keys(&self) -> Vec<String>;

    /// Returns the values of the map as a Vec
    fn values(&self) -> Vec<i32>;
}

impl MapExtensions for ChainedMap {
    fn keys(&self) -> Vec<String> {
        self.iter().map(|(key, _)| key.to_string()).collect()
    }

    fn values(&self) -> Vec<i32> {
        self.iter().map(|(_, &value)| value).collect()
    }
}

impl MapExtensions for ConcurrentChainedMap {
    fn keys(&self) -> Vec<String> {
        self.iter().map(|(key, _)| key).collect()
    }

    fn values(&self) -> Vec<i32> {
        self.iter().map(|(_, value)| value).collect()
    }
}

/// Creates a `ChainedMap` from an iterator of key-value pairs
#[allow(dead_code)]
pub fn from_iter<I>(iter: I) -> ChainedMap
where
    I: IntoIterator<Item = (String, i32)>,
{
    let mut map = ChainedMap::new();

    for (key, value) in iter {
        map.insert(key, value);
    }

    map
}
