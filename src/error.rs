//! Error type shared by both map implementations.

use thiserror::Error;

/// Errors produced by map construction and keyed operations.
///
/// Absent keys are a normal control-flow outcome, not an exceptional one:
/// `update` and `remove` report them through [`MapError::KeyNotFound`] so a
/// caller can recover without having to check for the key first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// A map cannot be built with zero buckets; every operation routes keys
    /// through `hash % capacity`, so the bucket count must stay positive.
    #[error("capacity must be at least 1")]
    ZeroCapacity,

    /// The key is not present in the map.
    #[error("key `{0}` not found")]
    KeyNotFound(String),
}
