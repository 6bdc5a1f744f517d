//! Polynomial string hashing used to route keys to buckets.
//!
//! The map's whole collision story rests on this function being deterministic:
//! a key must land in the same bucket for the lifetime of a map, so the
//! accumulator is plain wrapping arithmetic with no per-process seed.

/// Multiplier for the Horner accumulation step, the classic K&R string hash
/// constant.
const MULTIPLIER: u32 = 31;

/// Folds a key's bytes into a single unsigned accumulator.
///
/// Starts at zero and applies `acc = byte + 31 * acc` for every byte in
/// order, wrapping on overflow. The empty string folds to `0`.
///
/// ```
/// use chainmap::hashing::fold_key;
///
/// assert_eq!(fold_key(""), 0);
/// assert_eq!(fold_key("a"), 97);
/// assert_eq!(fold_key("ab"), 97 * 31 + 98);
/// ```
#[must_use]
pub fn fold_key(key: &str) -> u32 {
    key.bytes()
        .fold(0u32, |acc, byte| u32::from(byte).wrapping_add(acc.wrapping_mul(MULTIPLIER)))
}

/// Maps a key to a bucket index in `[0, capacity)`.
///
/// Deterministic: the same key and capacity always produce the same index.
///
/// # Panics
///
/// Panics when `capacity` is zero. Both map constructors reject a zero bucket
/// count before a key can ever reach this function.
#[must_use]
#[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
pub fn bucket_index(key: &str, capacity: usize) -> usize {
    assert!(capacity > 0, "bucket count must be at least 1");
    (fold_key(key) as usize) % capacity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        for key in ["", "a", "alice", "a slightly longer key with spaces"] {
            let first = bucket_index(key, 10);
            for _ in 0..3 {
                assert_eq!(bucket_index(key, 10), first);
            }
        }
    }

    #[test]
    fn test_index_in_range() {
        for capacity in [1, 2, 7, 64, 1009] {
            for key in ["", "a", "bob", "0123456789", "collision-prone"] {
                assert!(bucket_index(key, capacity) < capacity);
            }
        }
    }

    #[test]
    fn test_empty_key_folds_to_zero() {
        assert_eq!(fold_key(""), 0);
        assert_eq!(bucket_index("", 17), 0);
    }

    #[test]
    fn test_known_accumulator_values() {
        // acc = byte + 31 * acc, left to right.
        assert_eq!(fold_key("a"), 97);
        assert_eq!(fold_key("ab"), 97 * 31 + 98);
        assert_eq!(fold_key("abc"), (97 * 31 + 98) * 31 + 99);
    }

    #[test]
    fn test_single_byte_change_moves_most_keys() {
        // Flipping one byte should usually land in a different bucket. Not
        // guaranteed per key, so assert over a batch.
        let capacity = 101;
        let moved = (0..50)
            .filter(|i| {
                let key = format!("prefix-{i}-suffix");
                let tweaked = format!("prefiy-{i}-suffix");
                bucket_index(&key, capacity) != bucket_index(&tweaked, capacity)
            })
            .count();
        assert!(moved > 35, "only {moved}/50 keys changed bucket");
    }

    #[test]
    fn test_long_key_wraps_instead_of_overflowing() {
        let key = "x".repeat(10_000);
        // Just has to terminate and stay in range.
        assert!(bucket_index(&key, 13) < 13);
    }

    #[test]
    #[should_panic(expected = "bucket count must be at least 1")]
    fn test_zero_capacity_panics() {
        let _ = bucket_index("key", 0);
    }
}
