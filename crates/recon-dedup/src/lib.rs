//! Normalization and deduplication (C4): pure functions that turn raw tool
//! output into the canonical keys the rest of the pipeline dedups on.

pub mod hostname;
pub mod path;

use std::collections::HashSet;
use std::hash::Hash;

use sha2::{Digest, Sha256};

pub use hostname::{normalize_hostname, HostnameError};
pub use path::normalize_path;

/// Deduplicate `items` by `key_fn`, preserving first occurrence per key.
pub fn dedup_by_key<T, K, F>(items: Vec<T>, key_fn: F) -> Vec<T>
where
    F: Fn(&T) -> K,
    K: Eq + Hash,
{
    let mut seen = HashSet::new();
    let mut result = Vec::with_capacity(items.len());
    for item in items {
        let key = key_fn(&item);
        if seen.insert(key) {
            result.push(item);
        }
    }
    result
}

/// SHA-256 of the UTF-8 bytes of `content`, hex-encoded, for body dedup.
pub fn hash_content(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_by_key_keeps_first_occurrence() {
        let items = vec![("a", 1), ("b", 2), ("a", 3)];
        let result = dedup_by_key(items, |(k, _)| *k);
        assert_eq!(result, vec![("a", 1), ("b", 2)]);
    }

    #[test]
    fn hash_content_is_stable() {
        let h1 = hash_content("hello");
        let h2 = hash_content("hello");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }
}
