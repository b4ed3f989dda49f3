//! Key → slot resolution for fixed key sets
//!
//! Both implementations sort the key set lexicographically and use a key's
//! rank as its slot. They differ only in how `index_of` finds that rank, so
//! the choice between them is purely a matter of key count.

mod binary;
mod hashed;

pub use binary::BinarySearchLookup;
pub use hashed::HashLookup;

use annostore_core::{AnnotationKey, Error, Result};
use std::sync::Arc;

/// Immutable snapshot of a layer's key set
pub trait IndexLookup: Send + Sync + std::fmt::Debug {
    /// Slot of `key`, or `None` if the key is not part of the set
    fn index_of(&self, key: &str) -> Option<usize>;

    fn key_count(&self) -> usize;

    /// Key stored at `index`; `None` past the end
    fn key_at(&self, index: usize) -> Option<&AnnotationKey>;

    /// All keys in slot order
    fn keys(&self) -> &[AnnotationKey];
}

/// Build the lookup best suited for `keys`.
///
/// Sets with at most `hash_threshold` keys get a [`BinarySearchLookup`],
/// larger ones a [`HashLookup`]. Duplicate keys are rejected.
pub fn build_lookup<K>(keys: K, hash_threshold: usize) -> Result<Arc<dyn IndexLookup>>
where
    K: IntoIterator,
    K::Item: Into<AnnotationKey>,
{
    let sorted = sorted_keys(keys)?;
    if sorted.len() <= hash_threshold {
        Ok(Arc::new(BinarySearchLookup::from_sorted(sorted)))
    } else {
        Ok(Arc::new(HashLookup::from_sorted(sorted)))
    }
}

/// Collect, validate and sort a key set
pub(crate) fn sorted_keys<K>(keys: K) -> Result<Vec<AnnotationKey>>
where
    K: IntoIterator,
    K::Item: Into<AnnotationKey>,
{
    let mut sorted: Vec<AnnotationKey> = keys.into_iter().map(Into::into).collect();
    sorted.sort();
    if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(Error::configuration(format!(
            "duplicate annotation key '{}' in lookup",
            pair[0]
        )));
    }
    Ok(sorted)
}

/// Resolve `key` or fail with an invalid-key error listing the whole set
pub fn check_key(lookup: &dyn IndexLookup, key: &str) -> Result<usize> {
    lookup
        .index_of(key)
        .ok_or_else(|| Error::invalid_key(key, lookup.keys()))
}
