//! Binary search lookup for small key sets

use super::{sorted_keys, IndexLookup};
use annostore_core::{AnnotationKey, Result};

/// Lookup over a sorted key array. No hashing, no extra allocation.
#[derive(Debug, Clone)]
pub struct BinarySearchLookup {
    keys: Vec<AnnotationKey>,
}

impl BinarySearchLookup {
    pub fn new<K>(keys: K) -> Result<Self>
    where
        K: IntoIterator,
        K::Item: Into<AnnotationKey>,
    {
        Ok(Self::from_sorted(sorted_keys(keys)?))
    }

    pub(crate) fn from_sorted(keys: Vec<AnnotationKey>) -> Self {
        debug_assert!(keys.windows(2).all(|w| w[0] < w[1]));
        Self { keys }
    }
}

impl IndexLookup for BinarySearchLookup {
    fn index_of(&self, key: &str) -> Option<usize> {
        self.keys.binary_search_by(|k| k.as_str().cmp(key)).ok()
    }

    fn key_count(&self) -> usize {
        self.keys.len()
    }

    fn key_at(&self, index: usize) -> Option<&AnnotationKey> {
        self.keys.get(index)
    }

    fn keys(&self) -> &[AnnotationKey] {
        &self.keys
    }
}
