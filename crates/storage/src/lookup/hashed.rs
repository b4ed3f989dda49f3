//! Hash based lookup for larger key sets

use super::{sorted_keys, IndexLookup};
use annostore_core::{AnnotationKey, Result};
use std::collections::HashMap;

/// Lookup through a key → slot hash map; slots are still assigned by sort rank
#[derive(Debug, Clone)]
pub struct HashLookup {
    keys: Vec<AnnotationKey>,
    slots: HashMap<AnnotationKey, usize>,
}

impl HashLookup {
    pub fn new<K>(keys: K) -> Result<Self>
    where
        K: IntoIterator,
        K::Item: Into<AnnotationKey>,
    {
        Ok(Self::from_sorted(sorted_keys(keys)?))
    }

    pub(crate) fn from_sorted(keys: Vec<AnnotationKey>) -> Self {
        let slots = keys
            .iter()
            .enumerate()
            .map(|(slot, key)| (key.clone(), slot))
            .collect();
        Self { keys, slots }
    }
}

impl IndexLookup for HashLookup {
    fn index_of(&self, key: &str) -> Option<usize> {
        self.slots.get(key).copied()
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
