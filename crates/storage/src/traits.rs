//! The capability set every storage strategy exposes

use annostore_core::{AnnotationKey, Item, LayerManifest, Result, Value};

/// Storage of annotation values for the items of one layer.
///
/// Readers return the key's no-entry value for items that were never
/// annotated. Writing the no-entry value removes the stored entry, so a
/// storage never holds more entries than there are non-default annotations.
///
/// Resources are built in [`add_notify`](Self::add_notify) and released in
/// [`remove_notify`](Self::remove_notify); each is called exactly once per
/// attachment.
pub trait AnnotationStorage<I: Item>: Send + Sync {
    /// Build per-layer resources from the layer's manifest
    fn add_notify(&mut self, layer: &LayerManifest) -> Result<()>;

    /// Release everything built in `add_notify`
    fn remove_notify(&mut self, layer: &LayerManifest) -> Result<()>;

    fn get_value(&self, item: &I, key: &str) -> Result<Value>;

    fn get_boolean_value(&self, item: &I, key: &str) -> Result<bool>;

    fn get_integer_value(&self, item: &I, key: &str) -> Result<i32>;

    fn get_long_value(&self, item: &I, key: &str) -> Result<i64>;

    fn get_float_value(&self, item: &I, key: &str) -> Result<f32>;

    fn get_double_value(&self, item: &I, key: &str) -> Result<f64>;

    fn set_value(&mut self, item: &I, key: &str, value: Value) -> Result<()>;

    fn set_boolean_value(&mut self, item: &I, key: &str, value: bool) -> Result<()>;

    fn set_integer_value(&mut self, item: &I, key: &str, value: i32) -> Result<()>;

    fn set_long_value(&mut self, item: &I, key: &str, value: i64) -> Result<()>;

    fn set_float_value(&mut self, item: &I, key: &str, value: f32) -> Result<()>;

    fn set_double_value(&mut self, item: &I, key: &str, value: f64) -> Result<()>;

    /// Whether any item carries a non-default value
    fn has_annotations(&self) -> bool;

    /// Whether `item` carries a non-default value for any key
    fn has_annotations_for(&self, item: &I) -> bool;

    /// Report every key whose value for `item` differs from its default.
    /// Returns whether at least one key was reported.
    fn collect_keys(&self, item: &I, collector: &mut dyn FnMut(&AnnotationKey)) -> bool;

    /// Drop every stored value
    fn remove_all_values(&mut self);

    /// Reset one key to its default for every item
    fn remove_all_values_for_key(&mut self, key: &str) -> Result<()>;

    /// Drop every value stored for the given items
    fn remove_all_values_for_items(&mut self, items: &[I]);

    /// Materialise storage for `item`. Returns `false` if it was already present
    fn add_item(&mut self, item: &I) -> bool;

    /// Evict `item`. Returns whether anything was removed
    fn remove_item(&mut self, item: &I) -> bool;

    fn contains_item(&self, item: &I) -> bool;

    /// Convenience wrapper around [`collect_keys`](Self::collect_keys)
    fn annotated_keys(&self, item: &I) -> Vec<AnnotationKey> {
        let mut keys = Vec::new();
        self.collect_keys(item, &mut |key| keys.push(key.clone()));
        keys
    }
}

/// Error returned when a storage is used before `add_notify` or after `remove_notify`
pub(crate) fn not_attached(storage: &'static str) -> annostore_core::Error {
    annostore_core::Error::configuration(format!("{storage} is not attached to a layer"))
}
