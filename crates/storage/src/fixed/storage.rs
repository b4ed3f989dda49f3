//! `AnnotationStorage` over any fixed-keys layout

use super::{FixedKeysBase, SlotLayout};
use crate::traits::{not_attached, AnnotationStorage};
use annostore_core::{AnnotationKey, Error, Item, LayerManifest, Result, Value, ValueType};

/// Item → fixed buffer storage, parameterised by buffer layout.
///
/// Not synchronised; callers serialise access.
#[derive(Debug)]
pub struct FixedKeysStorage<I: Item, L: SlotLayout> {
    capacity: usize,
    hash_lookup_threshold: usize,
    base: Option<FixedKeysBase<I, L>>,
}

impl<I: Item, L: SlotLayout> FixedKeysStorage<I, L> {
    /// `capacity` pre-sizes the item map; `hash_lookup_threshold` picks
    /// between binary-search and hashed key lookup
    pub fn new(capacity: usize, hash_lookup_threshold: usize) -> Self {
        Self {
            capacity,
            hash_lookup_threshold,
            base: None,
        }
    }

    /// Attached state, for callers that need slot-level access
    pub fn base(&self) -> Option<&FixedKeysBase<I, L>> {
        self.base.as_ref()
    }

    fn attached(&self) -> Result<&FixedKeysBase<I, L>> {
        self.base.as_ref().ok_or_else(|| not_attached(L::NAME))
    }

    fn attached_mut(&mut self) -> Result<&mut FixedKeysBase<I, L>> {
        self.base.as_mut().ok_or_else(|| not_attached(L::NAME))
    }

    fn read_as<R>(
        &self,
        item: &I,
        key: &str,
        requested: ValueType,
        operation: &'static str,
        extract: fn(&Value) -> Option<R>,
    ) -> Result<R> {
        let base = self.attached()?;
        let slot = base.check_key_and_get_index(key)?;
        let declared = base.value_type(slot);
        if !declared.widens_to(requested) {
            return Err(Error::type_mismatch(declared, requested, operation));
        }
        extract(&base.read(item, slot)).ok_or_else(|| Error::type_mismatch(declared, requested, operation))
    }

    fn write_checked(&mut self, item: &I, key: &str, value: Value, operation: &'static str) -> Result<()> {
        let base = self.attached_mut()?;
        let slot = base.check_key_and_get_index(key)?;
        let declared = base.value_type(slot);
        if !value.fits(declared) {
            return Err(Error::type_mismatch(
                declared,
                value.value_type().unwrap_or(ValueType::Text),
                operation,
            ));
        }
        base.write(item, slot, &value)
    }
}

impl<I: Item, L: SlotLayout> AnnotationStorage<I> for FixedKeysStorage<I, L> {
    fn add_notify(&mut self, layer: &LayerManifest) -> Result<()> {
        let base = FixedKeysBase::attach(layer, self.capacity, self.hash_lookup_threshold)?;
        tracing::debug!(
            layer = layer.id(),
            keys = base.lookup().key_count(),
            variant = L::NAME,
            "Attached fixed-keys storage"
        );
        self.base = Some(base);
        Ok(())
    }

    fn remove_notify(&mut self, layer: &LayerManifest) -> Result<()> {
        if self.base.take().is_some() {
            tracing::debug!(layer = layer.id(), variant = L::NAME, "Detached fixed-keys storage");
        }
        Ok(())
    }

    fn get_value(&self, item: &I, key: &str) -> Result<Value> {
        let base = self.attached()?;
        let slot = base.check_key_and_get_index(key)?;
        Ok(base.read(item, slot))
    }

    fn get_boolean_value(&self, item: &I, key: &str) -> Result<bool> {
        self.read_as(item, key, ValueType::Boolean, "get_boolean_value", Value::as_bool)
    }

    fn get_integer_value(&self, item: &I, key: &str) -> Result<i32> {
        self.read_as(item, key, ValueType::Integer, "get_integer_value", Value::as_i32)
    }

    fn get_long_value(&self, item: &I, key: &str) -> Result<i64> {
        self.read_as(item, key, ValueType::Long, "get_long_value", Value::as_i64)
    }

    fn get_float_value(&self, item: &I, key: &str) -> Result<f32> {
        self.read_as(item, key, ValueType::Float, "get_float_value", Value::as_f32)
    }

    fn get_double_value(&self, item: &I, key: &str) -> Result<f64> {
        self.read_as(item, key, ValueType::Double, "get_double_value", Value::as_f64)
    }

    fn set_value(&mut self, item: &I, key: &str, value: Value) -> Result<()> {
        self.write_checked(item, key, value, "set_value")
    }

    fn set_boolean_value(&mut self, item: &I, key: &str, value: bool) -> Result<()> {
        self.write_checked(item, key, Value::Boolean(value), "set_boolean_value")
    }

    fn set_integer_value(&mut self, item: &I, key: &str, value: i32) -> Result<()> {
        self.write_checked(item, key, Value::Integer(value), "set_integer_value")
    }

    fn set_long_value(&mut self, item: &I, key: &str, value: i64) -> Result<()> {
        let base = self.attached()?;
        let slot = base.check_key_and_get_index(key)?;
        if base.value_type(slot) == ValueType::Integer {
            let narrowed = i32::try_from(value).map_err(|_| Error::overflow(key, value, ValueType::Integer))?;
            return self.write_checked(item, key, Value::Integer(narrowed), "set_long_value");
        }
        self.write_checked(item, key, Value::Long(value), "set_long_value")
    }

    fn set_float_value(&mut self, item: &I, key: &str, value: f32) -> Result<()> {
        self.write_checked(item, key, Value::Float(value), "set_float_value")
    }

    fn set_double_value(&mut self, item: &I, key: &str, value: f64) -> Result<()> {
        self.write_checked(item, key, Value::Double(value), "set_double_value")
    }

    fn has_annotations(&self) -> bool {
        self.base.as_ref().is_some_and(FixedKeysBase::any_annotated)
    }

    fn has_annotations_for(&self, item: &I) -> bool {
        self.base.as_ref().is_some_and(|b| b.is_annotated(item))
    }

    fn collect_keys(&self, item: &I, collector: &mut dyn FnMut(&AnnotationKey)) -> bool {
        self.base
            .as_ref()
            .is_some_and(|b| b.collect_keys(item, collector))
    }

    fn remove_all_values(&mut self) {
        if let Some(base) = &mut self.base {
            base.clear();
        }
    }

    fn remove_all_values_for_key(&mut self, key: &str) -> Result<()> {
        let base = self.attached_mut()?;
        let slot = base.check_key_and_get_index(key)?;
        base.reset_slot(slot)
    }

    fn remove_all_values_for_items(&mut self, items: &[I]) {
        if let Some(base) = &mut self.base {
            for item in items {
                base.remove(item);
            }
        }
    }

    fn add_item(&mut self, item: &I) -> bool {
        match &mut self.base {
            Some(base) if !base.contains(item) => {
                base.get_buffer(item, true);
                true
            }
            _ => false,
        }
    }

    fn remove_item(&mut self, item: &I) -> bool {
        self.base.as_mut().is_some_and(|b| b.remove(item))
    }

    fn contains_item(&self, item: &I) -> bool {
        self.base.as_ref().is_some_and(|b| b.contains(item))
    }
}
