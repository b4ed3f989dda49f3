//! Single-key boolean storage backed by a set of items

use super::KeyBinding;
use crate::traits::{not_attached, AnnotationStorage};
use annostore_core::{AnnotationKey, Error, Item, LayerManifest, Result, Value, ValueType};
use std::collections::HashSet;

/// Stores the set of items whose flag is `true`.
///
/// The no-entry value must be `false`: membership is the only state, so a
/// `true` default would leave nothing to store.
#[derive(Debug)]
pub struct SingleKeyBooleanStorage<I: Item> {
    capacity: usize,
    state: Option<BooleanState<I>>,
}

#[derive(Debug)]
struct BooleanState<I> {
    binding: KeyBinding,
    flagged: HashSet<I>,
}

impl<I: Item> SingleKeyBooleanStorage<I> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: None,
        }
    }

    /// Read the default key's flag
    pub fn get(&self, item: &I) -> Result<bool> {
        Ok(self.state()?.flagged.contains(item))
    }

    /// Write the default key's flag
    pub fn set(&mut self, item: &I, value: bool) -> Result<()> {
        self.state_mut()?.write(item, value);
        Ok(())
    }

    fn state(&self) -> Result<&BooleanState<I>> {
        self.state
            .as_ref()
            .ok_or_else(|| not_attached("single-key boolean storage"))
    }

    fn state_mut(&mut self) -> Result<&mut BooleanState<I>> {
        self.state
            .as_mut()
            .ok_or_else(|| not_attached("single-key boolean storage"))
    }

    fn checked(&self, key: &str) -> Result<&BooleanState<I>> {
        let state = self.state()?;
        state.binding.check_key(key)?;
        Ok(state)
    }

    fn checked_mut(&mut self, key: &str) -> Result<&mut BooleanState<I>> {
        let state = self.state_mut()?;
        state.binding.check_key(key)?;
        Ok(state)
    }

    fn reject_write(&self, key: &str, requested: ValueType, operation: &'static str) -> Result<()> {
        self.checked(key)?;
        Err(Error::type_mismatch(ValueType::Boolean, requested, operation))
    }

    fn reject_read<R>(&self, key: &str, requested: ValueType, operation: &'static str) -> Result<R> {
        self.checked(key)?;
        Err(Error::type_mismatch(ValueType::Boolean, requested, operation))
    }
}

impl<I: Item> BooleanState<I> {
    fn write(&mut self, item: &I, value: bool) {
        if value {
            self.flagged.insert(item.clone());
        } else {
            self.flagged.remove(item);
        }
    }
}

impl<I: Item> AnnotationStorage<I> for SingleKeyBooleanStorage<I> {
    fn add_notify(&mut self, layer: &LayerManifest) -> Result<()> {
        let binding = KeyBinding::resolve(layer, |t| t == ValueType::Boolean)?;
        if binding.no_entry != Value::Boolean(false) {
            return Err(Error::configuration(format!(
                "boolean key '{}' of layer '{}' declares no-entry value {}; only false is supported",
                binding.key, binding.layer, binding.no_entry
            )));
        }
        tracing::debug!(layer = layer.id(), key = %binding.key, "Attached single-key boolean storage");
        self.state = Some(BooleanState {
            binding,
            flagged: HashSet::with_capacity(self.capacity),
        });
        Ok(())
    }

    fn remove_notify(&mut self, layer: &LayerManifest) -> Result<()> {
        if self.state.take().is_some() {
            tracing::debug!(layer = layer.id(), "Detached single-key boolean storage");
        }
        Ok(())
    }

    fn get_value(&self, item: &I, key: &str) -> Result<Value> {
        self.get_boolean_value(item, key).map(Value::Boolean)
    }

    fn get_boolean_value(&self, item: &I, key: &str) -> Result<bool> {
        Ok(self.checked(key)?.flagged.contains(item))
    }

    fn get_integer_value(&self, _item: &I, key: &str) -> Result<i32> {
        self.reject_read(key, ValueType::Integer, "get_integer_value")
    }

    fn get_long_value(&self, _item: &I, key: &str) -> Result<i64> {
        self.reject_read(key, ValueType::Long, "get_long_value")
    }

    fn get_float_value(&self, _item: &I, key: &str) -> Result<f32> {
        self.reject_read(key, ValueType::Float, "get_float_value")
    }

    fn get_double_value(&self, _item: &I, key: &str) -> Result<f64> {
        self.reject_read(key, ValueType::Double, "get_double_value")
    }

    fn set_value(&mut self, item: &I, key: &str, value: Value) -> Result<()> {
        match value {
            Value::Boolean(flag) => self.set_boolean_value(item, key, flag),
            other => self.reject_write(
                key,
                other.value_type().unwrap_or(ValueType::Text),
                "set_value",
            ),
        }
    }

    fn set_boolean_value(&mut self, item: &I, key: &str, value: bool) -> Result<()> {
        self.checked_mut(key)?.write(item, value);
        Ok(())
    }

    fn set_integer_value(&mut self, _item: &I, key: &str, _value: i32) -> Result<()> {
        self.reject_write(key, ValueType::Integer, "set_integer_value")
    }

    fn set_long_value(&mut self, _item: &I, key: &str, _value: i64) -> Result<()> {
        self.reject_write(key, ValueType::Long, "set_long_value")
    }

    fn set_float_value(&mut self, _item: &I, key: &str, _value: f32) -> Result<()> {
        self.reject_write(key, ValueType::Float, "set_float_value")
    }

    fn set_double_value(&mut self, _item: &I, key: &str, _value: f64) -> Result<()> {
        self.reject_write(key, ValueType::Double, "set_double_value")
    }

    fn has_annotations(&self) -> bool {
        self.state.as_ref().is_some_and(|s| !s.flagged.is_empty())
    }

    fn has_annotations_for(&self, item: &I) -> bool {
        self.state.as_ref().is_some_and(|s| s.flagged.contains(item))
    }

    fn collect_keys(&self, item: &I, collector: &mut dyn FnMut(&AnnotationKey)) -> bool {
        match &self.state {
            Some(state) if state.flagged.contains(item) => {
                collector(&state.binding.key);
                true
            }
            _ => false,
        }
    }

    fn remove_all_values(&mut self) {
        if let Some(state) = &mut self.state {
            state.flagged.clear();
        }
    }

    fn remove_all_values_for_key(&mut self, key: &str) -> Result<()> {
        self.checked_mut(key)?.flagged.clear();
        Ok(())
    }

    fn remove_all_values_for_items(&mut self, items: &[I]) {
        if let Some(state) = &mut self.state {
            for item in items {
                state.flagged.remove(item);
            }
        }
    }

    fn add_item(&mut self, _item: &I) -> bool {
        false
    }

    fn remove_item(&mut self, item: &I) -> bool {
        self.state.as_mut().is_some_and(|s| s.flagged.remove(item))
    }

    fn contains_item(&self, item: &I) -> bool {
        self.has_annotations_for(item)
    }
}
