//! Single-key storage for numeric and object values

use super::KeyBinding;
use crate::traits::{not_attached, AnnotationStorage};
use annostore_core::{AnnotationKey, Error, Item, LayerManifest, Result, Value, ValueType};
use std::collections::HashMap;
use std::fmt::Debug;

/// A value representation a single-key storage can hold unboxed
pub trait Scalar: Clone + Send + Sync + Debug + 'static {
    /// Whether keys declared as `value_type` can be stored
    fn accepts(value_type: ValueType) -> bool;

    /// Convert from a value already checked against the declared type
    fn from_value(value: &Value) -> Option<Self>;

    fn to_value(&self) -> Value;
}

impl Scalar for i32 {
    fn accepts(value_type: ValueType) -> bool {
        value_type == ValueType::Integer
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_i32()
    }

    fn to_value(&self) -> Value {
        Value::Integer(*self)
    }
}

impl Scalar for i64 {
    fn accepts(value_type: ValueType) -> bool {
        value_type == ValueType::Long
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Long(*self)
    }
}

impl Scalar for f32 {
    fn accepts(value_type: ValueType) -> bool {
        value_type == ValueType::Float
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl Scalar for f64 {
    fn accepts(value_type: ValueType) -> bool {
        value_type == ValueType::Double
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Double(*self)
    }
}

/// Object storage holds any declared type boxed as a `Value`
impl Scalar for Value {
    fn accepts(_value_type: ValueType) -> bool {
        true
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }

    fn to_value(&self) -> Value {
        self.clone()
    }
}

/// Item → value map for one declared key.
///
/// Not synchronised; callers serialise access.
#[derive(Debug)]
pub struct SingleKeyStorage<I: Item, T: Scalar> {
    capacity: usize,
    state: Option<ScalarState<I, T>>,
}

#[derive(Debug)]
struct ScalarState<I, T> {
    binding: KeyBinding,
    values: HashMap<I, T>,
}

impl<I: Item, T: Scalar> SingleKeyStorage<I, T> {
    /// `capacity` pre-sizes the backing map at attach time
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: None,
        }
    }

    /// The key this storage answers to, once attached
    pub fn default_key(&self) -> Option<&AnnotationKey> {
        self.state.as_ref().map(|s| &s.binding.key)
    }

    /// Read the default key's value
    pub fn get(&self, item: &I) -> Result<Value> {
        let state = self.state()?;
        Ok(state.read(item))
    }

    /// Write the default key's value
    pub fn set(&mut self, item: &I, value: Value) -> Result<()> {
        let state = self.state_mut()?;
        state.binding.check_write(&value, "set")?;
        state.write(item, value);
        Ok(())
    }

    fn state(&self) -> Result<&ScalarState<I, T>> {
        self.state.as_ref().ok_or_else(|| not_attached("single-key storage"))
    }

    fn state_mut(&mut self) -> Result<&mut ScalarState<I, T>> {
        self.state.as_mut().ok_or_else(|| not_attached("single-key storage"))
    }

    fn read_as<R>(
        &self,
        item: &I,
        key: &str,
        requested: ValueType,
        operation: &'static str,
        extract: fn(&Value) -> Option<R>,
    ) -> Result<R> {
        let state = self.state()?;
        state.binding.check_key(key)?;
        state.binding.check_read(requested, operation)?;
        extract(&state.read(item))
            .ok_or_else(|| Error::type_mismatch(state.binding.value_type, requested, operation))
    }

    fn write_checked(&mut self, item: &I, key: &str, value: Value, operation: &'static str) -> Result<()> {
        let state = self.state_mut()?;
        state.binding.check_key(key)?;
        state.binding.check_write(&value, operation)?;
        state.write(item, value);
        Ok(())
    }
}

impl<I: Item, T: Scalar> ScalarState<I, T> {
    fn read(&self, item: &I) -> Value {
        self.values
            .get(item)
            .map(Scalar::to_value)
            .unwrap_or_else(|| self.binding.no_entry.clone())
    }

    fn write(&mut self, item: &I, value: Value) {
        if value == self.binding.no_entry {
            self.values.remove(item);
            return;
        }
        // check_write already rejected values of other types
        if let Some(stored) = T::from_value(&value) {
            self.values.insert(item.clone(), stored);
        }
    }
}

impl<I: Item, T: Scalar> AnnotationStorage<I> for SingleKeyStorage<I, T> {
    fn add_notify(&mut self, layer: &LayerManifest) -> Result<()> {
        let binding = KeyBinding::resolve(layer, T::accepts)?;
        if T::from_value(&binding.no_entry).is_none() {
            return Err(Error::configuration(format!(
                "no-entry value {} of key '{}' cannot be held by this storage",
                binding.no_entry, binding.key
            )));
        }
        tracing::debug!(
            layer = layer.id(),
            key = %binding.key,
            value_type = %binding.value_type,
            "Attached single-key storage"
        );
        self.state = Some(ScalarState {
            binding,
            values: HashMap::with_capacity(self.capacity),
        });
        Ok(())
    }

    fn remove_notify(&mut self, layer: &LayerManifest) -> Result<()> {
        if self.state.take().is_some() {
            tracing::debug!(layer = layer.id(), "Detached single-key storage");
        }
        Ok(())
    }

    fn get_value(&self, item: &I, key: &str) -> Result<Value> {
        let state = self.state()?;
        state.binding.check_key(key)?;
        Ok(state.read(item))
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
        let state = self.state()?;
        if state.binding.value_type == ValueType::Integer {
            state.binding.check_key(key)?;
            let narrowed = i32::try_from(value)
                .map_err(|_| Error::overflow(key, value, ValueType::Integer))?;
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
        self.state.as_ref().is_some_and(|s| !s.values.is_empty())
    }

    fn has_annotations_for(&self, item: &I) -> bool {
        self.state.as_ref().is_some_and(|s| s.values.contains_key(item))
    }

    fn collect_keys(&self, item: &I, collector: &mut dyn FnMut(&AnnotationKey)) -> bool {
        match &self.state {
            Some(state) if state.values.contains_key(item) => {
                collector(&state.binding.key);
                true
            }
            _ => false,
        }
    }

    fn remove_all_values(&mut self) {
        if let Some(state) = &mut self.state {
            state.values.clear();
        }
    }

    fn remove_all_values_for_key(&mut self, key: &str) -> Result<()> {
        let state = self.state_mut()?;
        state.binding.check_key(key)?;
        state.values.clear();
        Ok(())
    }

    fn remove_all_values_for_items(&mut self, items: &[I]) {
        if let Some(state) = &mut self.state {
            for item in items {
                state.values.remove(item);
            }
        }
    }

    /// Entries materialise on the first non-default write, so there is
    /// nothing to add up front
    fn add_item(&mut self, _item: &I) -> bool {
        false
    }

    fn remove_item(&mut self, item: &I) -> bool {
        self.state
            .as_mut()
            .is_some_and(|s| s.values.remove(item).is_some())
    }

    fn contains_item(&self, item: &I) -> bool {
        self.has_annotations_for(item)
    }
}
