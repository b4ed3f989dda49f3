//! One `i32` slot per key

use super::{require_type, SlotLayout};
use crate::converters::value_mismatch;
use annostore_core::{KeyManifest, LayerManifest, Result, Value, ValueType};

/// Integer-only layout; every key must be declared `integer`
#[derive(Debug)]
pub struct IntArray {
    defaults: Box<[i32]>,
}

impl SlotLayout for IntArray {
    type Buffer = Box<[i32]>;

    const NAME: &'static str = "int array storage";

    fn attach(layer: &LayerManifest, slots: &[&KeyManifest]) -> Result<Self> {
        require_type(layer, slots, ValueType::Integer, Self::NAME)?;
        let defaults = slots
            .iter()
            .map(|k| k.no_entry_value().as_i32().unwrap_or(0))
            .collect();
        Ok(Self { defaults })
    }

    fn create_buffer(&self) -> Box<[i32]> {
        self.defaults.clone()
    }

    fn read(&self, buffer: &Box<[i32]>, slot: usize) -> Value {
        Value::Integer(buffer[slot])
    }

    fn write(&self, buffer: &mut Box<[i32]>, slot: usize, value: &Value) -> Result<()> {
        buffer[slot] = value
            .as_i32()
            .ok_or_else(|| value_mismatch(ValueType::Integer, value, "set_value"))?;
        Ok(())
    }

    fn is_set(&self, buffer: &Box<[i32]>, slot: usize) -> bool {
        buffer[slot] != self.defaults[slot]
    }

    fn is_default(&self, buffer: &Box<[i32]>) -> bool {
        *buffer == self.defaults
    }
}
