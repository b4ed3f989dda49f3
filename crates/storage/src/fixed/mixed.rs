//! Heterogeneous layout: primitives in mutable cells, text as values

use super::SlotLayout;
use crate::converters::value_mismatch;
use annostore_core::{KeyManifest, LayerManifest, Result, Value, ValueType};

/// One slot of a mixed buffer.
///
/// Primitive slots keep their cell for the buffer's lifetime and are
/// overwritten in place; reference slots hold the value itself.
#[derive(Debug, Clone)]
pub enum Cell {
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Object(Value),
}

impl Cell {
    fn for_value(value: &Value, primitive: bool) -> Cell {
        if !primitive {
            return Cell::Object(value.clone());
        }
        match value {
            Value::Boolean(v) => Cell::Boolean(*v),
            Value::Integer(v) => Cell::Integer(*v),
            Value::Long(v) => Cell::Long(*v),
            Value::Float(v) => Cell::Float(*v),
            Value::Double(v) => Cell::Double(*v),
            other => Cell::Object(other.clone()),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Cell::Boolean(v) => Value::Boolean(*v),
            Cell::Integer(v) => Value::Integer(*v),
            Cell::Long(v) => Value::Long(*v),
            Cell::Float(v) => Value::Float(*v),
            Cell::Double(v) => Value::Double(*v),
            Cell::Object(v) => v.clone(),
        }
    }

    /// Overwrite in place; `false` if `value` does not match the cell's kind
    fn assign(&mut self, value: &Value) -> bool {
        match (self, value) {
            (Cell::Boolean(slot), Value::Boolean(v)) => *slot = *v,
            (Cell::Integer(slot), Value::Integer(v)) => *slot = *v,
            (Cell::Long(slot), Value::Long(v)) => *slot = *v,
            (Cell::Float(slot), Value::Float(v)) => *slot = *v,
            (Cell::Double(slot), Value::Double(v)) => *slot = *v,
            (Cell::Object(slot), v) => *slot = v.clone(),
            _ => return false,
        }
        true
    }

    fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Cell::Boolean(a), Value::Boolean(b)) => a == b,
            (Cell::Integer(a), Value::Integer(b)) => a == b,
            (Cell::Long(a), Value::Long(b)) => a == b,
            (Cell::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Cell::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Cell::Object(a), b) => a == b,
            _ => false,
        }
    }
}

/// Any combination of declared types
#[derive(Debug)]
pub struct MixedSlots {
    primitive: Box<[bool]>,
    defaults: Box<[Value]>,
    value_types: Box<[ValueType]>,
}

impl MixedSlots {
    /// Which slots hold primitive cells
    pub fn primitive_mask(&self) -> &[bool] {
        &self.primitive
    }
}

impl SlotLayout for MixedSlots {
    type Buffer = Box<[Cell]>;

    const NAME: &'static str = "mixed storage";

    fn attach(_layer: &LayerManifest, slots: &[&KeyManifest]) -> Result<Self> {
        Ok(Self {
            primitive: slots.iter().map(|k| k.value_type().is_primitive()).collect(),
            defaults: slots.iter().map(|k| k.no_entry_value()).collect(),
            value_types: slots.iter().map(|k| k.value_type()).collect(),
        })
    }

    fn create_buffer(&self) -> Box<[Cell]> {
        self.defaults
            .iter()
            .zip(self.primitive.iter())
            .map(|(value, &primitive)| Cell::for_value(value, primitive))
            .collect()
    }

    fn read(&self, buffer: &Box<[Cell]>, slot: usize) -> Value {
        buffer[slot].to_value()
    }

    fn write(&self, buffer: &mut Box<[Cell]>, slot: usize, value: &Value) -> Result<()> {
        if buffer[slot].assign(value) {
            Ok(())
        } else {
            Err(value_mismatch(self.value_types[slot], value, "set_value"))
        }
    }

    fn is_set(&self, buffer: &Box<[Cell]>, slot: usize) -> bool {
        !buffer[slot].matches(&self.defaults[slot])
    }

    fn is_default(&self, buffer: &Box<[Cell]>) -> bool {
        buffer
            .iter()
            .zip(self.defaults.iter())
            .all(|(cell, default)| cell.matches(default))
    }
}
