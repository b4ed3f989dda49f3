//! Generic converter packing an open value space into 1-4 bytes

use super::{unsupported, ByteCursor, Converter};
use annostore_core::{Error, Result, Value, ValueType};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type Substitute = dyn Fn(&Value) -> Option<u32> + Send + Sync;
type Resubstitute = dyn Fn(u32) -> Option<Value> + Send + Sync;

/// Maps values to small unsigned integers ("substitutes") and back through
/// caller-supplied functions, storing only the substitute.
///
/// The caller owns the enumeration: substitutes must stay stable for as long
/// as the stored bytes are read.
#[derive(Clone)]
pub struct SubstitutingConverter {
    value_type: ValueType,
    width: usize,
    substitute: Arc<Substitute>,
    resubstitute: Arc<Resubstitute>,
}

impl SubstitutingConverter {
    /// `width` is the number of bytes per substitute and must be 1 to 4
    pub fn new<S, R>(value_type: ValueType, width: usize, substitute: S, resubstitute: R) -> Result<Self>
    where
        S: Fn(&Value) -> Option<u32> + Send + Sync + 'static,
        R: Fn(u32) -> Option<Value> + Send + Sync + 'static,
    {
        if !(1..=4).contains(&width) {
            return Err(Error::configuration(format!(
                "substituting converter width must be 1 to 4 bytes, got {width}"
            )));
        }
        Ok(Self {
            value_type,
            width,
            substitute: Arc::new(substitute),
            resubstitute: Arc::new(resubstitute),
        })
    }

    /// Build a converter for a closed enumeration.
    ///
    /// `no_entry` gets substitute 0 so that a zeroed region reads as absent;
    /// `values` follow in order. The width is the smallest that fits.
    pub fn from_enumeration(value_type: ValueType, no_entry: Value, values: &[Value]) -> Result<Self> {
        let mut table = Vec::with_capacity(values.len() + 1);
        table.push(no_entry);
        for value in values {
            if !table.contains(value) {
                table.push(value.clone());
            }
        }

        let max_substitute = table.len() - 1;
        let width = width_for(max_substitute as u64).ok_or_else(|| {
            Error::configuration(format!(
                "enumeration of {} values does not fit into 4 bytes",
                table.len()
            ))
        })?;

        let index: HashMap<Value, u32> = table
            .iter()
            .enumerate()
            .map(|(i, v)| (v.clone(), i as u32))
            .collect();
        let table: Arc<[Value]> = table.into();

        Self::new(
            value_type,
            width,
            move |value| index.get(value).copied(),
            move |substitute| table.get(substitute as usize).cloned(),
        )
    }

    /// Largest substitute the configured width can hold
    pub fn max_substitute(&self) -> u32 {
        if self.width >= 4 {
            u32::MAX
        } else {
            (1u32 << (self.width * 8)) - 1
        }
    }

    /// Read the stored substitute without resolving it
    pub fn get_raw(&self, cursor: &dyn ByteCursor) -> u32 {
        let mut bytes = [0u8; 4];
        for (i, b) in bytes.iter_mut().take(self.width).enumerate() {
            *b = cursor.get_byte(i);
        }
        u32::from_le_bytes(bytes)
    }

    /// Store a substitute directly; fails if it exceeds the width or does
    /// not map back to a value
    pub fn set_raw(&self, cursor: &dyn ByteCursor, substitute: u32) -> Result<()> {
        if substitute > self.max_substitute() {
            return Err(Error::overflow(
                "substitute",
                i64::from(substitute),
                self.value_type,
            ));
        }
        if (self.resubstitute)(substitute).is_none() {
            return Err(Error::configuration(format!(
                "substitute {substitute} does not map to a {} value",
                self.value_type
            )));
        }
        for (i, b) in substitute.to_le_bytes().into_iter().take(self.width).enumerate() {
            cursor.set_byte(i, b);
        }
        Ok(())
    }

    fn typed_get(&self, cursor: &dyn ByteCursor, requested: ValueType, operation: &'static str) -> Result<Value> {
        if self.value_type != requested {
            return Err(unsupported(self.value_type, requested, operation));
        }
        self.get_value(cursor)
    }

    fn typed_set(&self, cursor: &dyn ByteCursor, value: Value, operation: &'static str) -> Result<()> {
        match value.value_type() {
            Some(requested) if requested != self.value_type => {
                Err(unsupported(self.value_type, requested, operation))
            }
            _ => self.set_value(cursor, &value),
        }
    }
}

impl fmt::Debug for SubstitutingConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubstitutingConverter")
            .field("value_type", &self.value_type)
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

impl Converter for SubstitutingConverter {
    fn as_substituting(&self) -> Option<&SubstitutingConverter> {
        Some(self)
    }

    fn value_type(&self) -> ValueType {
        self.value_type
    }

    fn size_in_bytes(&self) -> usize {
        self.width
    }

    fn get_value(&self, cursor: &dyn ByteCursor) -> Result<Value> {
        let raw = self.get_raw(cursor);
        (self.resubstitute)(raw).ok_or_else(|| {
            Error::configuration(format!("substitute {raw} does not map to a {} value", self.value_type))
        })
    }

    fn set_value(&self, cursor: &dyn ByteCursor, value: &Value) -> Result<()> {
        let raw = (self.substitute)(value).ok_or_else(|| {
            Error::configuration(format!("value {value} has no substitute in this enumeration"))
        })?;
        self.set_raw(cursor, raw)
    }

    fn get_boolean(&self, cursor: &dyn ByteCursor) -> Result<bool> {
        let value = self.typed_get(cursor, ValueType::Boolean, "get_boolean")?;
        value
            .as_bool()
            .ok_or_else(|| unsupported(self.value_type, ValueType::Boolean, "get_boolean"))
    }

    fn set_boolean(&self, cursor: &dyn ByteCursor, value: bool) -> Result<()> {
        self.typed_set(cursor, Value::Boolean(value), "set_boolean")
    }

    fn get_integer(&self, cursor: &dyn ByteCursor) -> Result<i32> {
        let value = self.typed_get(cursor, ValueType::Integer, "get_integer")?;
        value
            .as_i32()
            .ok_or_else(|| unsupported(self.value_type, ValueType::Integer, "get_integer"))
    }

    fn set_integer(&self, cursor: &dyn ByteCursor, value: i32) -> Result<()> {
        self.typed_set(cursor, Value::Integer(value), "set_integer")
    }

    fn get_long(&self, cursor: &dyn ByteCursor) -> Result<i64> {
        let value = self.typed_get(cursor, ValueType::Long, "get_long")?;
        value
            .as_i64()
            .ok_or_else(|| unsupported(self.value_type, ValueType::Long, "get_long"))
    }

    fn set_long(&self, cursor: &dyn ByteCursor, value: i64) -> Result<()> {
        self.typed_set(cursor, Value::Long(value), "set_long")
    }

    fn get_float(&self, cursor: &dyn ByteCursor) -> Result<f32> {
        match self.typed_get(cursor, ValueType::Float, "get_float")? {
            Value::Float(v) => Ok(v),
            _ => Err(unsupported(self.value_type, ValueType::Float, "get_float")),
        }
    }

    fn set_float(&self, cursor: &dyn ByteCursor, value: f32) -> Result<()> {
        self.typed_set(cursor, Value::Float(value), "set_float")
    }

    fn get_double(&self, cursor: &dyn ByteCursor) -> Result<f64> {
        match self.typed_get(cursor, ValueType::Double, "get_double")? {
            Value::Double(v) => Ok(v),
            _ => Err(unsupported(self.value_type, ValueType::Double, "get_double")),
        }
    }

    fn set_double(&self, cursor: &dyn ByteCursor, value: f64) -> Result<()> {
        self.typed_set(cursor, Value::Double(value), "set_double")
    }
}

/// Smallest byte width (1-4) able to store `max`
fn width_for(max: u64) -> Option<usize> {
    match max {
        0..=0xFF => Some(1),
        0x100..=0xFFFF => Some(2),
        0x1_0000..=0xFF_FFFF => Some(3),
        0x100_0000..=0xFFFF_FFFF => Some(4),
        _ => None,
    }
}
