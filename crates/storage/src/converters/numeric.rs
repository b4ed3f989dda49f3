//! Fixed-width numeric converters
//!
//! Floating point values are stored through their IEEE-754 bit patterns in
//! the equally wide integer slot, so every value (NaN payloads and signed
//! zeros included) reads back bit-identical.

use super::{value_mismatch, ByteCursor, Converter};
use annostore_core::{Result, Value, ValueType};

/// 4-byte signed integer
#[derive(Debug, Clone, Copy, Default)]
pub struct IntConverter;

impl Converter for IntConverter {
    fn value_type(&self) -> ValueType {
        ValueType::Integer
    }

    fn size_in_bytes(&self) -> usize {
        4
    }

    fn get_value(&self, cursor: &dyn ByteCursor) -> Result<Value> {
        self.get_integer(cursor).map(Value::Integer)
    }

    fn set_value(&self, cursor: &dyn ByteCursor, value: &Value) -> Result<()> {
        match value {
            Value::Integer(v) => self.set_integer(cursor, *v),
            other => Err(value_mismatch(ValueType::Integer, other, "set_value")),
        }
    }

    fn get_integer(&self, cursor: &dyn ByteCursor) -> Result<i32> {
        Ok(cursor.get_u32(0) as i32)
    }

    fn set_integer(&self, cursor: &dyn ByteCursor, value: i32) -> Result<()> {
        cursor.set_u32(0, value as u32);
        Ok(())
    }
}

/// 8-byte signed integer
#[derive(Debug, Clone, Copy, Default)]
pub struct LongConverter;

impl Converter for LongConverter {
    fn value_type(&self) -> ValueType {
        ValueType::Long
    }

    fn size_in_bytes(&self) -> usize {
        8
    }

    fn get_value(&self, cursor: &dyn ByteCursor) -> Result<Value> {
        self.get_long(cursor).map(Value::Long)
    }

    fn set_value(&self, cursor: &dyn ByteCursor, value: &Value) -> Result<()> {
        match value {
            Value::Long(v) => self.set_long(cursor, *v),
            other => Err(value_mismatch(ValueType::Long, other, "set_value")),
        }
    }

    fn get_long(&self, cursor: &dyn ByteCursor) -> Result<i64> {
        Ok(cursor.get_u64(0) as i64)
    }

    fn set_long(&self, cursor: &dyn ByteCursor, value: i64) -> Result<()> {
        cursor.set_u64(0, value as u64);
        Ok(())
    }
}

/// 4-byte IEEE-754 single precision
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatConverter;

impl Converter for FloatConverter {
    fn value_type(&self) -> ValueType {
        ValueType::Float
    }

    fn size_in_bytes(&self) -> usize {
        4
    }

    fn get_value(&self, cursor: &dyn ByteCursor) -> Result<Value> {
        self.get_float(cursor).map(Value::Float)
    }

    fn set_value(&self, cursor: &dyn ByteCursor, value: &Value) -> Result<()> {
        match value {
            Value::Float(v) => self.set_float(cursor, *v),
            other => Err(value_mismatch(ValueType::Float, other, "set_value")),
        }
    }

    fn get_float(&self, cursor: &dyn ByteCursor) -> Result<f32> {
        Ok(f32::from_bits(cursor.get_u32(0)))
    }

    fn set_float(&self, cursor: &dyn ByteCursor, value: f32) -> Result<()> {
        cursor.set_u32(0, value.to_bits());
        Ok(())
    }
}

/// 8-byte IEEE-754 double precision
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleConverter;

impl Converter for DoubleConverter {
    fn value_type(&self) -> ValueType {
        ValueType::Double
    }

    fn size_in_bytes(&self) -> usize {
        8
    }

    fn get_value(&self, cursor: &dyn ByteCursor) -> Result<Value> {
        self.get_double(cursor).map(Value::Double)
    }

    fn set_value(&self, cursor: &dyn ByteCursor, value: &Value) -> Result<()> {
        match value {
            Value::Double(v) => self.set_double(cursor, *v),
            other => Err(value_mismatch(ValueType::Double, other, "set_value")),
        }
    }

    fn get_double(&self, cursor: &dyn ByteCursor) -> Result<f64> {
        Ok(f64::from_bits(cursor.get_u64(0)))
    }

    fn set_double(&self, cursor: &dyn ByteCursor, value: f64) -> Result<()> {
        cursor.set_u64(0, value.to_bits());
        Ok(())
    }
}
