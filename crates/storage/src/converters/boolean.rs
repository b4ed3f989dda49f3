//! Boolean converters: one bit or one byte per value

use super::{value_mismatch, ByteCursor, Converter};
use annostore_core::{Result, Value, ValueType};

/// Stores a boolean in the bit the cursor selects; the other seven bits of
/// the byte belong to other converters and are left untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct BitwiseBooleanConverter;

impl Converter for BitwiseBooleanConverter {
    fn value_type(&self) -> ValueType {
        ValueType::Boolean
    }

    fn size_in_bytes(&self) -> usize {
        0
    }

    fn size_in_bits(&self) -> usize {
        1
    }

    fn get_value(&self, cursor: &dyn ByteCursor) -> Result<Value> {
        self.get_boolean(cursor).map(Value::Boolean)
    }

    fn set_value(&self, cursor: &dyn ByteCursor, value: &Value) -> Result<()> {
        match value {
            Value::Boolean(v) => self.set_boolean(cursor, *v),
            other => Err(value_mismatch(ValueType::Boolean, other, "set_value")),
        }
    }

    fn get_boolean(&self, cursor: &dyn ByteCursor) -> Result<bool> {
        let mask = 1u8 << cursor.bit();
        Ok(cursor.get_byte(0) & mask != 0)
    }

    fn set_boolean(&self, cursor: &dyn ByteCursor, value: bool) -> Result<()> {
        let mask = 1u8 << cursor.bit();
        let byte = cursor.get_byte(0);
        let updated = if value { byte | mask } else { byte & !mask };
        cursor.set_byte(0, updated);
        Ok(())
    }
}

/// Literal byte values for true and false
const TRUE_BYTE: u8 = 1;
const FALSE_BYTE: u8 = 0;

/// Stores a boolean as a whole byte
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteBooleanConverter;

impl Converter for ByteBooleanConverter {
    fn value_type(&self) -> ValueType {
        ValueType::Boolean
    }

    fn size_in_bytes(&self) -> usize {
        1
    }

    fn get_value(&self, cursor: &dyn ByteCursor) -> Result<Value> {
        self.get_boolean(cursor).map(Value::Boolean)
    }

    fn set_value(&self, cursor: &dyn ByteCursor, value: &Value) -> Result<()> {
        match value {
            Value::Boolean(v) => self.set_boolean(cursor, *v),
            other => Err(value_mismatch(ValueType::Boolean, other, "set_value")),
        }
    }

    fn get_boolean(&self, cursor: &dyn ByteCursor) -> Result<bool> {
        Ok(cursor.get_byte(0) == TRUE_BYTE)
    }

    fn set_boolean(&self, cursor: &dyn ByteCursor, value: bool) -> Result<()> {
        cursor.set_byte(0, if value { TRUE_BYTE } else { FALSE_BYTE });
        Ok(())
    }
}
