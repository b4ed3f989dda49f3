//! Converters between typed annotation values and byte regions
//!
//! A converter knows its value type and how many bytes (or, for sub-byte
//! converters, bits) it occupies. Its byte offset inside a chunk is assigned
//! externally by whoever packs several converters together; the converter
//! itself only ever sees a cursor already positioned at that offset.
//!
//! Typed accessors that do not match the declared type fail with a
//! type-mismatch error instead of coercing.

mod boolean;
mod cursor;
mod numeric;
mod substitute;

pub use boolean::{BitwiseBooleanConverter, ByteBooleanConverter};
pub use cursor::{ByteBuffer, ByteCursor, SliceCursor};
pub use numeric::{DoubleConverter, FloatConverter, IntConverter, LongConverter};
pub use substitute::SubstitutingConverter;

pub(crate) use cursor::zeroed;

use annostore_core::{Error, Result, Value, ValueType};
use std::fmt::Debug;

/// Encode/decode strategy between one value type and a byte region
pub trait Converter: Send + Sync + Debug {
    fn value_type(&self) -> ValueType;

    /// Bytes occupied; zero for sub-byte converters
    fn size_in_bytes(&self) -> usize;

    /// Bits occupied
    fn size_in_bits(&self) -> usize {
        self.size_in_bytes() * 8
    }

    fn get_value(&self, cursor: &dyn ByteCursor) -> Result<Value>;

    fn set_value(&self, cursor: &dyn ByteCursor, value: &Value) -> Result<()>;

    fn get_boolean(&self, _cursor: &dyn ByteCursor) -> Result<bool> {
        Err(unsupported(self.value_type(), ValueType::Boolean, "get_boolean"))
    }

    fn set_boolean(&self, _cursor: &dyn ByteCursor, _value: bool) -> Result<()> {
        Err(unsupported(self.value_type(), ValueType::Boolean, "set_boolean"))
    }

    fn get_integer(&self, _cursor: &dyn ByteCursor) -> Result<i32> {
        Err(unsupported(self.value_type(), ValueType::Integer, "get_integer"))
    }

    fn set_integer(&self, _cursor: &dyn ByteCursor, _value: i32) -> Result<()> {
        Err(unsupported(self.value_type(), ValueType::Integer, "set_integer"))
    }

    fn get_long(&self, _cursor: &dyn ByteCursor) -> Result<i64> {
        Err(unsupported(self.value_type(), ValueType::Long, "get_long"))
    }

    fn set_long(&self, _cursor: &dyn ByteCursor, _value: i64) -> Result<()> {
        Err(unsupported(self.value_type(), ValueType::Long, "set_long"))
    }

    fn get_float(&self, _cursor: &dyn ByteCursor) -> Result<f32> {
        Err(unsupported(self.value_type(), ValueType::Float, "get_float"))
    }

    fn set_float(&self, _cursor: &dyn ByteCursor, _value: f32) -> Result<()> {
        Err(unsupported(self.value_type(), ValueType::Float, "set_float"))
    }

    fn get_double(&self, _cursor: &dyn ByteCursor) -> Result<f64> {
        Err(unsupported(self.value_type(), ValueType::Double, "get_double"))
    }

    fn set_double(&self, _cursor: &dyn ByteCursor, _value: f64) -> Result<()> {
        Err(unsupported(self.value_type(), ValueType::Double, "set_double"))
    }

    /// Raw substitute access for converters that store substitutes
    fn as_substituting(&self) -> Option<&SubstitutingConverter> {
        None
    }
}

pub(crate) fn unsupported(own: ValueType, requested: ValueType, operation: &'static str) -> Error {
    Error::type_mismatch(own, requested, operation)
}

/// Type-mismatch error for a generic value of the wrong variant
pub(crate) fn value_mismatch(own: ValueType, value: &Value, operation: &'static str) -> Error {
    Error::type_mismatch(own, value.value_type().unwrap_or(ValueType::Text), operation)
}
