//! Up to 31 booleans packed into one integer per item

use super::{require_type, SlotLayout};
use crate::converters::value_mismatch;
use annostore_core::{Error, KeyManifest, LayerManifest, Result, Value, ValueType};

/// Widest key set the packed layout accepts; the sign bit stays unused
pub const MAX_PACKED_KEYS: usize = 31;

/// Bit `slot` of the packed word holds the value of key `slot`.
///
/// Keys may individually default to `true`, so "annotated" means the word
/// differs from the all-defaults pattern, not that it is non-zero.
#[derive(Debug)]
pub struct PackedBooleans {
    pattern: u32,
}

impl PackedBooleans {
    /// Packed word of an item carrying no annotations
    pub fn pattern(&self) -> u32 {
        self.pattern
    }
}

impl SlotLayout for PackedBooleans {
    type Buffer = u32;

    const NAME: &'static str = "31-bit packed boolean storage";

    fn attach(layer: &LayerManifest, slots: &[&KeyManifest]) -> Result<Self> {
        if slots.len() > MAX_PACKED_KEYS {
            return Err(Error::capacity_exceeded(layer.id(), slots.len(), MAX_PACKED_KEYS));
        }
        require_type(layer, slots, ValueType::Boolean, Self::NAME)?;
        let pattern = slots
            .iter()
            .enumerate()
            .filter(|(_, k)| k.no_entry_value().as_bool().unwrap_or(false))
            .fold(0u32, |acc, (slot, _)| acc | (1 << slot));
        Ok(Self { pattern })
    }

    fn create_buffer(&self) -> u32 {
        self.pattern
    }

    #[inline]
    fn read(&self, buffer: &u32, slot: usize) -> Value {
        Value::Boolean((*buffer >> slot) & 1 == 1)
    }

    #[inline]
    fn write(&self, buffer: &mut u32, slot: usize, value: &Value) -> Result<()> {
        let flag = value
            .as_bool()
            .ok_or_else(|| value_mismatch(ValueType::Boolean, value, "set_value"))?;
        if flag {
            *buffer |= 1 << slot;
        } else {
            *buffer &= !(1 << slot);
        }
        Ok(())
    }

    #[inline]
    fn is_set(&self, buffer: &u32, slot: usize) -> bool {
        ((*buffer ^ self.pattern) >> slot) & 1 == 1
    }

    fn is_default(&self, buffer: &u32) -> bool {
        *buffer == self.pattern
    }
}
