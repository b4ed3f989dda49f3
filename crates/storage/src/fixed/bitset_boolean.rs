//! Boolean layout without a key ceiling

use super::{require_type, BitSet, SlotLayout};
use crate::converters::value_mismatch;
use annostore_core::{KeyManifest, LayerManifest, Result, Value, ValueType};

/// One bit set per item, sized to the key count
#[derive(Debug)]
pub struct BitSetBooleans {
    defaults: BitSet,
}

impl BitSetBooleans {
    pub fn defaults(&self) -> &BitSet {
        &self.defaults
    }
}

impl SlotLayout for BitSetBooleans {
    type Buffer = BitSet;

    const NAME: &'static str = "bit-set boolean storage";

    fn attach(layer: &LayerManifest, slots: &[&KeyManifest]) -> Result<Self> {
        require_type(layer, slots, ValueType::Boolean, Self::NAME)?;
        let defaults = slots
            .iter()
            .map(|k| k.no_entry_value().as_bool().unwrap_or(false))
            .collect();
        Ok(Self { defaults })
    }

    fn create_buffer(&self) -> BitSet {
        self.defaults.clone()
    }

    fn read(&self, buffer: &BitSet, slot: usize) -> Value {
        Value::Boolean(buffer.get(slot))
    }

    fn write(&self, buffer: &mut BitSet, slot: usize, value: &Value) -> Result<()> {
        let flag = value
            .as_bool()
            .ok_or_else(|| value_mismatch(ValueType::Boolean, value, "set_value"))?;
        buffer.set(slot, flag);
        Ok(())
    }

    fn is_set(&self, buffer: &BitSet, slot: usize) -> bool {
        buffer.get(slot) != self.defaults.get(slot)
    }

    fn is_default(&self, buffer: &BitSet) -> bool {
        *buffer == self.defaults
    }
}
