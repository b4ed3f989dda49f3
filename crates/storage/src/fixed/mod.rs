//! Fixed-keys storages: layers with a statically known key set
//!
//! Every item owns one fixed-size buffer with a slot per declared key. Slots
//! are assigned by an [`IndexLookup`] built at attach time. The variants
//! differ only in how a buffer is laid out, which is what [`SlotLayout`]
//! captures:
//! - [`PackedBooleanStorage`]: up to 31 booleans in one `u32`
//! - [`BitSetBooleanStorage`]: any number of booleans in a bit set
//! - [`IntArrayStorage`]: one `i32` per key
//! - [`MixedStorage`]: any declared types, primitives held in mutable cells

mod bitset;
mod bitset_boolean;
mod int_array;
mod mixed;
mod packed_boolean;
mod storage;

pub use bitset::BitSet;
pub use bitset_boolean::BitSetBooleans;
pub use int_array::IntArray;
pub use mixed::{Cell, MixedSlots};
pub use packed_boolean::{PackedBooleans, MAX_PACKED_KEYS};
pub use storage::FixedKeysStorage;

use crate::lookup::{build_lookup, IndexLookup};
use annostore_core::{AnnotationKey, Error, Item, KeyManifest, LayerManifest, Result, Value, ValueType};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

pub type PackedBooleanStorage<I> = FixedKeysStorage<I, PackedBooleans>;
pub type BitSetBooleanStorage<I> = FixedKeysStorage<I, BitSetBooleans>;
pub type IntArrayStorage<I> = FixedKeysStorage<I, IntArray>;
pub type MixedStorage<I> = FixedKeysStorage<I, MixedSlots>;

/// Buffer layout of one fixed-keys variant.
///
/// Values handed to [`write`](Self::write) have already been checked
/// against the slot's declared type.
pub trait SlotLayout: Sized + Send + Sync + Debug + 'static {
    type Buffer: Send + Sync + Debug;

    /// Human-readable variant name used in logs and errors
    const NAME: &'static str;

    /// Validate the declarations (in slot order) and build the layout
    fn attach(layer: &LayerManifest, slots: &[&KeyManifest]) -> Result<Self>;

    /// A buffer holding every slot's default
    fn create_buffer(&self) -> Self::Buffer;

    fn read(&self, buffer: &Self::Buffer, slot: usize) -> Value;

    fn write(&self, buffer: &mut Self::Buffer, slot: usize, value: &Value) -> Result<()>;

    /// Whether `slot` differs from its default
    fn is_set(&self, buffer: &Self::Buffer, slot: usize) -> bool;

    /// Whether every slot holds its default
    fn is_default(&self, buffer: &Self::Buffer) -> bool;
}

/// State shared by every fixed-keys variant once attached
#[derive(Debug)]
pub struct FixedKeysBase<I, L: SlotLayout> {
    layer: String,
    lookup: Arc<dyn IndexLookup>,
    value_types: Vec<ValueType>,
    defaults: Vec<Value>,
    layout: L,
    default_buffer: L::Buffer,
    buffers: HashMap<I, L::Buffer>,
}

impl<I: Item, L: SlotLayout> FixedKeysBase<I, L> {
    pub fn attach(layer: &LayerManifest, capacity: usize, hash_lookup_threshold: usize) -> Result<Self> {
        layer.validate()?;
        let lookup = build_lookup(layer.keys().iter().map(|k| k.key().clone()), hash_lookup_threshold)?;
        let slots = lookup
            .keys()
            .iter()
            .map(|key| {
                layer.key(key).ok_or_else(|| {
                    Error::configuration(format!("key '{key}' vanished from layer '{}'", layer.id()))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let layout = L::attach(layer, &slots)?;
        let default_buffer = layout.create_buffer();
        Ok(Self {
            layer: layer.id().to_string(),
            value_types: slots.iter().map(|k| k.value_type()).collect(),
            defaults: slots.iter().map(|k| k.no_entry_value()).collect(),
            lookup,
            layout,
            default_buffer,
            buffers: HashMap::with_capacity(capacity),
        })
    }

    pub fn lookup(&self) -> &dyn IndexLookup {
        self.lookup.as_ref()
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    pub fn value_type(&self, slot: usize) -> ValueType {
        self.value_types[slot]
    }

    pub fn default_value(&self, slot: usize) -> &Value {
        &self.defaults[slot]
    }

    /// Resolve `key` to its slot or fail with an invalid-key error
    pub fn check_key_and_get_index(&self, key: &str) -> Result<usize> {
        self.lookup
            .index_of(key)
            .ok_or_else(|| Error::invalid_key(key, self.lookup.keys()).in_layer(self.layer.as_str()))
    }

    pub fn create_buffer(&self) -> L::Buffer {
        self.layout.create_buffer()
    }

    /// Buffer of `item`; items without one read the all-defaults buffer
    pub fn buffer(&self, item: &I) -> &L::Buffer {
        self.buffers.get(item).unwrap_or(&self.default_buffer)
    }

    /// Buffer of `item`, materialised from defaults when asked to
    pub fn get_buffer(&mut self, item: &I, create_if_absent: bool) -> &L::Buffer {
        if create_if_absent && !self.buffers.contains_key(item) {
            let buffer = self.layout.create_buffer();
            self.buffers.insert(item.clone(), buffer);
        }
        self.buffers.get(item).unwrap_or(&self.default_buffer)
    }

    /// Current value of `slot` for `item`
    pub fn read(&self, item: &I, slot: usize) -> Value {
        self.layout.read(self.buffer(item), slot)
    }

    /// Write a type-checked value, dropping the buffer once it is all defaults
    pub fn write(&mut self, item: &I, slot: usize, value: &Value) -> Result<()> {
        let is_default = *value == self.defaults[slot];
        if is_default && !self.buffers.contains_key(item) {
            return Ok(());
        }
        let layout = &self.layout;
        if !self.buffers.contains_key(item) {
            self.buffers.insert(item.clone(), layout.create_buffer());
        }
        let Some(buffer) = self.buffers.get_mut(item) else {
            return Ok(());
        };
        layout.write(buffer, slot, value)?;
        if is_default && layout.is_default(buffer) {
            self.buffers.remove(item);
        }
        Ok(())
    }

    /// Report every key of `item` whose slot differs from its default
    pub fn collect_keys(&self, item: &I, collector: &mut dyn FnMut(&AnnotationKey)) -> bool {
        let Some(buffer) = self.buffers.get(item) else {
            return false;
        };
        let mut found = false;
        for (slot, key) in self.lookup.keys().iter().enumerate() {
            if self.layout.is_set(buffer, slot) {
                collector(key);
                found = true;
            }
        }
        found
    }

    pub fn is_annotated(&self, item: &I) -> bool {
        self.buffers
            .get(item)
            .is_some_and(|buffer| !self.layout.is_default(buffer))
    }

    pub fn any_annotated(&self) -> bool {
        self.buffers.values().any(|buffer| !self.layout.is_default(buffer))
    }

    /// Reset `slot` to its default for every item
    pub fn reset_slot(&mut self, slot: usize) -> Result<()> {
        let default = self.defaults[slot].clone();
        let layout = &self.layout;
        let mut emptied = Vec::new();
        for (item, buffer) in self.buffers.iter_mut() {
            if layout.is_set(buffer, slot) {
                layout.write(buffer, slot, &default)?;
                if layout.is_default(buffer) {
                    emptied.push(item.clone());
                }
            }
        }
        for item in &emptied {
            self.buffers.remove(item);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.buffers.clear();
    }

    pub fn remove(&mut self, item: &I) -> bool {
        self.buffers.remove(item).is_some()
    }

    pub fn contains(&self, item: &I) -> bool {
        self.buffers.contains_key(item)
    }

    pub fn layer_id(&self) -> &str {
        &self.layer
    }
}

/// Fail unless every declared key is of `expected` type
pub(crate) fn require_type(
    layer: &LayerManifest,
    slots: &[&KeyManifest],
    expected: ValueType,
    variant: &str,
) -> Result<()> {
    match slots.iter().find(|k| k.value_type() != expected) {
        Some(bad) => Err(Error::configuration(format!(
            "{variant} requires {expected} keys, but key '{}' of layer '{}' is declared {}",
            bad.key(),
            layer.id(),
            bad.value_type()
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests;
