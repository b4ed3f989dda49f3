//! Handle table: where each registered key lives inside a chunk

use crate::converters::Converter;
use annostore_core::{AnnotationKey, Value};
use std::fmt;
use std::sync::Arc;

/// Opaque reference to one key registered against a packed manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u32);

impl Handle {
    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a storage asks the manager to reserve for one key
#[derive(Debug, Clone)]
pub struct HandleSpec {
    pub key: AnnotationKey,
    pub converter: Arc<dyn Converter>,
    pub default: Value,
}

impl HandleSpec {
    pub fn new(key: impl Into<AnnotationKey>, converter: Arc<dyn Converter>, default: Value) -> Self {
        Self {
            key: key.into(),
            converter,
            default,
        }
    }
}

/// A live handle's placement inside every chunk
#[derive(Debug, Clone)]
pub struct HandleEntry {
    pub layer: String,
    pub key: AnnotationKey,
    pub converter: Arc<dyn Converter>,
    pub default: Value,
    pub offset: usize,
    pub bit: u8,
}

impl HandleEntry {
    /// One past the last byte this entry touches
    pub fn end(&self) -> usize {
        self.offset + self.converter.size_in_bytes().max(1)
    }
}

/// Immutable snapshot of every handle ever issued; released ids stay empty
#[derive(Debug, Clone, Default)]
pub(crate) struct HandleTable {
    entries: Vec<Option<HandleEntry>>,
    chunk_size: usize,
}

impl HandleTable {
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[inline]
    pub fn get(&self, handle: Handle) -> Option<&HandleEntry> {
        self.entries.get(handle.0 as usize)?.as_ref()
    }

    pub fn live(&self) -> impl Iterator<Item = (Handle, &HandleEntry)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(id, entry)| entry.as_ref().map(|e| (Handle(id as u32), e)))
    }

    pub fn live_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Append `specs` and lay out every live handle again.
    ///
    /// Byte-sized converters get consecutive byte ranges in registration
    /// order; sub-byte converters are packed bit by bit into the bytes that
    /// follow.
    pub fn with_added(&self, layer: &str, specs: Vec<HandleSpec>) -> (HandleTable, Vec<Handle>) {
        let mut entries = self.entries.clone();
        let mut issued = Vec::with_capacity(specs.len());
        for spec in specs {
            issued.push(Handle(entries.len() as u32));
            entries.push(Some(HandleEntry {
                layer: layer.to_string(),
                key: spec.key,
                converter: spec.converter,
                default: spec.default,
                offset: 0,
                bit: 0,
            }));
        }
        let chunk_size = assign_offsets(&mut entries);
        (HandleTable { entries, chunk_size }, issued)
    }

    /// Drop `handles`; every other placement stays where it is
    pub fn without(&self, handles: &[Handle]) -> HandleTable {
        let mut entries = self.entries.clone();
        for handle in handles {
            if let Some(entry) = entries.get_mut(handle.0 as usize) {
                *entry = None;
            }
        }
        HandleTable {
            entries,
            chunk_size: self.chunk_size,
        }
    }
}

fn assign_offsets(entries: &mut [Option<HandleEntry>]) -> usize {
    let mut next_byte = 0;
    for entry in entries.iter_mut().flatten() {
        let size = entry.converter.size_in_bytes();
        if size > 0 {
            entry.offset = next_byte;
            entry.bit = 0;
            next_byte += size;
        }
    }

    let mut next_bit = 0usize;
    for entry in entries.iter_mut().flatten() {
        if entry.converter.size_in_bytes() == 0 {
            entry.offset = next_byte + next_bit / 8;
            entry.bit = (next_bit % 8) as u8;
            next_bit += entry.converter.size_in_bits().max(1);
        }
    }
    next_byte + next_bit.div_ceil(8)
}
