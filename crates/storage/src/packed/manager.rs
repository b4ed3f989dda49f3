//! Shared packed arena serving every key registered against it

use super::arena::ChunkArena;
use super::layout::{Handle, HandleEntry, HandleSpec, HandleTable};
use super::lock::StampedLock;
use crate::config::StorageConfig;
use crate::converters::{ByteCursor, SliceCursor, SubstitutingConverter};
use annostore_core::{Error, Item, Result, Value, ValueType};
use arc_swap::ArcSwap;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

/// Chunk slots handed out to items; freed slots are reused first
#[derive(Debug, Default)]
struct SlotAllocator {
    free: Vec<usize>,
    next: usize,
}

impl SlotAllocator {
    fn allocate(&mut self) -> usize {
        self.free.pop().unwrap_or_else(|| {
            let slot = self.next;
            self.next += 1;
            slot
        })
    }

    fn release(&mut self, slot: usize) {
        self.free.push(slot);
    }

    /// Slots ever handed out
    fn high_water(&self) -> usize {
        self.next
    }
}

/// One growable byte arena shared by many layers.
///
/// Keys are registered as [`Handle`]s, each owning a fixed bit/byte range
/// inside every item's chunk. Items are registered once for the whole
/// manager and own one chunk each.
///
/// Mutations take the exclusive mode of a [`StampedLock`]. Reads resolve
/// handle, chunk and bytes optimistically and fall back to the pessimistic
/// mode if a writer intervened. An item without a chunk, or whose chunk
/// address points outside the arena snapshot being read, yields the key's
/// default instead of an error.
#[derive(Debug)]
pub struct PackedDataManager<I: Item> {
    page_size: usize,
    lock: StampedLock,
    use_count: AtomicUsize,
    handles: ArcSwap<HandleTable>,
    arena: ArcSwap<ChunkArena>,
    items: DashMap<I, usize>,
    allocator: Mutex<SlotAllocator>,
}

impl<I: Item> PackedDataManager<I> {
    /// `page_size` is the byte size of each arena page
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            lock: StampedLock::new(),
            use_count: AtomicUsize::new(0),
            handles: ArcSwap::from_pointee(HandleTable::default()),
            arena: ArcSwap::from_pointee(ChunkArena::new(page_size, 0)),
            items: DashMap::new(),
            allocator: Mutex::new(SlotAllocator::default()),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.packed_page_size)
    }

    /// Count one more attached storage; the first builds fresh state
    pub fn add_notify(&self, layer: &str) {
        let _guard = self.lock.write();
        if self.use_count.fetch_add(1, Ordering::AcqRel) == 0 {
            self.reset_state();
            tracing::debug!(layer, page_size = self.page_size, "Created packed arena");
        }
    }

    /// Count one storage less; the last tears the state down
    pub fn remove_notify(&self, layer: &str) {
        let _guard = self.lock.write();
        let count = self.use_count.load(Ordering::Acquire);
        if count == 0 {
            return;
        }
        self.use_count.store(count - 1, Ordering::Release);
        if count == 1 {
            self.reset_state();
            tracing::debug!(layer, "Tore down packed arena");
        }
    }

    /// Number of storages currently attached
    pub fn use_count(&self) -> usize {
        self.use_count.load(Ordering::Acquire)
    }

    fn reset_state(&self) {
        self.items.clear();
        *self.allocator.lock() = SlotAllocator::default();
        self.handles.store(Arc::new(HandleTable::default()));
        self.arena.store(Arc::new(ChunkArena::new(self.page_size, 0)));
    }

    /// Reserve room for `specs` in every chunk.
    ///
    /// Existing chunks are re-laid out: live values are copied to their new
    /// placement and the new keys start at their defaults.
    pub fn register_handles(&self, layer: &str, specs: Vec<HandleSpec>) -> Result<Vec<Handle>> {
        let _guard = self.lock.write();
        if self.use_count.load(Ordering::Acquire) == 0 {
            return Err(Error::configuration(format!(
                "packed manager has no attached storage; cannot register keys of layer '{layer}'"
            )));
        }

        let old_table = self.handles.load_full();
        let old_arena = self.arena.load_full();
        let (table, issued) = old_table.with_added(layer, specs);

        let slots = self.allocator.lock().high_water();
        let arena = ChunkArena::new(self.page_size, table.chunk_size()).grown_to(slots);
        for entry in self.items.iter() {
            let slot = *entry.value();
            let Some(target) = arena.chunk(slot) else {
                continue;
            };
            let source = old_arena.chunk(slot);
            for (handle, placed) in table.live() {
                match (old_table.get(handle), source) {
                    (Some(previous), Some(source)) => copy_placement(source, previous, target, placed),
                    _ => {
                        if let Some(cursor) = cursor_at(&arena, slot, placed) {
                            placed.converter.set_value(&cursor, &placed.default)?;
                        }
                    }
                }
            }
        }

        if !self.items.is_empty() {
            tracing::info!(
                layer,
                items = self.items.len(),
                old_chunk_size = old_table.chunk_size(),
                new_chunk_size = table.chunk_size(),
                "Relaid out packed arena"
            );
        }
        tracing::debug!(layer, handles = issued.len(), chunk_size = table.chunk_size(), "Registered packed keys");

        self.handles.store(Arc::new(table));
        self.arena.store(Arc::new(arena));
        Ok(issued)
    }

    /// Give up `handles`; their bytes stay reserved until the arena is torn down
    pub fn release_handles(&self, handles: &[Handle]) {
        let _guard = self.lock.write();
        let table = self.handles.load().without(handles);
        self.handles.store(Arc::new(table));
    }

    /// Placement of a live handle
    pub fn handle_entry(&self, handle: Handle) -> Option<HandleEntry> {
        self.handles.load().get(handle).cloned()
    }

    /// Bytes per item chunk under the current layout
    pub fn chunk_size(&self) -> usize {
        self.handles.load().chunk_size()
    }

    pub fn handle_count(&self) -> usize {
        self.handles.load().live_count()
    }

    /// Allocate a chunk for `item`, initialised with every key's default.
    /// Returns `false` if the item already has one.
    pub fn register(&self, item: &I) -> Result<bool> {
        let _guard = self.lock.write();
        if self.items.contains_key(item) {
            return Ok(false);
        }
        self.register_locked(item)?;
        Ok(true)
    }

    /// Free the chunk of `item`. Returns whether it had one
    pub fn unregister(&self, item: &I) -> bool {
        let _guard = self.lock.write();
        self.unregister_locked(item)
    }

    /// Put `item` back to the defaults of `handles`, freeing its chunk once
    /// no live key holds anything else. Returns whether it had a chunk
    pub fn release_item(&self, item: &I, handles: &[Handle]) -> Result<bool> {
        let _guard = self.lock.write();
        let Some(slot) = self.items.get(item).map(|slot| *slot) else {
            return Ok(false);
        };
        let table = self.handles.load();
        let arena = self.arena.load();
        reset_chunk(&table, &arena, slot, handles)?;

        if table.live().all(|(_, entry)| holds_default(&arena, slot, entry)) {
            self.unregister_locked(item);
        } else {
            tracing::trace!(slot, "Kept item chunk shared with other layers");
        }
        Ok(true)
    }

    pub fn is_registered(&self, item: &I) -> bool {
        self.items.contains_key(item)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    fn register_locked(&self, item: &I) -> Result<usize> {
        let slot = self.allocator.lock().allocate();
        let current = self.arena.load_full();
        let arena = if slot < current.capacity() {
            current
        } else {
            let grown = Arc::new(current.grown_to(slot + 1));
            tracing::trace!(pages = grown.page_count(), "Grew packed arena");
            self.arena.store(Arc::clone(&grown));
            grown
        };

        arena.clear_chunk(slot);
        let table = self.handles.load();
        for (_, entry) in table.live() {
            if let Some(cursor) = cursor_at(&arena, slot, entry) {
                if let Err(err) = entry.converter.set_value(&cursor, &entry.default) {
                    self.allocator.lock().release(slot);
                    return Err(err);
                }
            }
        }

        self.items.insert(item.clone(), slot);
        tracing::trace!(slot, "Registered item chunk");
        Ok(slot)
    }

    fn unregister_locked(&self, item: &I) -> bool {
        match self.items.remove(item) {
            Some((_, slot)) => {
                self.allocator.lock().release(slot);
                tracing::trace!(slot, "Released item chunk");
                true
            }
            None => false,
        }
    }

    pub fn get_value(&self, item: &I, handle: Handle) -> Result<Value> {
        self.read(item, handle, |entry, cursor| match cursor {
            Some(cursor) => entry.converter.get_value(cursor),
            None => Ok(entry.default.clone()),
        })
    }

    pub fn get_boolean(&self, item: &I, handle: Handle) -> Result<bool> {
        self.read(item, handle, |entry, cursor| match cursor {
            Some(cursor) => entry.converter.get_boolean(cursor),
            None => default_as(entry, ValueType::Boolean, "get_boolean", Value::as_bool),
        })
    }

    pub fn get_integer(&self, item: &I, handle: Handle) -> Result<i32> {
        self.read(item, handle, |entry, cursor| match cursor {
            Some(cursor) => entry.converter.get_integer(cursor),
            None => default_as(entry, ValueType::Integer, "get_integer", Value::as_i32),
        })
    }

    pub fn get_long(&self, item: &I, handle: Handle) -> Result<i64> {
        self.read(item, handle, |entry, cursor| match cursor {
            Some(cursor) => entry.converter.get_long(cursor),
            None => default_as(entry, ValueType::Long, "get_long", Value::as_i64),
        })
    }

    pub fn get_float(&self, item: &I, handle: Handle) -> Result<f32> {
        self.read(item, handle, |entry, cursor| match cursor {
            Some(cursor) => entry.converter.get_float(cursor),
            None => default_as(entry, ValueType::Float, "get_float", Value::as_f32),
        })
    }

    pub fn get_double(&self, item: &I, handle: Handle) -> Result<f64> {
        self.read(item, handle, |entry, cursor| match cursor {
            Some(cursor) => entry.converter.get_double(cursor),
            None => default_as(entry, ValueType::Double, "get_double", Value::as_f64),
        })
    }

    /// Stored substitute of a key backed by a substituting converter.
    /// Items without a chunk read as substitute 0.
    pub fn get_raw(&self, item: &I, handle: Handle) -> Result<u32> {
        self.read(item, handle, |entry, cursor| {
            let converter = substituting(entry)?;
            Ok(cursor.map_or(0, |cursor| converter.get_raw(cursor)))
        })
    }

    /// Whether `item` holds the key's default
    pub fn is_default(&self, item: &I, handle: Handle) -> Result<bool> {
        self.read(item, handle, |entry, cursor| match cursor {
            Some(cursor) => Ok(entry.converter.get_value(cursor)? == entry.default),
            None => Ok(true),
        })
    }

    /// Whether any registered item holds a non-default value for any of `handles`
    pub fn any_annotated(&self, handles: &[Handle]) -> bool {
        let _guard = self.lock.read();
        let table = self.handles.load();
        let arena = self.arena.load();
        self.items.iter().any(|item| {
            let slot = *item.value();
            handles
                .iter()
                .filter_map(|h| table.get(*h))
                .any(|entry| !holds_default(&arena, slot, entry))
        })
    }

    fn read<R>(
        &self,
        item: &I,
        handle: Handle,
        decode: impl Fn(&HandleEntry, Option<&dyn ByteCursor>) -> Result<R>,
    ) -> Result<R> {
        if let Some(stamp) = self.lock.try_optimistic_read() {
            let result = self.read_unlocked(item, handle, &decode);
            if self.lock.validate(stamp) {
                return result;
            }
        }
        let _guard = self.lock.read();
        self.read_unlocked(item, handle, &decode)
    }

    fn read_unlocked<R>(
        &self,
        item: &I,
        handle: Handle,
        decode: &impl Fn(&HandleEntry, Option<&dyn ByteCursor>) -> Result<R>,
    ) -> Result<R> {
        let table = self.handles.load();
        let entry = table.get(handle).ok_or_else(|| dead_handle(handle))?;
        let slot = self.items.get(item).map(|slot| *slot);
        let arena = self.arena.load();
        match slot.and_then(|slot| cursor_at(&arena, slot, entry)) {
            Some(cursor) => decode(entry, Some(&cursor)),
            None => decode(entry, None),
        }
    }

    pub fn set_value(&self, item: &I, handle: Handle, value: &Value) -> Result<()> {
        self.write(item, handle, value, |entry, cursor| entry.converter.set_value(cursor, value))
    }

    pub fn set_boolean(&self, item: &I, handle: Handle, value: bool) -> Result<()> {
        self.write(item, handle, &Value::Boolean(value), |entry, cursor| {
            entry.converter.set_boolean(cursor, value)
        })
    }

    pub fn set_integer(&self, item: &I, handle: Handle, value: i32) -> Result<()> {
        self.write(item, handle, &Value::Integer(value), |entry, cursor| {
            entry.converter.set_integer(cursor, value)
        })
    }

    pub fn set_long(&self, item: &I, handle: Handle, value: i64) -> Result<()> {
        self.write(item, handle, &Value::Long(value), |entry, cursor| {
            entry.converter.set_long(cursor, value)
        })
    }

    pub fn set_float(&self, item: &I, handle: Handle, value: f32) -> Result<()> {
        self.write(item, handle, &Value::Float(value), |entry, cursor| {
            entry.converter.set_float(cursor, value)
        })
    }

    pub fn set_double(&self, item: &I, handle: Handle, value: f64) -> Result<()> {
        self.write(item, handle, &Value::Double(value), |entry, cursor| {
            entry.converter.set_double(cursor, value)
        })
    }

    /// Store a substitute directly for a key backed by a substituting converter
    pub fn set_raw(&self, item: &I, handle: Handle, substitute: u32) -> Result<()> {
        let _guard = self.lock.write();
        let table = self.handles.load();
        let entry = table.get(handle).ok_or_else(|| dead_handle(handle))?;
        let converter = substituting(entry)?;
        let (slot, fresh) = match self.items.get(item).map(|slot| *slot) {
            Some(slot) => (slot, false),
            None if substitute == 0 => return Ok(()),
            None => (self.register_locked(item)?, true),
        };
        let arena = self.arena.load();
        let result = match cursor_at(&arena, slot, entry) {
            Some(cursor) => converter.set_raw(&cursor, substitute),
            None => Err(missing_chunk(slot)),
        };
        if result.is_err() && fresh {
            self.unregister_locked(item);
        }
        result
    }

    /// Put `item` back to the key's default
    pub fn reset(&self, item: &I, handle: Handle) -> Result<()> {
        let _guard = self.lock.write();
        let table = self.handles.load();
        let entry = table.get(handle).ok_or_else(|| dead_handle(handle))?;
        let arena = self.arena.load();
        if let Some(cursor) = self
            .items
            .get(item)
            .and_then(|slot| cursor_at(&arena, *slot, entry))
        {
            entry.converter.set_value(&cursor, &entry.default)?;
        }
        Ok(())
    }

    /// Put every registered item back to the defaults of `handles`
    pub fn reset_handles(&self, handles: &[Handle]) -> Result<()> {
        let _guard = self.lock.write();
        let table = self.handles.load();
        let arena = self.arena.load();
        for item in self.items.iter() {
            reset_chunk(&table, &arena, *item.value(), handles)?;
        }
        Ok(())
    }

    /// Put `items` back to the defaults of `handles`
    pub fn reset_items(&self, items: &[I], handles: &[Handle]) -> Result<()> {
        let _guard = self.lock.write();
        let table = self.handles.load();
        let arena = self.arena.load();
        for item in items {
            if let Some(slot) = self.items.get(item).map(|slot| *slot) {
                reset_chunk(&table, &arena, slot, handles)?;
            }
        }
        Ok(())
    }

    fn write(
        &self,
        item: &I,
        handle: Handle,
        value: &Value,
        encode: impl FnOnce(&HandleEntry, &dyn ByteCursor) -> Result<()>,
    ) -> Result<()> {
        let _guard = self.lock.write();
        let table = self.handles.load();
        let entry = table.get(handle).ok_or_else(|| dead_handle(handle))?;
        let (slot, fresh) = match self.items.get(item).map(|slot| *slot) {
            Some(slot) => (slot, false),
            None if *value == entry.default => return Ok(()),
            None => (self.register_locked(item)?, true),
        };
        let arena = self.arena.load();
        let result = match cursor_at(&arena, slot, entry) {
            Some(cursor) => encode(entry, &cursor),
            None => Err(missing_chunk(slot)),
        };
        if result.is_err() && fresh {
            self.unregister_locked(item);
        }
        result
    }
}

impl<I: Item> Default for PackedDataManager<I> {
    fn default() -> Self {
        Self::from_config(&StorageConfig::default())
    }
}

/// Cursor at `entry` inside chunk `slot`, if the chunk exists and holds it
#[inline]
fn cursor_at<'a>(arena: &'a ChunkArena, slot: usize, entry: &HandleEntry) -> Option<SliceCursor<'a>> {
    let chunk = arena.chunk(slot)?;
    (entry.end() <= chunk.len()).then(|| SliceCursor::new(&chunk[entry.offset..], entry.bit))
}

/// Move the stored bits of one placement between chunks without decoding them
fn copy_placement(source: &[AtomicU8], from: &HandleEntry, target: &[AtomicU8], to: &HandleEntry) {
    let width = from.converter.size_in_bytes();
    if width > 0 {
        for i in 0..width {
            if let (Some(src), Some(dst)) = (source.get(from.offset + i), target.get(to.offset + i)) {
                dst.store(src.load(Ordering::Relaxed), Ordering::Relaxed);
            }
        }
        return;
    }

    for i in 0..from.converter.size_in_bits() {
        let src_bit = from.offset * 8 + usize::from(from.bit) + i;
        let dst_bit = to.offset * 8 + usize::from(to.bit) + i;
        let (Some(src), Some(dst)) = (source.get(src_bit / 8), target.get(dst_bit / 8)) else {
            continue;
        };
        let mask = 1u8 << (dst_bit % 8);
        if (src.load(Ordering::Relaxed) >> (src_bit % 8)) & 1 == 1 {
            dst.fetch_or(mask, Ordering::Relaxed);
        } else {
            dst.fetch_and(!mask, Ordering::Relaxed);
        }
    }
}

fn holds_default(arena: &ChunkArena, slot: usize, entry: &HandleEntry) -> bool {
    match cursor_at(arena, slot, entry) {
        Some(cursor) => entry
            .converter
            .get_value(&cursor)
            .is_ok_and(|value| value == entry.default),
        None => true,
    }
}

fn reset_chunk(table: &HandleTable, arena: &ChunkArena, slot: usize, handles: &[Handle]) -> Result<()> {
    for entry in handles.iter().filter_map(|h| table.get(*h)) {
        if let Some(cursor) = cursor_at(arena, slot, entry) {
            entry.converter.set_value(&cursor, &entry.default)?;
        }
    }
    Ok(())
}

fn default_as<R>(
    entry: &HandleEntry,
    requested: ValueType,
    operation: &'static str,
    extract: fn(&Value) -> Option<R>,
) -> Result<R> {
    let own = entry.converter.value_type();
    if own != requested {
        return Err(Error::type_mismatch(own, requested, operation));
    }
    extract(&entry.default).ok_or_else(|| Error::type_mismatch(own, requested, operation))
}

fn substituting(entry: &HandleEntry) -> Result<&SubstitutingConverter> {
    entry.converter.as_substituting().ok_or_else(|| {
        Error::configuration(format!(
            "key '{}' of layer '{}' does not store substitutes",
            entry.key, entry.layer
        ))
    })
}

fn dead_handle(handle: Handle) -> Error {
    Error::configuration(format!("packed handle {handle} is not registered"))
}

fn missing_chunk(slot: usize) -> Error {
    Error::configuration(format!("chunk {slot} is outside the packed arena"))
}
