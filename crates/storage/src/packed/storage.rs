//! `AnnotationStorage` backed by a shared packed manager

use super::layout::{Handle, HandleSpec};
use super::manager::PackedDataManager;
use crate::config::{PackedBooleanMode, StorageConfig};
use crate::converters::{
    BitwiseBooleanConverter, ByteBooleanConverter, Converter, DoubleConverter, FloatConverter, IntConverter,
    LongConverter, SubstitutingConverter,
};
use crate::lookup::{build_lookup, IndexLookup};
use crate::traits::{not_attached, AnnotationStorage};
use annostore_core::{AnnotationKey, Error, Item, KeyManifest, LayerManifest, Result, Value, ValueType};
use std::sync::Arc;

/// One layer's view onto a [`PackedDataManager`].
///
/// Keys resolve to handles through an [`IndexLookup`]; values live in the
/// manager's arena. Item registration is manager-wide, so `add_item` on one
/// packed storage makes the item visible to every layer sharing the manager.
#[derive(Debug)]
pub struct PackedStorage<I: Item> {
    manager: Arc<PackedDataManager<I>>,
    boolean_mode: PackedBooleanMode,
    hash_lookup_threshold: usize,
    state: Option<PackedLayer>,
}

#[derive(Debug)]
struct PackedLayer {
    id: String,
    lookup: Arc<dyn IndexLookup>,
    handles: Vec<Handle>,
    value_types: Vec<ValueType>,
}

impl PackedLayer {
    fn resolve(&self, key: &str) -> Result<(Handle, ValueType)> {
        let slot = self
            .lookup
            .index_of(key)
            .ok_or_else(|| Error::invalid_key(key, self.lookup.keys()).in_layer(self.id.as_str()))?;
        Ok((self.handles[slot], self.value_types[slot]))
    }
}

impl<I: Item> PackedStorage<I> {
    pub fn new(manager: Arc<PackedDataManager<I>>, config: &StorageConfig) -> Self {
        Self {
            manager,
            boolean_mode: config.packed_boolean,
            hash_lookup_threshold: config.hash_lookup_threshold,
            state: None,
        }
    }

    pub fn manager(&self) -> &Arc<PackedDataManager<I>> {
        &self.manager
    }

    /// Handle registered for `key`
    pub fn handle(&self, key: &str) -> Result<Handle> {
        Ok(self.layer()?.resolve(key)?.0)
    }

    fn layer(&self) -> Result<&PackedLayer> {
        self.state.as_ref().ok_or_else(|| not_attached("packed storage"))
    }

    fn resolve(&self, key: &str) -> Result<(Handle, ValueType)> {
        self.layer()?.resolve(key)
    }

    fn handles(&self) -> &[Handle] {
        match &self.state {
            Some(state) => &state.handles,
            None => &[],
        }
    }

    fn annotated(&self, item: &I, handle: Handle) -> bool {
        match self.manager.is_default(item, handle) {
            Ok(default) => !default,
            Err(err) => {
                tracing::warn!(error = %err, ?handle, "Failed to inspect packed value");
                false
            }
        }
    }

    fn widened<R>(
        &self,
        item: &I,
        key: &str,
        requested: ValueType,
        operation: &'static str,
        extract: fn(&Value) -> Option<R>,
    ) -> Result<R> {
        let (handle, declared) = self.resolve(key)?;
        if !declared.widens_to(requested) {
            return Err(Error::type_mismatch(declared, requested, operation));
        }
        extract(&self.manager.get_value(item, handle)?)
            .ok_or_else(|| Error::type_mismatch(declared, requested, operation))
    }
}

/// Converter best suited to store `key` in a packed chunk
pub fn converter_for(key: &KeyManifest, boolean_mode: PackedBooleanMode) -> Result<Arc<dyn Converter>> {
    let converter: Arc<dyn Converter> = match key.value_type() {
        ValueType::Boolean => match boolean_mode {
            PackedBooleanMode::Bitwise => Arc::new(BitwiseBooleanConverter),
            PackedBooleanMode::Byte => Arc::new(ByteBooleanConverter),
        },
        ValueType::Integer => Arc::new(IntConverter),
        ValueType::Long => Arc::new(LongConverter),
        ValueType::Float => Arc::new(FloatConverter),
        ValueType::Double => Arc::new(DoubleConverter),
        ValueType::Text => {
            let allowed = key.allowed_values().ok_or_else(|| {
                Error::configuration(format!(
                    "text key '{}' needs allowed values to be stored packed",
                    key.key()
                ))
            })?;
            Arc::new(SubstitutingConverter::from_enumeration(
                ValueType::Text,
                key.no_entry_value(),
                allowed,
            )?)
        }
    };
    Ok(converter)
}

impl<I: Item> AnnotationStorage<I> for PackedStorage<I> {
    fn add_notify(&mut self, layer: &LayerManifest) -> Result<()> {
        layer.validate()?;
        let lookup = build_lookup(layer.keys().iter().map(|k| k.key().clone()), self.hash_lookup_threshold)?;

        let mut specs = Vec::with_capacity(lookup.key_count());
        let mut value_types = Vec::with_capacity(lookup.key_count());
        for key in lookup.keys() {
            let declaration = layer.key(key).ok_or_else(|| {
                Error::configuration(format!("key '{key}' vanished from layer '{}'", layer.id()))
            })?;
            let converter = converter_for(declaration, self.boolean_mode)?;
            specs.push(HandleSpec::new(key.clone(), converter, declaration.no_entry_value()));
            value_types.push(declaration.value_type());
        }

        self.manager.add_notify(layer.id());
        let handles = match self.manager.register_handles(layer.id(), specs) {
            Ok(handles) => handles,
            Err(err) => {
                self.manager.remove_notify(layer.id());
                return Err(err);
            }
        };

        tracing::debug!(
            layer = layer.id(),
            keys = handles.len(),
            chunk_size = self.manager.chunk_size(),
            "Attached packed storage"
        );
        self.state = Some(PackedLayer {
            id: layer.id().to_string(),
            lookup,
            handles,
            value_types,
        });
        Ok(())
    }

    fn remove_notify(&mut self, layer: &LayerManifest) -> Result<()> {
        if let Some(state) = self.state.take() {
            self.manager.release_handles(&state.handles);
            self.manager.remove_notify(layer.id());
            tracing::debug!(layer = layer.id(), "Detached packed storage");
        }
        Ok(())
    }

    fn get_value(&self, item: &I, key: &str) -> Result<Value> {
        let (handle, _) = self.resolve(key)?;
        self.manager.get_value(item, handle)
    }

    fn get_boolean_value(&self, item: &I, key: &str) -> Result<bool> {
        let (handle, _) = self.resolve(key)?;
        self.manager.get_boolean(item, handle)
    }

    fn get_integer_value(&self, item: &I, key: &str) -> Result<i32> {
        let (handle, _) = self.resolve(key)?;
        self.manager.get_integer(item, handle)
    }

    fn get_long_value(&self, item: &I, key: &str) -> Result<i64> {
        match self.resolve(key)? {
            (handle, ValueType::Long) => self.manager.get_long(item, handle),
            _ => self.widened(item, key, ValueType::Long, "get_long_value", Value::as_i64),
        }
    }

    fn get_float_value(&self, item: &I, key: &str) -> Result<f32> {
        match self.resolve(key)? {
            (handle, ValueType::Float) => self.manager.get_float(item, handle),
            _ => self.widened(item, key, ValueType::Float, "get_float_value", Value::as_f32),
        }
    }

    fn get_double_value(&self, item: &I, key: &str) -> Result<f64> {
        match self.resolve(key)? {
            (handle, ValueType::Double) => self.manager.get_double(item, handle),
            _ => self.widened(item, key, ValueType::Double, "get_double_value", Value::as_f64),
        }
    }

    fn set_value(&mut self, item: &I, key: &str, value: Value) -> Result<()> {
        let (handle, declared) = self.resolve(key)?;
        if !value.fits(declared) {
            return Err(Error::type_mismatch(
                declared,
                value.value_type().unwrap_or(ValueType::Text),
                "set_value",
            ));
        }
        self.manager.set_value(item, handle, &value)
    }

    fn set_boolean_value(&mut self, item: &I, key: &str, value: bool) -> Result<()> {
        let (handle, _) = self.resolve(key)?;
        self.manager.set_boolean(item, handle, value)
    }

    fn set_integer_value(&mut self, item: &I, key: &str, value: i32) -> Result<()> {
        let (handle, _) = self.resolve(key)?;
        self.manager.set_integer(item, handle, value)
    }

    fn set_long_value(&mut self, item: &I, key: &str, value: i64) -> Result<()> {
        match self.resolve(key)? {
            (handle, ValueType::Integer) => {
                let narrowed = i32::try_from(value).map_err(|_| Error::overflow(key, value, ValueType::Integer))?;
                self.manager.set_integer(item, handle, narrowed)
            }
            (handle, _) => self.manager.set_long(item, handle, value),
        }
    }

    fn set_float_value(&mut self, item: &I, key: &str, value: f32) -> Result<()> {
        let (handle, _) = self.resolve(key)?;
        self.manager.set_float(item, handle, value)
    }

    fn set_double_value(&mut self, item: &I, key: &str, value: f64) -> Result<()> {
        let (handle, _) = self.resolve(key)?;
        self.manager.set_double(item, handle, value)
    }

    fn has_annotations(&self) -> bool {
        let handles = self.handles();
        !handles.is_empty() && self.manager.any_annotated(handles)
    }

    fn has_annotations_for(&self, item: &I) -> bool {
        self.handles()
            .iter()
            .any(|h| self.annotated(item, *h))
    }

    fn collect_keys(&self, item: &I, collector: &mut dyn FnMut(&AnnotationKey)) -> bool {
        let Some(state) = &self.state else {
            return false;
        };
        let mut found = false;
        for (slot, handle) in state.handles.iter().enumerate() {
            if self.annotated(item, *handle) {
                if let Some(key) = state.lookup.key_at(slot) {
                    collector(key);
                    found = true;
                }
            }
        }
        found
    }

    fn remove_all_values(&mut self) {
        if let Err(err) = self.manager.reset_handles(self.handles()) {
            tracing::warn!(error = %err, "Failed to reset packed values");
        }
    }

    fn remove_all_values_for_key(&mut self, key: &str) -> Result<()> {
        let (handle, _) = self.resolve(key)?;
        self.manager.reset_handles(&[handle])
    }

    fn remove_all_values_for_items(&mut self, items: &[I]) {
        if let Err(err) = self.manager.reset_items(items, self.handles()) {
            tracing::warn!(error = %err, "Failed to reset packed values");
        }
    }

    fn add_item(&mut self, item: &I) -> bool {
        match self.manager.register(item) {
            Ok(added) => added,
            Err(err) => {
                tracing::warn!(item = ?item, error = %err, "Failed to register packed item");
                false
            }
        }
    }

    fn remove_item(&mut self, item: &I) -> bool {
        match self.manager.release_item(item, self.handles()) {
            Ok(removed) => removed,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to release packed item");
                false
            }
        }
    }

    fn contains_item(&self, item: &I) -> bool {
        self.manager.is_registered(item)
    }
}
