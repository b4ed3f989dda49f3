//! Factory choosing a storage variant from a layer's manifest

use crate::config::{StorageConfig, StorageStrategy};
use crate::fixed::{BitSetBooleanStorage, IntArrayStorage, MixedStorage, PackedBooleanStorage, MAX_PACKED_KEYS};
use crate::packed::{PackedDataManager, PackedStorage};
use crate::single::{
    SingleKeyBooleanStorage, SingleKeyDoubleStorage, SingleKeyFloatStorage, SingleKeyIntegerStorage,
    SingleKeyLongStorage, SingleKeyObjectStorage,
};
use crate::traits::AnnotationStorage;
use annostore_core::{Error, Item, LayerManifest, Result, ValueType};
use std::fmt;
use std::sync::Arc;

/// Concrete storage variant picked for a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    SingleKey(ValueType),
    PackedBoolean,
    BitSetBoolean,
    IntArray,
    Mixed,
    Packed,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::SingleKey(value_type) => write!(f, "single-key {value_type}"),
            StorageKind::PackedBoolean => f.write_str("31-bit packed boolean"),
            StorageKind::BitSetBoolean => f.write_str("bit-set boolean"),
            StorageKind::IntArray => f.write_str("int array"),
            StorageKind::Mixed => f.write_str("mixed"),
            StorageKind::Packed => f.write_str("packed"),
        }
    }
}

/// Builds storages according to a [`StorageConfig`].
///
/// The packed strategy needs a shared [`PackedDataManager`], handed in with
/// [`with_manager`](Self::with_manager); every packed storage created by the
/// factory shares it.
#[derive(Debug)]
pub struct StorageFactory<I: Item> {
    config: StorageConfig,
    manager: Option<Arc<PackedDataManager<I>>>,
}

impl<I: Item> StorageFactory<I> {
    pub fn new(config: StorageConfig) -> Self {
        Self { config, manager: None }
    }

    #[must_use]
    pub fn with_manager(mut self, manager: Arc<PackedDataManager<I>>) -> Self {
        self.manager = Some(manager);
        self
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn manager(&self) -> Option<&Arc<PackedDataManager<I>>> {
        self.manager.as_ref()
    }

    /// Decide which variant `layer` gets under the configured strategy
    pub fn select(&self, layer: &LayerManifest) -> Result<StorageKind> {
        if layer.key_count() == 0 {
            return Err(Error::configuration(format!("layer '{}' declares no keys", layer.id())));
        }
        match self.config.strategy {
            StorageStrategy::Auto => {
                if layer.key_count() == 1 && layer.default_key().is_some() {
                    single_key_kind(layer)
                } else {
                    Ok(fixed_keys_kind(layer))
                }
            }
            StorageStrategy::SingleKey => single_key_kind(layer),
            StorageStrategy::FixedKeys => Ok(fixed_keys_kind(layer)),
            StorageStrategy::Packed => Ok(StorageKind::Packed),
        }
    }

    /// Build an unattached storage for `layer`
    pub fn create(&self, layer: &LayerManifest) -> Result<Box<dyn AnnotationStorage<I>>> {
        let kind = self.select(layer)?;
        tracing::debug!(layer = layer.id(), strategy = %self.config.strategy, %kind, "Selected storage");

        let capacity = self.config.initial_capacity;
        let threshold = self.config.hash_lookup_threshold;
        let storage: Box<dyn AnnotationStorage<I>> = match kind {
            StorageKind::SingleKey(ValueType::Boolean) => Box::new(SingleKeyBooleanStorage::new(capacity)),
            StorageKind::SingleKey(ValueType::Integer) => Box::new(SingleKeyIntegerStorage::new(capacity)),
            StorageKind::SingleKey(ValueType::Long) => Box::new(SingleKeyLongStorage::new(capacity)),
            StorageKind::SingleKey(ValueType::Float) => Box::new(SingleKeyFloatStorage::new(capacity)),
            StorageKind::SingleKey(ValueType::Double) => Box::new(SingleKeyDoubleStorage::new(capacity)),
            StorageKind::SingleKey(ValueType::Text) => Box::new(SingleKeyObjectStorage::new(capacity)),
            StorageKind::PackedBoolean => Box::new(PackedBooleanStorage::new(capacity, threshold)),
            StorageKind::BitSetBoolean => Box::new(BitSetBooleanStorage::new(capacity, threshold)),
            StorageKind::IntArray => Box::new(IntArrayStorage::new(capacity, threshold)),
            StorageKind::Mixed => Box::new(MixedStorage::new(capacity, threshold)),
            StorageKind::Packed => {
                let manager = self.manager.as_ref().ok_or_else(|| {
                    Error::configuration(format!(
                        "layer '{}' uses the packed strategy, but the factory has no packed manager",
                        layer.id()
                    ))
                })?;
                Box::new(PackedStorage::new(Arc::clone(manager), &self.config))
            }
        };
        Ok(storage)
    }

    /// Build a storage for `layer` and attach it
    pub fn create_attached(&self, layer: &LayerManifest) -> Result<Box<dyn AnnotationStorage<I>>> {
        let mut storage = self.create(layer)?;
        storage.add_notify(layer)?;
        Ok(storage)
    }
}

impl<I: Item> Default for StorageFactory<I> {
    fn default() -> Self {
        Self::new(StorageConfig::default())
    }
}

fn single_key_kind(layer: &LayerManifest) -> Result<StorageKind> {
    let key = layer
        .default_key()
        .and_then(|key| layer.key(key))
        .ok_or_else(|| {
            Error::configuration(format!(
                "layer '{}' needs a declared default key for single-key storage",
                layer.id()
            ))
        })?;
    Ok(StorageKind::SingleKey(key.value_type()))
}

fn fixed_keys_kind(layer: &LayerManifest) -> StorageKind {
    match layer.common_value_type() {
        Some(ValueType::Boolean) if layer.key_count() <= MAX_PACKED_KEYS => StorageKind::PackedBoolean,
        Some(ValueType::Boolean) => StorageKind::BitSetBoolean,
        Some(ValueType::Integer) => StorageKind::IntArray,
        _ => StorageKind::Mixed,
    }
}
