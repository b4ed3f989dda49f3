//! Annotation value storage for corpus items
//!
//! This crate provides the storage strategies an annotation layer can be
//! backed by, trading genericity for memory density:
//! - Single-key storages holding one scalar per item
//! - Fixed-keys storages holding one fixed-size vector per item
//! - A packed storage writing bit- and byte-packed values into chunks of a
//!   shared, concurrently accessible byte arena
//!
//! All strategies implement [`AnnotationStorage`]; [`StorageFactory`] picks
//! one from a layer's manifest.

pub mod config;
pub mod converters;
pub mod factory;
pub mod fixed;
pub mod lookup;
pub mod packed;
pub mod single;
pub mod traits;

pub use config::{PackedBooleanMode, StorageConfig, StorageConfigBuilder, StorageStrategy};
pub use factory::{StorageFactory, StorageKind};
pub use fixed::{BitSetBooleanStorage, IntArrayStorage, MixedStorage, PackedBooleanStorage};
pub use lookup::{build_lookup, BinarySearchLookup, HashLookup, IndexLookup};
pub use packed::{PackedDataManager, PackedStorage};
pub use single::{SingleKeyBooleanStorage, SingleKeyStorage};
pub use traits::AnnotationStorage;

pub use annostore_core::{
    AnnotationKey, Error, Item, KeyManifest, LayerManifest, Result, Value, ValueType,
};
