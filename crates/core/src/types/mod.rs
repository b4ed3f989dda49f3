//! Domain types shared by all storage strategies.
//!
//! - **`key`**: `AnnotationKey`, the cheaply clonable key identifier
//! - **`value`**: `ValueType` and the tagged `Value`
//! - **`item`**: the `Item` identity bound used for corpus items
//! - **`manifest`**: `KeyManifest` and `LayerManifest`, the schema contract

pub mod item;
pub mod key;
pub mod manifest;
pub mod value;

pub use item::*;
pub use key::*;
pub use manifest::*;
pub use value::*;
