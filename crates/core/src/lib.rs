//! Core domain types and errors for the `annostore` annotation engine.
//!
//! This crate holds the vocabulary shared by every storage strategy: what an
//! annotation key is, which value types a key may declare, how a layer's
//! schema is described, and the single error type all storages report.
//!
//! ## Key Components
//!
//! - **`errors`**: The `Error` enum and `Result` alias. Every failure the
//!   engine can produce (invalid keys, type mismatches, overflow, capacity
//!   and configuration problems) is a variant here.
//! - **`types`**: `AnnotationKey`, `ValueType`, `Value`, the `Item` identity
//!   trait and the `LayerManifest`/`KeyManifest` schema contract.

pub mod errors;
pub mod types;

pub use self::{
    errors::{Error, Result},
    types::*,
};
