//! Single-key storages: exactly one declared key per layer
//!
//! Each storage keeps only items whose value differs from the key's
//! no-entry value, in the most compact structure for its scalar type.
//! Reads widen along [`ValueType::widens_to`]; writes must use the native
//! type, except for the checked long → integer narrowing.

mod boolean;
mod scalar;

pub use boolean::SingleKeyBooleanStorage;
pub use scalar::{Scalar, SingleKeyStorage};

use annostore_core::{AnnotationKey, Error, LayerManifest, Result, Value, ValueType};

pub type SingleKeyIntegerStorage<I> = SingleKeyStorage<I, i32>;
pub type SingleKeyLongStorage<I> = SingleKeyStorage<I, i64>;
pub type SingleKeyFloatStorage<I> = SingleKeyStorage<I, f32>;
pub type SingleKeyDoubleStorage<I> = SingleKeyStorage<I, f64>;
pub type SingleKeyObjectStorage<I> = SingleKeyStorage<I, Value>;

/// The one key a single-key storage answers to, resolved at attach time
#[derive(Debug, Clone)]
pub(crate) struct KeyBinding {
    pub layer: String,
    pub key: AnnotationKey,
    pub value_type: ValueType,
    pub no_entry: Value,
}

impl KeyBinding {
    /// Resolve the layer's default key and its no-entry value.
    ///
    /// `accepts` decides whether the storage can hold the declared type.
    pub fn resolve(layer: &LayerManifest, accepts: impl Fn(ValueType) -> bool) -> Result<Self> {
        layer.validate()?;

        let key = layer.default_key().ok_or_else(|| {
            Error::configuration(format!(
                "layer '{}' declares no default key for a single-key storage",
                layer.id()
            ))
        })?;
        let declaration = layer.key(key).ok_or_else(|| {
            Error::configuration(format!(
                "default key '{key}' of layer '{}' is not declared",
                layer.id()
            ))
        })?;

        let value_type = declaration.value_type();
        if !accepts(value_type) {
            return Err(Error::configuration(format!(
                "key '{key}' of layer '{}' is declared {value_type}, which this storage cannot hold",
                layer.id()
            )));
        }

        Ok(Self {
            layer: layer.id().to_string(),
            key: key.clone(),
            value_type,
            no_entry: declaration.no_entry_value(),
        })
    }

    /// Fail unless `key` is the bound key
    pub fn check_key(&self, key: &str) -> Result<()> {
        if self.key.as_str() == key {
            Ok(())
        } else {
            Err(Error::invalid_key(key, [&self.key]).in_layer(self.layer.as_str()))
        }
    }

    /// Fail unless values of the bound type can be read as `requested`
    pub fn check_read(&self, requested: ValueType, operation: &'static str) -> Result<()> {
        if self.value_type.widens_to(requested) {
            Ok(())
        } else {
            Err(Error::type_mismatch(self.value_type, requested, operation))
        }
    }

    /// Fail unless `value` is of the bound type
    pub fn check_write(&self, value: &Value, operation: &'static str) -> Result<()> {
        if value.fits(self.value_type) {
            Ok(())
        } else {
            Err(Error::type_mismatch(
                self.value_type,
                value.value_type().unwrap_or(ValueType::Text),
                operation,
            ))
        }
    }
}

#[cfg(test)]
mod tests;
