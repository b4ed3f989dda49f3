//! Builder methods for creating errors with context

use super::types::Error;
use crate::types::ValueType;

impl Error {
    /// Create an invalid-key error listing the keys that would have been accepted
    #[must_use]
    pub fn invalid_key<K, S>(key: impl Into<String>, valid_keys: K) -> Self
    where
        K: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Error::InvalidKey {
            key: key.into(),
            valid_keys: valid_keys
                .into_iter()
                .map(|k| k.as_ref().to_string())
                .collect(),
            layer: None,
        }
    }

    /// Attach the owning layer to an invalid-key error; other variants pass through
    #[must_use]
    pub fn in_layer(self, layer_id: impl Into<String>) -> Self {
        match self {
            Error::InvalidKey {
                key,
                valid_keys,
                layer: None,
            } => Error::InvalidKey {
                key,
                valid_keys,
                layer: Some(layer_id.into()),
            },
            other => other,
        }
    }

    /// Create a type mismatch error
    #[must_use]
    pub fn type_mismatch(expected: ValueType, actual: ValueType, operation: &'static str) -> Self {
        Error::TypeMismatch {
            expected,
            actual,
            operation,
        }
    }

    /// Create an overflow error for a narrowing write
    #[must_use]
    pub fn overflow(key: impl Into<String>, value: i64, target: ValueType) -> Self {
        Error::Overflow {
            key: key.into(),
            value,
            target,
        }
    }

    /// Create a capacity error
    #[must_use]
    pub fn capacity_exceeded(layer: impl Into<String>, key_count: usize, max: usize) -> Self {
        Error::CapacityExceeded {
            layer: layer.into(),
            key_count,
            max,
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Check if this error is an invalid-key error
    pub fn is_invalid_key(&self) -> bool {
        matches!(self, Error::InvalidKey { .. })
    }

    /// Check if this error is a type mismatch
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Error::TypeMismatch { .. })
    }

    /// Check if this error is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration { .. })
    }
}
