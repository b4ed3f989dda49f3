//! Core error type definitions

use crate::types::ValueType;

/// Result type alias for annotation storage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for annotation storage using thiserror
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Key is not the default key, not part of the fixed key set, or unknown
    /// to a packed manager's handle table
    InvalidKey {
        key: String,
        valid_keys: Vec<String>,
        layer: Option<String>,
    },

    /// A typed accessor was used against a storage or converter that does not
    /// support that value type
    TypeMismatch {
        expected: ValueType,
        actual: ValueType,
        operation: &'static str,
    },

    /// Narrowing numeric write that does not fit the target width
    Overflow {
        key: String,
        value: i64,
        target: ValueType,
    },

    /// Key set exceeds what a packing strategy can hold
    CapacityExceeded {
        layer: String,
        key_count: usize,
        max: usize,
    },

    /// Schema or storage configuration errors, raised at attach time
    Configuration { message: String },

    /// JSON (de)serialization errors for manifests and configuration
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}
