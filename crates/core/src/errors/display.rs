//! Display implementations for error types

use super::types::Error;
use std::fmt;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidKey {
                key,
                valid_keys,
                layer,
            } => {
                let valid = valid_keys.join(", ");
                match layer {
                    Some(layer) => write!(
                        f,
                        "invalid annotation key '{key}' for layer '{layer}' (valid keys: [{valid}])"
                    ),
                    None => write!(f, "invalid annotation key '{key}' (valid keys: [{valid}])"),
                }
            }
            Error::TypeMismatch {
                expected,
                actual,
                operation,
            } => {
                write!(
                    f,
                    "type mismatch in {operation}: storage holds {expected} values, accessor requested {actual}"
                )
            }
            Error::Overflow { key, value, target } => {
                write!(
                    f,
                    "value {value} for key '{key}' does not fit into {target} storage"
                )
            }
            Error::CapacityExceeded {
                layer,
                key_count,
                max,
            } => {
                write!(
                    f,
                    "layer '{layer}' declares {key_count} keys, storage supports at most {max}"
                )
            }
            Error::Configuration { message } => {
                write!(f, "configuration error: {message}")
            }
            Error::Json { message, .. } => {
                write!(f, "invalid JSON: {message}")
            }
        }
    }
}
