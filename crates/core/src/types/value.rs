//! Annotation value types and the tagged value representation

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Declared type of an annotation key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Boolean,
    Integer,
    Long,
    Float,
    Double,
    /// Reference-typed values (lemmas, feature bundles, arbitrary labels)
    Text,
}

impl ValueType {
    /// Primitive types are stored unboxed by the specialised storages
    pub fn is_primitive(self) -> bool {
        !matches!(self, ValueType::Text)
    }

    /// Type-specific zero used when a key declares no no-entry value
    pub fn zero(self) -> Value {
        match self {
            ValueType::Boolean => Value::Boolean(false),
            ValueType::Integer => Value::Integer(0),
            ValueType::Long => Value::Long(0),
            ValueType::Float => Value::Float(0.0),
            ValueType::Double => Value::Double(0.0),
            ValueType::Text => Value::Null,
        }
    }

    /// Whether a value of this type can be read losslessly as `target`
    pub fn widens_to(self, target: ValueType) -> bool {
        use ValueType::*;
        matches!(
            (self, target),
            (Boolean, Boolean)
                | (Integer, Integer | Long | Float | Double)
                | (Long, Long | Float | Double)
                | (Float, Float | Double)
                | (Double, Double)
                | (Text, Text)
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::Long => "long",
            ValueType::Float => "float",
            ValueType::Double => "double",
            ValueType::Text => "text",
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single annotation value.
///
/// Floating point values compare and hash by bit pattern, so a stored NaN is
/// equal to itself and `0.0` differs from `-0.0`. Storages rely on this when
/// deciding whether a written value equals a key's no-entry value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Text(Arc<str>),
}

impl Value {
    /// Declared type this value belongs to; `None` for `Null`
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(ValueType::Boolean),
            Value::Integer(_) => Some(ValueType::Integer),
            Value::Long(_) => Some(ValueType::Long),
            Value::Float(_) => Some(ValueType::Float),
            Value::Double(_) => Some(ValueType::Double),
            Value::Text(_) => Some(ValueType::Text),
        }
    }

    /// Whether this value may be stored under a key declared as `value_type`
    pub fn fits(&self, value_type: ValueType) -> bool {
        match self.value_type() {
            None => !value_type.is_primitive(),
            Some(own) => own == value_type,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer and long values, widened
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer, long and float values, widened
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Integer(v) => Some(*v as f32),
            Value::Long(v) => Some(*v as f32),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Any numeric value, widened
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(f64::from(*v)),
            Value::Long(v) => Some(*v as f64),
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Interpret a plain JSON literal as a value of the declared type.
    ///
    /// Used when reading manifests, where no-entry values and enumerations
    /// are written as bare JSON (`-1`, `true`, `"_"`).
    pub fn from_json(json: &serde_json::Value, value_type: ValueType) -> Result<Value> {
        use serde_json::Value as Json;

        let mismatch = || {
            Error::configuration(format!(
                "manifest value {json} is not a valid {value_type} literal"
            ))
        };

        match (value_type, json) {
            (ValueType::Text, Json::Null) => Ok(Value::Null),
            (ValueType::Text, Json::String(s)) => Ok(Value::from(s.as_str())),
            (ValueType::Boolean, Json::Bool(b)) => Ok(Value::Boolean(*b)),
            (ValueType::Integer, Json::Number(n)) => n
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(Value::Integer)
                .ok_or_else(mismatch),
            (ValueType::Long, Json::Number(n)) => n.as_i64().map(Value::Long).ok_or_else(mismatch),
            // Finite literals must stay finite as f32
            (ValueType::Float, Json::Number(n)) => n
                .as_f64()
                .filter(|v| !v.is_finite() || (*v as f32).is_finite())
                .map(|v| Value::Float(v as f32))
                .ok_or_else(mismatch),
            (ValueType::Double, Json::Number(n)) => n.as_f64().map(Value::Double).ok_or_else(mismatch),
            _ => Err(mismatch()),
        }
    }

    /// Inverse of [`Value::from_json`]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::Boolean(v) => Json::Bool(*v),
            Value::Integer(v) => Json::from(*v),
            Value::Long(v) => Json::from(*v),
            Value::Float(v) => Json::from(f64::from(*v)),
            Value::Double(v) => Json::from(*v),
            Value::Text(v) => Json::String(v.to_string()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(v) => v.hash(state),
            Value::Integer(v) => v.hash(state),
            Value::Long(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Double(v) => v.to_bits().hash(state),
            Value::Text(v) => v.hash(state),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(Arc::from(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn floats_compare_by_bit_pattern() {
        let nan = f64::from_bits(0x7ff8_0000_0000_beef);
        assert_eq!(Value::Double(nan), Value::Double(nan));
        assert_ne!(Value::Double(0.0), Value::Double(-0.0));
        assert_ne!(Value::Integer(1), Value::Long(1));
    }

    #[test]
    fn widening_table() {
        assert!(ValueType::Integer.widens_to(ValueType::Double));
        assert!(ValueType::Long.widens_to(ValueType::Float));
        assert!(!ValueType::Long.widens_to(ValueType::Integer));
        assert!(!ValueType::Double.widens_to(ValueType::Float));
        assert!(!ValueType::Boolean.widens_to(ValueType::Integer));
    }

    #[test]
    fn null_fits_only_reference_types() {
        assert!(Value::Null.fits(ValueType::Text));
        assert!(!Value::Null.fits(ValueType::Integer));
        assert!(Value::from("NOUN").fits(ValueType::Text));
        assert!(!Value::from(1i64).fits(ValueType::Integer));
    }

    #[test]
    fn json_literals_follow_declared_type() {
        let json = serde_json::json!(-1);
        assert_eq!(
            Value::from_json(&json, ValueType::Integer).unwrap(),
            Value::Integer(-1)
        );
        assert_eq!(
            Value::from_json(&json, ValueType::Long).unwrap(),
            Value::Long(-1)
        );
        assert!(Value::from_json(&json, ValueType::Boolean).is_err());
        let too_big = serde_json::json!(i64::MAX);
        assert!(Value::from_json(&too_big, ValueType::Integer).is_err());
    }

    #[test]
    fn float_literals_must_fit() {
        let huge = serde_json::json!(1e300);
        let err = Value::from_json(&huge, ValueType::Float).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(
            Value::from_json(&huge, ValueType::Double).unwrap(),
            Value::Double(1e300)
        );
        assert_eq!(
            Value::from_json(&serde_json::json!(0.5), ValueType::Float).unwrap(),
            Value::Float(0.5)
        );
    }

    proptest! {
        #[test]
        fn integer_literals_round_trip(v in any::<i32>(), w in any::<i64>(), b in any::<bool>()) {
            let int = Value::Integer(v);
            prop_assert_eq!(Value::from_json(&int.to_json(), ValueType::Integer).unwrap(), int);
            let long = Value::Long(w);
            prop_assert_eq!(Value::from_json(&long.to_json(), ValueType::Long).unwrap(), long);
            let flag = Value::Boolean(b);
            prop_assert_eq!(Value::from_json(&flag.to_json(), ValueType::Boolean).unwrap(), flag);
        }

        #[test]
        fn finite_floats_survive_json(v in proptest::num::f32::NORMAL | proptest::num::f32::ZERO) {
            let value = Value::Float(v);
            prop_assert_eq!(Value::from_json(&value.to_json(), ValueType::Float).unwrap(), value);
        }

        #[test]
        fn equal_doubles_hash_alike(bits in any::<u64>()) {
            let a = Value::Double(f64::from_bits(bits));
            let b = Value::Double(f64::from_bits(bits));
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(hash_of(&a), hash_of(&b));
            prop_assert_ne!(a, Value::Double(f64::from_bits(bits ^ 1)));
        }
    }
}
