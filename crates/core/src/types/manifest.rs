//! Layer and key manifests: the schema contract storages are attached with
//!
//! A manifest names the keys a layer may carry, their declared types and
//! optional no-entry values. Hosts usually build manifests in code, but they
//! can also be read from JSON:
//!
//! ```json
//! {
//!   "id": "tokens",
//!   "default_key": "upos",
//!   "keys": [
//!     { "key": "upos", "type": "text", "allowed_values": ["NOUN", "VERB"] },
//!     { "key": "head", "type": "integer", "no_entry": -1 }
//!   ]
//! }
//! ```

use super::key::AnnotationKey;
use super::value::{Value, ValueType};
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Declaration of a single annotation key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawKeyManifest", into = "RawKeyManifest")]
pub struct KeyManifest {
    key: AnnotationKey,
    value_type: ValueType,
    no_entry_value: Option<Value>,
    allowed_values: Option<Vec<Value>>,
}

impl KeyManifest {
    pub fn new(key: impl Into<AnnotationKey>, value_type: ValueType) -> Self {
        Self {
            key: key.into(),
            value_type,
            no_entry_value: None,
            allowed_values: None,
        }
    }

    /// Declare the sentinel that stands for "annotation absent"
    #[must_use]
    pub fn with_no_entry(mut self, value: impl Into<Value>) -> Self {
        self.no_entry_value = Some(value.into());
        self
    }

    /// Declare a closed set of values the key may take
    #[must_use]
    pub fn with_allowed_values<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn key(&self) -> &AnnotationKey {
        &self.key
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// The no-entry value exactly as declared, if any
    pub fn declared_no_entry(&self) -> Option<&Value> {
        self.no_entry_value.as_ref()
    }

    /// The effective no-entry value: the declared one, or the type's zero
    pub fn no_entry_value(&self) -> Value {
        self.no_entry_value
            .clone()
            .unwrap_or_else(|| self.value_type.zero())
    }

    pub fn allowed_values(&self) -> Option<&[Value]> {
        self.allowed_values.as_deref()
    }

    /// Check that declared values agree with the declared type
    pub fn validate(&self) -> Result<()> {
        if let Some(no_entry) = &self.no_entry_value {
            if !no_entry.fits(self.value_type) {
                return Err(Error::configuration(format!(
                    "no-entry value {no_entry} of key '{}' is not a {} value",
                    self.key, self.value_type
                )));
            }
        }
        if let Some(allowed) = &self.allowed_values {
            if let Some(bad) = allowed.iter().find(|v| !v.fits(self.value_type)) {
                return Err(Error::configuration(format!(
                    "allowed value {bad} of key '{}' is not a {} value",
                    self.key, self.value_type
                )));
            }
        }
        Ok(())
    }
}

/// Declaration of an annotation layer: its keys and optional default key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerManifest {
    id: String,
    #[serde(default)]
    keys: Vec<KeyManifest>,
    #[serde(default)]
    default_key: Option<AnnotationKey>,
}

impl LayerManifest {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            keys: Vec::new(),
            default_key: None,
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: KeyManifest) -> Self {
        self.keys.push(key);
        self
    }

    #[must_use]
    pub fn with_default_key(mut self, key: impl Into<AnnotationKey>) -> Self {
        self.default_key = Some(key.into());
        self
    }

    /// Read a manifest from its JSON form and validate it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let manifest: LayerManifest = serde_json::from_str(json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn keys(&self) -> &[KeyManifest] {
        &self.keys
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn key(&self, key: &str) -> Option<&KeyManifest> {
        self.keys.iter().find(|k| k.key.as_str() == key)
    }

    pub fn default_key(&self) -> Option<&AnnotationKey> {
        self.default_key.as_ref()
    }

    /// Declared value type shared by every key, if the layer is homogeneous
    pub fn common_value_type(&self) -> Option<ValueType> {
        let first = self.keys.first()?.value_type;
        self.keys
            .iter()
            .all(|k| k.value_type == first)
            .then_some(first)
    }

    /// Check key uniqueness and every key declaration
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.keys.len());
        for key in &self.keys {
            if !seen.insert(key.key.as_str()) {
                return Err(Error::configuration(format!(
                    "layer '{}' declares key '{}' more than once",
                    self.id, key.key
                )));
            }
            key.validate()?;
        }
        if let Some(default_key) = &self.default_key {
            if !seen.contains(default_key.as_str()) {
                return Err(Error::configuration(format!(
                    "default key '{default_key}' of layer '{}' is not declared",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

/// Wire form of [`KeyManifest`]; literals are interpreted against `type`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawKeyManifest {
    key: AnnotationKey,
    #[serde(rename = "type")]
    value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    no_entry: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    allowed_values: Option<Vec<serde_json::Value>>,
}

impl TryFrom<RawKeyManifest> for KeyManifest {
    type Error = Error;

    fn try_from(raw: RawKeyManifest) -> Result<Self> {
        let no_entry_value = raw
            .no_entry
            .as_ref()
            .map(|json| Value::from_json(json, raw.value_type))
            .transpose()?;
        let allowed_values = raw
            .allowed_values
            .as_ref()
            .map(|values| {
                values
                    .iter()
                    .map(|json| Value::from_json(json, raw.value_type))
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?;
        Ok(KeyManifest {
            key: raw.key,
            value_type: raw.value_type,
            no_entry_value,
            allowed_values,
        })
    }
}

impl From<KeyManifest> for RawKeyManifest {
    fn from(manifest: KeyManifest) -> Self {
        RawKeyManifest {
            key: manifest.key,
            value_type: manifest.value_type,
            no_entry: manifest.no_entry_value.as_ref().map(Value::to_json),
            allowed_values: manifest
                .allowed_values
                .as_ref()
                .map(|values| values.iter().map(Value::to_json).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKENS: &str = r#"{
        "id": "tokens",
        "default_key": "upos",
        "keys": [
            { "key": "upos", "type": "text", "allowed_values": ["NOUN", "VERB"] },
            { "key": "head", "type": "integer", "no_entry": -1 },
            { "key": "root", "type": "boolean" }
        ]
    }"#;

    #[test]
    fn reads_json_manifest() {
        let manifest = LayerManifest::from_json_str(TOKENS).unwrap();
        assert_eq!(manifest.id(), "tokens");
        assert_eq!(manifest.key_count(), 3);
        assert_eq!(manifest.default_key().map(AnnotationKey::as_str), Some("upos"));

        let head = manifest.key("head").unwrap();
        assert_eq!(head.no_entry_value(), Value::Integer(-1));

        let root = manifest.key("root").unwrap();
        assert_eq!(root.declared_no_entry(), None);
        assert_eq!(root.no_entry_value(), Value::Boolean(false));

        let upos = manifest.key("upos").unwrap();
        assert_eq!(upos.allowed_values().map(<[Value]>::len), Some(2));
        assert_eq!(upos.no_entry_value(), Value::Null);
    }

    #[test]
    fn rejects_literal_of_wrong_type() {
        let json = r#"{ "id": "t", "keys": [ { "key": "head", "type": "integer", "no_entry": "x" } ] }"#;
        let err = LayerManifest::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("not a valid integer literal"));
    }

    #[test]
    fn rejects_duplicate_keys() {
        let manifest = LayerManifest::new("t")
            .with_key(KeyManifest::new("pos", ValueType::Boolean))
            .with_key(KeyManifest::new("pos", ValueType::Boolean));
        assert!(manifest.validate().unwrap_err().is_configuration());
    }

    #[test]
    fn rejects_undeclared_default_key() {
        let manifest = LayerManifest::new("t")
            .with_key(KeyManifest::new("pos", ValueType::Boolean))
            .with_default_key("lemma");
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn rejects_mistyped_no_entry_from_builder() {
        let manifest = LayerManifest::new("t")
            .with_key(KeyManifest::new("count", ValueType::Integer).with_no_entry(5i64));
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn common_value_type_detects_homogeneous_layers() {
        let manifest = LayerManifest::new("t")
            .with_key(KeyManifest::new("a", ValueType::Boolean))
            .with_key(KeyManifest::new("b", ValueType::Boolean));
        assert_eq!(manifest.common_value_type(), Some(ValueType::Boolean));
        let mixed = manifest.with_key(KeyManifest::new("c", ValueType::Integer));
        assert_eq!(mixed.common_value_type(), None);
    }

    #[test]
    fn json_round_trip_preserves_declarations() {
        let manifest = LayerManifest::from_json_str(TOKENS).unwrap();
        let json = serde_json::to_string(&manifest).unwrap();
        let back = LayerManifest::from_json_str(&json).unwrap();
        assert_eq!(back, manifest);
    }
}
