//! Annotation key newtype

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::{self, Display};
use std::ops::Deref;
use std::sync::Arc;

/// Identifier of one named property attachable to corpus items.
///
/// Keys are scoped to a layer and compare lexicographically, which is the
/// order index lookups assign slots in. Cloning is a reference count bump.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct AnnotationKey(Arc<str>);

impl AnnotationKey {
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AnnotationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for AnnotationKey {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Borrow<str> for AnnotationKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for AnnotationKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AnnotationKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for AnnotationKey {
    fn from(key: String) -> Self {
        Self(Arc::from(key))
    }
}

impl From<AnnotationKey> for String {
    fn from(key: AnnotationKey) -> Self {
        key.0.to_string()
    }
}

impl PartialEq<str> for AnnotationKey {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for AnnotationKey {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn orders_lexicographically() {
        let mut keys = vec![
            AnnotationKey::from("pos"),
            AnnotationKey::from("lemma"),
            AnnotationKey::from("deprel"),
        ];
        keys.sort();
        let names: Vec<&str> = keys.iter().map(AnnotationKey::as_str).collect();
        assert_eq!(names, ["deprel", "lemma", "pos"]);
    }

    #[test]
    fn borrows_as_str_for_map_lookups() {
        let mut map = HashMap::new();
        map.insert(AnnotationKey::from("pos"), 1);
        assert_eq!(map.get("pos"), Some(&1));
    }

    #[test]
    fn serializes_as_plain_string() {
        let key = AnnotationKey::from("feats");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"feats\"");
        let back: AnnotationKey = serde_json::from_str("\"feats\"").unwrap();
        assert_eq!(back, key);
    }
}
