//! Tests for single-key storages

use super::*;
use crate::traits::AnnotationStorage;
use annostore_core::KeyManifest;
use rstest::rstest;

fn layer(value_type: ValueType) -> LayerManifest {
    LayerManifest::new("tokens")
        .with_key(KeyManifest::new("head", value_type))
        .with_default_key("head")
}

fn attached<T: Scalar>(value_type: ValueType) -> SingleKeyStorage<u32, T> {
    let mut storage = SingleKeyStorage::new(16);
    storage.add_notify(&layer(value_type)).unwrap();
    storage
}

#[test]
fn integer_reads_widen() {
    let mut storage = attached::<i32>(ValueType::Integer);
    storage.set_integer_value(&1, "head", 42).unwrap();

    assert_eq!(storage.get_integer_value(&1, "head").unwrap(), 42);
    assert_eq!(storage.get_long_value(&1, "head").unwrap(), 42);
    assert_eq!(storage.get_float_value(&1, "head").unwrap(), 42.0);
    assert_eq!(storage.get_double_value(&1, "head").unwrap(), 42.0);
    assert!(storage.get_boolean_value(&1, "head").unwrap_err().is_type_mismatch());
}

#[rstest]
#[case::long(ValueType::Long, ValueType::Integer, false)]
#[case::long_to_double(ValueType::Long, ValueType::Double, true)]
#[case::float_to_double(ValueType::Float, ValueType::Double, true)]
#[case::float_to_long(ValueType::Float, ValueType::Long, false)]
#[case::double_to_float(ValueType::Double, ValueType::Float, false)]
fn widening_table(#[case] declared: ValueType, #[case] requested: ValueType, #[case] allowed: bool) {
    let mut storage = attached::<Value>(declared);
    storage.set_value(&1, "head", declared.zero()).unwrap();
    let result = match requested {
        ValueType::Integer => storage.get_integer_value(&1, "head").map(Value::from),
        ValueType::Long => storage.get_long_value(&1, "head").map(Value::from),
        ValueType::Float => storage.get_float_value(&1, "head").map(Value::from),
        ValueType::Double => storage.get_double_value(&1, "head").map(Value::from),
        other => panic!("unexpected case {other}"),
    };
    assert_eq!(result.is_ok(), allowed, "{declared} read as {requested}");
}

#[test]
fn set_long_narrows_with_overflow_check() {
    let mut storage = attached::<i32>(ValueType::Integer);
    storage.set_long_value(&1, "head", 7).unwrap();
    assert_eq!(storage.get_integer_value(&1, "head").unwrap(), 7);

    let err = storage
        .set_long_value(&1, "head", i64::from(i32::MAX) + 1)
        .unwrap_err();
    assert!(matches!(err, Error::Overflow { .. }));
    assert_eq!(storage.get_integer_value(&1, "head").unwrap(), 7);
}

#[test]
fn writes_only_in_native_type() {
    let mut storage = attached::<i64>(ValueType::Long);
    assert!(storage.set_integer_value(&1, "head", 1).unwrap_err().is_type_mismatch());
    assert!(storage.set_double_value(&1, "head", 1.0).unwrap_err().is_type_mismatch());
    storage.set_long_value(&1, "head", 1).unwrap();
}

#[test]
fn other_keys_are_rejected() {
    let storage = attached::<i32>(ValueType::Integer);
    let err = storage.get_integer_value(&1, "lemma").unwrap_err();
    match err {
        Error::InvalidKey {
            key,
            valid_keys,
            layer,
        } => {
            assert_eq!(key, "lemma");
            assert_eq!(valid_keys, vec!["head".to_string()]);
            assert_eq!(layer.as_deref(), Some("tokens"));
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn writing_no_entry_removes_the_entry() {
    let manifest = LayerManifest::new("tokens")
        .with_key(KeyManifest::new("head", ValueType::Integer).with_no_entry(-1))
        .with_default_key("head");
    let mut storage = SingleKeyIntegerStorage::<u32>::new(4);
    storage.add_notify(&manifest).unwrap();

    assert_eq!(storage.get_integer_value(&3, "head").unwrap(), -1);
    storage.set_integer_value(&3, "head", 0).unwrap();
    assert!(storage.has_annotations_for(&3));
    assert_eq!(storage.annotated_keys(&3), vec![AnnotationKey::from("head")]);

    storage.set_integer_value(&3, "head", -1).unwrap();
    assert!(!storage.has_annotations_for(&3));
    assert!(!storage.has_annotations());
    assert!(storage.annotated_keys(&3).is_empty());
}

#[test]
fn default_key_accessors() {
    let mut storage = attached::<f64>(ValueType::Double);
    assert_eq!(storage.default_key().map(AnnotationKey::as_str), Some("head"));
    storage.set(&9, Value::Double(0.5)).unwrap();
    assert_eq!(storage.get(&9).unwrap(), Value::Double(0.5));
    assert!(storage.set(&9, Value::Float(0.5)).unwrap_err().is_type_mismatch());
}

#[test]
fn object_storage_holds_text() {
    let mut storage = attached::<Value>(ValueType::Text);
    assert_eq!(storage.get_value(&1, "head").unwrap(), Value::Null);
    storage.set_value(&1, "head", Value::from("NOUN")).unwrap();
    assert_eq!(storage.get_value(&1, "head").unwrap(), Value::from("NOUN"));
    assert!(storage.get_integer_value(&1, "head").unwrap_err().is_type_mismatch());

    storage.set_value(&1, "head", Value::Null).unwrap();
    assert!(!storage.contains_item(&1));
}

#[test]
fn item_bookkeeping() {
    let mut storage = attached::<i32>(ValueType::Integer);
    assert!(!storage.add_item(&1));
    assert!(!storage.contains_item(&1));

    storage.set_integer_value(&1, "head", 5).unwrap();
    storage.set_integer_value(&2, "head", 6).unwrap();
    storage.set_integer_value(&3, "head", 7).unwrap();
    assert!(storage.remove_item(&1));
    assert!(!storage.remove_item(&1));

    storage.remove_all_values_for_items(&[2]);
    assert!(!storage.contains_item(&2));
    assert!(storage.contains_item(&3));

    assert!(storage.remove_all_values_for_key("lemma").unwrap_err().is_invalid_key());
    storage.remove_all_values_for_key("head").unwrap();
    assert!(!storage.has_annotations());
}

#[test]
fn attach_requires_a_declared_default_key() {
    let mut storage = SingleKeyIntegerStorage::<u32>::new(4);
    let no_default = LayerManifest::new("t").with_key(KeyManifest::new("head", ValueType::Integer));
    assert!(storage.add_notify(&no_default).unwrap_err().is_configuration());

    let wrong_type = layer(ValueType::Long);
    assert!(storage.add_notify(&wrong_type).unwrap_err().is_configuration());
}

#[test]
fn detached_storage_reports_configuration_error() {
    let mut storage = attached::<i32>(ValueType::Integer);
    storage.remove_notify(&layer(ValueType::Integer)).unwrap();
    assert!(storage.get_integer_value(&1, "head").unwrap_err().is_configuration());
    assert!(!storage.has_annotations());
}

#[test]
fn boolean_storage_tracks_true_items() {
    let mut storage = SingleKeyBooleanStorage::<u32>::new(8);
    storage.add_notify(&layer(ValueType::Boolean)).unwrap();

    assert!(!storage.get_boolean_value(&1, "head").unwrap());
    storage.set_boolean_value(&1, "head", true).unwrap();
    assert!(storage.get(&1).unwrap());
    assert_eq!(storage.get_value(&1, "head").unwrap(), Value::Boolean(true));
    assert!(storage.has_annotations());

    storage.set(&1, false).unwrap();
    assert!(!storage.has_annotations_for(&1));
    assert!(storage.set_integer_value(&1, "head", 1).unwrap_err().is_type_mismatch());
    assert!(storage.get_long_value(&1, "head").unwrap_err().is_type_mismatch());
    assert!(storage
        .set_value(&1, "head", Value::from("x"))
        .unwrap_err()
        .is_type_mismatch());
}

#[test]
fn boolean_storage_rejects_true_no_entry() {
    let manifest = LayerManifest::new("t")
        .with_key(KeyManifest::new("flag", ValueType::Boolean).with_no_entry(true))
        .with_default_key("flag");
    let mut storage = SingleKeyBooleanStorage::<u32>::new(8);
    assert!(storage.add_notify(&manifest).unwrap_err().is_configuration());
}
