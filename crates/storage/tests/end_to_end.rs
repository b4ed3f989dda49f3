//! End-to-end behaviour through the factory, identical across strategies

mod common;

use annostore_storage::{
    AnnotationKey, PackedDataManager, StorageConfig, StorageFactory, StorageKind,
    StorageStrategy, Value,
};
use rstest::rstest;
use std::sync::Arc;

fn factory(strategy: StorageStrategy) -> StorageFactory<u64> {
    let config = StorageConfig::builder()
        .with_strategy(strategy)
        .with_initial_capacity(32)
        .build()
        .unwrap();
    StorageFactory::new(config).with_manager(Arc::new(PackedDataManager::default()))
}

#[rstest]
#[case::packed_boolean(StorageStrategy::Auto, StorageKind::PackedBoolean)]
#[case::fixed_keys(StorageStrategy::FixedKeys, StorageKind::PackedBoolean)]
#[case::packed_manager(StorageStrategy::Packed, StorageKind::Packed)]
fn pos_lemma_scenario(#[case] strategy: StorageStrategy, #[case] kind: StorageKind) {
    common::init_tracing();
    let layer = common::pos_lemma();
    let factory = factory(strategy);
    assert_eq!(factory.select(&layer).unwrap(), kind);
    let mut storage = factory.create_attached(&layer).unwrap();

    assert!(storage.add_item(&7));
    storage.set_boolean_value(&7, "pos", true).unwrap();
    assert_eq!(storage.annotated_keys(&7), vec![AnnotationKey::from("pos")]);
    assert!(!storage.get_boolean_value(&7, "lemma").unwrap());
    assert!(storage.has_annotations());

    assert!(storage.remove_item(&7));
    assert!(!storage.get_boolean_value(&7, "pos").unwrap());
    assert!(!storage.has_annotations_for(&7));

    storage.remove_notify(&layer).unwrap();
}

#[rstest]
#[case::mixed(StorageStrategy::Auto)]
#[case::packed(StorageStrategy::Packed)]
fn dependency_layer_behaves_alike(#[case] strategy: StorageStrategy) {
    common::init_tracing();
    let layer = common::dependencies();
    let mut storage = factory(strategy).create_attached(&layer).unwrap();

    assert_eq!(storage.get_integer_value(&1, "head").unwrap(), -1);
    assert_eq!(storage.get_value(&1, "rel").unwrap(), Value::Null);
    assert!(!storage.has_annotations());

    storage.set_integer_value(&1, "head", 0).unwrap();
    storage.set_long_value(&1, "span", 1 << 40).unwrap();
    storage.set_value(&1, "rel", Value::from("root")).unwrap();

    assert_eq!(storage.get_long_value(&1, "head").unwrap(), 0);
    assert_eq!(storage.get_long_value(&1, "span").unwrap(), 1 << 40);
    assert_eq!(storage.get_double_value(&1, "span").unwrap(), (1u64 << 40) as f64);
    assert!(storage.get_integer_value(&1, "span").unwrap_err().is_type_mismatch());
    assert_eq!(
        storage.annotated_keys(&1),
        vec![
            AnnotationKey::from("head"),
            AnnotationKey::from("rel"),
            AnnotationKey::from("span")
        ]
    );

    let err = storage.get_value(&1, "lemma").unwrap_err();
    assert!(err.is_invalid_key());
    assert!(err.to_string().contains("dependencies"));

    storage.set_integer_value(&1, "head", -1).unwrap();
    storage.remove_all_values_for_key("span").unwrap();
    assert_eq!(storage.annotated_keys(&1), vec![AnnotationKey::from("rel")]);

    storage.remove_all_values();
    assert!(!storage.has_annotations());
}

#[test]
fn single_key_layer_from_json() {
    common::init_tracing();
    let layer = annostore_storage::LayerManifest::from_json_str(
        r#"{ "id": "lemma", "default_key": "form", "keys": [ { "key": "form", "type": "text" } ] }"#,
    )
    .unwrap();
    let factory = factory(StorageStrategy::Auto);
    assert_eq!(
        factory.select(&layer).unwrap(),
        StorageKind::SingleKey(annostore_storage::ValueType::Text)
    );

    let mut storage = factory.create_attached(&layer).unwrap();
    storage.set_value(&3, "form", Value::from("walk")).unwrap();
    assert_eq!(storage.get_value(&3, "form").unwrap(), Value::from("walk"));
    assert!(storage.set_integer_value(&3, "form", 1).unwrap_err().is_type_mismatch());
    assert!(!storage.add_item(&4));
    assert!(storage.contains_item(&3));
}
