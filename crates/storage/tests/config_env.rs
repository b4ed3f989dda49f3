//! Configuration precedence as seen by the factory

mod common;

use annostore_storage::{
    PackedBooleanMode, PackedDataManager, StorageConfig, StorageFactory, StorageKind, StorageStrategy,
};
use serial_test::serial;
use std::sync::Arc;

const VARIABLES: [&str; 5] = [
    "ANNOSTORE_INITIAL_CAPACITY",
    "ANNOSTORE_HASH_LOOKUP_THRESHOLD",
    "ANNOSTORE_PACKED_PAGE_SIZE",
    "ANNOSTORE_STRATEGY",
    "ANNOSTORE_PACKED_BOOLEAN",
];

fn clear_env() {
    for name in VARIABLES {
        std::env::remove_var(name);
    }
}

#[test]
#[serial]
fn environment_beats_json() {
    common::init_tracing();
    clear_env();
    std::env::set_var("ANNOSTORE_STRATEGY", "packed");

    let config = StorageConfig::load_from_json_str(
        r#"{ "strategy": "fixed-keys", "packed_boolean": "byte", "hash_lookup_threshold": 2 }"#,
    )
    .unwrap();
    clear_env();

    assert_eq!(config.strategy, StorageStrategy::Packed);
    assert_eq!(config.packed_boolean, PackedBooleanMode::Byte);
    assert_eq!(config.hash_lookup_threshold, 2);

    let factory = StorageFactory::<u32>::new(config).with_manager(Arc::new(PackedDataManager::default()));
    assert_eq!(factory.select(&common::pos_lemma()).unwrap(), StorageKind::Packed);
}

#[test]
#[serial]
fn invalid_environment_fails_validation() {
    common::init_tracing();
    clear_env();
    std::env::set_var("ANNOSTORE_PACKED_PAGE_SIZE", "4");
    let result = StorageConfig::load();
    clear_env();
    assert!(result.unwrap_err().is_configuration());
}

#[test]
#[serial]
fn malformed_json_is_reported() {
    clear_env();
    let err = StorageConfig::load_from_json_str("{ strategy: packed }").unwrap_err();
    assert!(err.to_string().starts_with("invalid JSON"));
}
