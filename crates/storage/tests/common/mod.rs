//! Shared fixtures for storage integration tests

#![allow(dead_code)]

use annostore_storage::{KeyManifest, LayerManifest, ValueType};
use std::sync::Once;

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness once per binary
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Two boolean keys defaulting to `false`
pub fn pos_lemma() -> LayerManifest {
    LayerManifest::new("tokens")
        .with_key(KeyManifest::new("pos", ValueType::Boolean))
        .with_key(KeyManifest::new("lemma", ValueType::Boolean))
}

/// Dependency layer read from its JSON form
pub fn dependencies() -> LayerManifest {
    LayerManifest::from_json_str(
        r#"{
            "id": "dependencies",
            "keys": [
                { "key": "head", "type": "integer", "no_entry": -1 },
                { "key": "span", "type": "long" },
                { "key": "rel", "type": "text", "allowed_values": ["nsubj", "obj", "root"] }
            ]
        }"#,
    )
    .expect("fixture manifest is valid")
}
