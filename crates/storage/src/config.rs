//! Storage configuration with precedence and validation
//!
//! Values come from defaults, optionally overridden by a JSON document and
//! then by `ANNOSTORE_*` environment variables.

use annostore_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default number of items storages pre-size their maps for
pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;

/// Key sets up to this size use binary search lookups
pub const DEFAULT_HASH_LOOKUP_THRESHOLD: usize = 8;

/// Default byte size of one packed arena page
pub const DEFAULT_PACKED_PAGE_SIZE: usize = 64 * 1024;

/// Which storage family the factory should build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageStrategy {
    /// Pick from the manifest's key count and type homogeneity
    #[default]
    Auto,
    SingleKey,
    FixedKeys,
    Packed,
}

impl StorageStrategy {
    /// Parse a strategy name; unknown names yield `None`
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace('_', "-").as_str() {
            "auto" => Some(StorageStrategy::Auto),
            "single-key" | "single" => Some(StorageStrategy::SingleKey),
            "fixed-keys" | "fixed" => Some(StorageStrategy::FixedKeys),
            "packed" => Some(StorageStrategy::Packed),
            _ => None,
        }
    }
}

impl fmt::Display for StorageStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageStrategy::Auto => "auto",
            StorageStrategy::SingleKey => "single-key",
            StorageStrategy::FixedKeys => "fixed-keys",
            StorageStrategy::Packed => "packed",
        };
        f.write_str(name)
    }
}

/// How boolean keys are laid out in packed chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackedBooleanMode {
    /// One bit per key, up to eight keys sharing a byte
    #[default]
    Bitwise,
    /// One full byte per key
    Byte,
}

/// Configuration shared by all storage strategies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Number of items backing maps are pre-sized for
    pub initial_capacity: usize,
    /// Largest key set still served by binary search lookups
    pub hash_lookup_threshold: usize,
    /// Storage family the factory builds
    pub strategy: StorageStrategy,
    /// Byte size of one packed arena page
    pub packed_page_size: usize,
    /// Boolean layout in packed chunks
    pub packed_boolean: PackedBooleanMode,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            hash_lookup_threshold: DEFAULT_HASH_LOOKUP_THRESHOLD,
            strategy: StorageStrategy::Auto,
            packed_page_size: DEFAULT_PACKED_PAGE_SIZE,
            packed_boolean: PackedBooleanMode::Bitwise,
        }
    }
}

impl StorageConfig {
    /// Create a builder starting from defaults
    pub fn builder() -> StorageConfigBuilder {
        StorageConfigBuilder::new()
    }

    /// Load defaults overridden by environment variables
    pub fn load() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: StorageConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document, then let the environment override it
    pub fn load_from_json_str(json: &str) -> Result<Self> {
        let mut config: StorageConfig = serde_json::from_str(json)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `ANNOSTORE_*` environment variables.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env(&mut self) {
        if let Some(capacity) = env_usize("ANNOSTORE_INITIAL_CAPACITY") {
            self.initial_capacity = capacity;
        }

        if let Some(threshold) = env_usize("ANNOSTORE_HASH_LOOKUP_THRESHOLD") {
            self.hash_lookup_threshold = threshold;
        }

        if let Some(page_size) = env_usize("ANNOSTORE_PACKED_PAGE_SIZE") {
            self.packed_page_size = page_size;
        }

        if let Ok(strategy) = std::env::var("ANNOSTORE_STRATEGY") {
            match StorageStrategy::parse(&strategy) {
                Some(strategy) => self.strategy = strategy,
                None => tracing::warn!(
                    value = %strategy,
                    "Ignoring unknown ANNOSTORE_STRATEGY, keeping {}",
                    self.strategy
                ),
            }
        }

        if let Ok(mode) = std::env::var("ANNOSTORE_PACKED_BOOLEAN") {
            match mode.trim().to_lowercase().as_str() {
                "bitwise" | "bit" => self.packed_boolean = PackedBooleanMode::Bitwise,
                "byte" => self.packed_boolean = PackedBooleanMode::Byte,
                _ => tracing::warn!(value = %mode, "Ignoring unknown ANNOSTORE_PACKED_BOOLEAN"),
            }
        }
    }

    /// Reject settings no storage can work with
    pub fn validate(&self) -> Result<()> {
        if self.hash_lookup_threshold == 0 {
            return Err(Error::configuration(
                "hash_lookup_threshold must be at least 1",
            ));
        }
        // A page has to hold at least one chunk of the widest value (8 bytes)
        if self.packed_page_size < 8 {
            return Err(Error::configuration(format!(
                "packed_page_size {} is smaller than 8 bytes",
                self.packed_page_size
            )));
        }
        Ok(())
    }
}

fn env_usize(name: &str) -> Option<usize> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<usize>() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(variable = name, value = %raw, error = %e, "Ignoring invalid setting");
            None
        }
    }
}

/// Builder for creating storage configurations
pub struct StorageConfigBuilder {
    config: StorageConfig,
}

impl StorageConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: StorageConfig::default(),
        }
    }

    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_capacity = capacity;
        self
    }

    pub fn with_hash_lookup_threshold(mut self, threshold: usize) -> Self {
        self.config.hash_lookup_threshold = threshold;
        self
    }

    pub fn with_strategy(mut self, strategy: StorageStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn with_packed_page_size(mut self, page_size: usize) -> Self {
        self.config.packed_page_size = page_size;
        self
    }

    pub fn with_packed_boolean(mut self, mode: PackedBooleanMode) -> Self {
        self.config.packed_boolean = mode;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<StorageConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for StorageConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for name in [
            "ANNOSTORE_INITIAL_CAPACITY",
            "ANNOSTORE_HASH_LOOKUP_THRESHOLD",
            "ANNOSTORE_PACKED_PAGE_SIZE",
            "ANNOSTORE_STRATEGY",
            "ANNOSTORE_PACKED_BOOLEAN",
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn json_overrides_only_given_fields() {
        let config = StorageConfig::from_json_str(r#"{ "strategy": "packed", "initial_capacity": 16 }"#)
            .unwrap();
        assert_eq!(config.strategy, StorageStrategy::Packed);
        assert_eq!(config.initial_capacity, 16);
        assert_eq!(config.hash_lookup_threshold, DEFAULT_HASH_LOOKUP_THRESHOLD);
        assert_eq!(config.packed_boolean, PackedBooleanMode::Bitwise);
    }

    #[test]
    fn builder_rejects_zero_threshold() {
        let err = StorageConfig::builder()
            .with_hash_lookup_threshold(0)
            .build()
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn strategy_names_parse() {
        assert_eq!(StorageStrategy::parse("fixed_keys"), Some(StorageStrategy::FixedKeys));
        assert_eq!(StorageStrategy::parse(" Single-Key "), Some(StorageStrategy::SingleKey));
        assert_eq!(StorageStrategy::parse("columnar"), None);
    }

    #[test]
    #[serial]
    fn env_overrides_defaults() {
        clear_env();
        std::env::set_var("ANNOSTORE_STRATEGY", "fixed-keys");
        std::env::set_var("ANNOSTORE_PACKED_PAGE_SIZE", "4096");
        std::env::set_var("ANNOSTORE_PACKED_BOOLEAN", "byte");

        let config = StorageConfig::load().unwrap();
        assert_eq!(config.strategy, StorageStrategy::FixedKeys);
        assert_eq!(config.packed_page_size, 4096);
        assert_eq!(config.packed_boolean, PackedBooleanMode::Byte);
        clear_env();
    }

    #[test]
    #[serial]
    fn invalid_env_values_are_ignored() {
        clear_env();
        std::env::set_var("ANNOSTORE_INITIAL_CAPACITY", "lots");
        std::env::set_var("ANNOSTORE_STRATEGY", "columnar");

        let config = StorageConfig::load().unwrap();
        assert_eq!(config.initial_capacity, DEFAULT_INITIAL_CAPACITY);
        assert_eq!(config.strategy, StorageStrategy::Auto);
        clear_env();
    }
}
