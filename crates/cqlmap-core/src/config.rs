//! Mapping defaults loaded from TOML.
//!
//! ```toml
//! keyspace = "app"
//! read_consistency = "LOCAL_QUORUM"
//! write_consistency = "LOCAL_QUORUM"
//! batch_type = "UNLOGGED"
//! ordered_batches = true
//! ```

use crate::{
    DEFAULT_COUNTER_TABLE,
    cql::{ConsistencyLevel, ConsistencyPair},
    error::{ErrorOrigin, MappingError},
    model::InsertStrategy,
};
use serde::Deserialize;
use std::{fs, path::Path};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl From<ConfigError> for MappingError {
    fn from(err: ConfigError) -> Self {
        Self::validation(ErrorOrigin::Config, err.to_string())
    }
}

///
/// ConfiguredBatchType
///
/// Batch kind used for non-counter groups; counter groups always use a
/// counter batch.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfiguredBatchType {
    #[default]
    Logged,
    Unlogged,
}

///
/// MappingConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MappingConfig {
    pub keyspace: Option<String>,
    pub read_consistency: ConsistencyLevel,
    pub write_consistency: ConsistencyLevel,
    pub serial_consistency: Option<ConsistencyLevel>,
    pub insert_strategy: InsertStrategy,
    pub batch_type: ConfiguredBatchType,
    pub ordered_batches: bool,
    pub counter_table: String,
    pub batch_size_warn_threshold: usize,
    pub force_schema_update: bool,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            keyspace: None,
            read_consistency: ConsistencyLevel::One,
            write_consistency: ConsistencyLevel::One,
            serial_consistency: None,
            insert_strategy: InsertStrategy::AllFields,
            batch_type: ConfiguredBatchType::Logged,
            ordered_batches: false,
            counter_table: DEFAULT_COUNTER_TABLE.to_string(),
            batch_size_warn_threshold: 100,
            force_schema_update: false,
        }
    }
}

impl MappingConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&text)
    }

    #[must_use]
    pub const fn consistency(&self) -> ConsistencyPair {
        ConsistencyPair::new(Some(self.read_consistency), Some(self.write_consistency))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(serial) = self.serial_consistency
            && !serial.is_serial()
        {
            return Err(ConfigError::Invalid {
                field: "serial_consistency",
                reason: format!("{serial} is not a serial consistency level"),
            });
        }

        for (field, level) in [
            ("read_consistency", self.read_consistency),
            ("write_consistency", self.write_consistency),
        ] {
            if level.is_serial() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{level} is only valid as a serial consistency level"),
                });
            }
        }

        if self.counter_table.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "counter_table",
                reason: "table name must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = MappingConfig::from_toml_str("").unwrap();

        assert_eq!(config, MappingConfig::default());
        assert_eq!(config.counter_table, "cqlmap_counter_table");
        assert_eq!(config.batch_size_warn_threshold, 100);
    }

    #[test]
    fn parses_every_field() {
        let config = MappingConfig::from_toml_str(
            r#"
            keyspace = "app"
            read_consistency = "LOCAL_QUORUM"
            write_consistency = "QUORUM"
            serial_consistency = "LOCAL_SERIAL"
            insert_strategy = "ONLY_NON_NULL"
            batch_type = "UNLOGGED"
            ordered_batches = true
            counter_table = "counters"
            batch_size_warn_threshold = 10
            force_schema_update = true
            "#,
        )
        .unwrap();

        assert_eq!(config.keyspace.as_deref(), Some("app"));
        assert_eq!(config.read_consistency, ConsistencyLevel::LocalQuorum);
        assert_eq!(config.write_consistency, ConsistencyLevel::Quorum);
        assert_eq!(config.serial_consistency, Some(ConsistencyLevel::LocalSerial));
        assert_eq!(config.insert_strategy, InsertStrategy::OnlyNonNull);
        assert_eq!(config.batch_type, ConfiguredBatchType::Unlogged);
        assert!(config.ordered_batches);
        assert_eq!(config.counter_table, "counters");
        assert_eq!(config.batch_size_warn_threshold, 10);
        assert!(config.force_schema_update);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = MappingConfig::from_toml_str("keyspaces = \"x\"").unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn non_serial_level_rejected_as_serial() {
        let err = MappingConfig::from_toml_str("serial_consistency = \"QUORUM\"").unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "serial_consistency",
                ..
            }
        ));
    }

    #[test]
    fn config_error_maps_to_validation() {
        let err: MappingError = ConfigError::Invalid {
            field: "counter_table",
            reason: "empty".to_string(),
        }
        .into();

        assert!(err.is_validation());
        assert_eq!(err.origin, ErrorOrigin::Config);
    }
}
