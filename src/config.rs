use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Largest scale a `Decimal` can represent.
const MAX_DECIMAL_SCALE: u32 = 28;

/// Tunables of a single matching engine instance.
///
/// Every field has a default, so a config file only needs to list what it overrides:
///
/// ```
/// use order_book_engine::EngineConfig;
///
/// let config = EngineConfig::from_json_str(r#"{ "max_price_scale": 2 }"#).unwrap();
/// assert_eq!(config.max_price_scale, 2);
/// assert_eq!(config.default_order_ttl_secs, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of decimal places accepted in an order price
    pub max_price_scale: u32,
    /// Time to live applied to limit orders whose command carries none
    pub default_order_ttl_secs: Option<u64>,
    /// Capacity of the channel built by `ChannelEventSink::from_config` (`None` = unbounded)
    pub event_channel_capacity: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_price_scale: 8,
            default_order_ttl_secs: None,
            event_channel_capacity: Some(4096),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config: EngineConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every field is within the range the engine supports.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_price_scale > MAX_DECIMAL_SCALE {
            return Err(ConfigError::Invalid(format!(
                "max_price_scale {} exceeds {MAX_DECIMAL_SCALE}",
                self.max_price_scale
            )));
        }
        if self.event_channel_capacity == Some(0) {
            return Err(ConfigError::Invalid(
                "event_channel_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_unbounded_channel_and_ttl() {
        let config = EngineConfig::from_json_str(
            r#"{ "default_order_ttl_secs": 30, "event_channel_capacity": null }"#,
        )
        .unwrap();
        assert_eq!(config.default_order_ttl_secs, Some(30));
        assert_eq!(config.event_channel_capacity, None);
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "max_price_scale": 29 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "event_channel_capacity": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            EngineConfig::from_json_str("{ max_price_scale: }"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            EngineConfig::load("/nonexistent/engine.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
