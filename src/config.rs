//! Recognized-keys configuration map
//!
//! Stages are configured from a JSON object. Every getter takes the default
//! used when the key is absent; unknown keys are ignored. A key that is
//! present but has the wrong shape is a [`ConfigError`], never a silent
//! fallback to the default.
//!
//! Stage-level keys:
//! - `prescale` (default: 1, must be >= 1)
//! - `max_tot` (default: unbounded, activity stages only)
//! - `tc_type_name` (default: algorithm specific, candidate stages only)

use crate::error::{ConfigError, Result};
use crate::types::{CandidateType, Timestamp};
use serde_json::{Map, Value};

/// Read-only view over a stage's JSON configuration
#[derive(Debug, Clone, Copy)]
pub struct ConfigMap<'a> {
    entries: Option<&'a Map<String, Value>>,
}

impl<'a> ConfigMap<'a> {
    /// Wrap a configuration value. Anything other than an object is treated
    /// as an empty map so every default applies.
    pub fn new(value: &'a Value) -> Self {
        Self {
            entries: value.as_object(),
        }
    }

    pub fn empty() -> ConfigMap<'static> {
        ConfigMap { entries: None }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.entries.and_then(|map| map.get(key))
    }

    /// Nested configuration section, e.g. `activity_maker`
    pub fn section(&self, key: &str) -> Result<ConfigMap<'a>> {
        match self.get(key) {
            Some(value) if value.is_object() => Ok(ConfigMap::new(value)),
            Some(_) => Err(ConfigError::wrong_type(key, "object")),
            None => Err(ConfigError::MissingSection(key.to_string())),
        }
    }

    pub fn u64_or(&self, key: &str, default: u64) -> Result<u64> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_u64()
                .ok_or_else(|| ConfigError::wrong_type(key, "unsigned integer")),
        }
    }

    pub fn u32_or(&self, key: &str, default: u32) -> Result<u32> {
        let value = self.u64_or(key, u64::from(default))?;
        u32::try_from(value).map_err(|_| ConfigError::out_of_range(key, value))
    }

    pub fn u16_or(&self, key: &str, default: u16) -> Result<u16> {
        let value = self.u64_or(key, u64::from(default))?;
        u16::try_from(value).map_err(|_| ConfigError::out_of_range(key, value))
    }

    pub fn usize_or(&self, key: &str, default: usize) -> Result<usize> {
        let value = self.u64_or(key, default as u64)?;
        usize::try_from(value).map_err(|_| ConfigError::out_of_range(key, value))
    }

    /// Like [`ConfigMap::u64_or`] but rejects zero
    pub fn positive_u64_or(&self, key: &str, default: u64) -> Result<u64> {
        match self.u64_or(key, default)? {
            0 => Err(ConfigError::out_of_range(key, 0)),
            value => Ok(value),
        }
    }

    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_bool()
                .ok_or_else(|| ConfigError::wrong_type(key, "boolean")),
        }
    }

    pub fn str_or(&self, key: &str, default: &'a str) -> Result<&'a str> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_str()
                .ok_or_else(|| ConfigError::wrong_type(key, "string")),
        }
    }
}

/// Settings shared by every stage: post-filter prescale and pre-filter bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageConfig {
    pub prescale: u64,
    /// Items whose duration exceeds this are rejected before processing
    pub max_duration: Timestamp,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            prescale: 1,
            max_duration: Timestamp::MAX,
        }
    }
}

impl StageConfig {
    /// Keys for a primitive -> activity stage: `prescale`, `max_tot`
    pub fn for_activity_stage(config: &ConfigMap<'_>) -> Result<Self> {
        Ok(Self {
            prescale: config.positive_u64_or("prescale", 1)?,
            max_duration: config.u64_or("max_tot", Timestamp::MAX)?,
        })
    }

    /// Keys for an activity -> candidate stage: `prescale`. Activities are
    /// not duration-filtered.
    pub fn for_candidate_stage(config: &ConfigMap<'_>) -> Result<Self> {
        Ok(Self {
            prescale: config.positive_u64_or("prescale", 1)?,
            max_duration: Timestamp::MAX,
        })
    }
}

/// Output type of a candidate stage from `tc_type_name`
pub fn candidate_type_or(config: &ConfigMap<'_>, default: CandidateType) -> Result<CandidateType> {
    match config.get("tc_type_name") {
        None => Ok(default),
        Some(Value::String(name)) => name.parse(),
        Some(_) => Err(ConfigError::wrong_type("tc_type_name", "string")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_when_keys_absent() {
        // Test: missing keys fall back to documented defaults
        let value = json!({ "unrelated": "ignored" });
        let config = ConfigMap::new(&value);

        let stage = StageConfig::for_activity_stage(&config).unwrap();
        assert_eq!(stage, StageConfig::default());
        assert_eq!(config.u16_or("adj_tolerance", 3).unwrap(), 3);
        assert!(!config.bool_or("trigger_on_adc", false).unwrap());
    }

    #[test]
    fn test_non_object_is_empty() {
        let value = json!(null);
        let config = ConfigMap::new(&value);

        assert!(!config.contains("prescale"));
        assert_eq!(config.u64_or("window_length", 8000).unwrap(), 8000);
    }

    #[test]
    fn test_custom_values() {
        let value = json!({ "prescale": 3, "max_tot": 500, "adj_tolerance": 5 });
        let config = ConfigMap::new(&value);

        let stage = StageConfig::for_activity_stage(&config).unwrap();
        assert_eq!(stage.prescale, 3);
        assert_eq!(stage.max_duration, 500);
        assert_eq!(config.u16_or("adj_tolerance", 3).unwrap(), 5);
    }

    #[test]
    fn test_wrong_shape_fails() {
        // Edge case: non-numeric where numeric expected is a configuration failure
        let value = json!({ "prescale": "three", "trigger_on_adc": 1 });
        let config = ConfigMap::new(&value);

        assert_eq!(
            StageConfig::for_activity_stage(&config).unwrap_err(),
            ConfigError::wrong_type("prescale", "unsigned integer")
        );
        assert!(config.bool_or("trigger_on_adc", false).is_err());
    }

    #[test]
    fn test_negative_and_overflowing_values_fail() {
        let value = json!({ "window_length": -5, "adj_tolerance": 70000 });
        let config = ConfigMap::new(&value);

        assert!(config.u64_or("window_length", 1).is_err());
        assert!(matches!(
            config.u16_or("adj_tolerance", 3),
            Err(ConfigError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_zero_prescale_rejected() {
        let value = json!({ "prescale": 0 });
        let config = ConfigMap::new(&value);

        assert!(StageConfig::for_candidate_stage(&config).is_err());
    }

    #[test]
    fn test_candidate_type_lookup() {
        let value = json!({ "tc_type_name": "supernova" });
        let config = ConfigMap::new(&value);
        assert_eq!(
            candidate_type_or(&config, CandidateType::Prescale).unwrap(),
            CandidateType::Supernova
        );

        let value = json!({ "tc_type_name": "not_a_type" });
        let config = ConfigMap::new(&value);
        assert_eq!(
            candidate_type_or(&config, CandidateType::Prescale).unwrap_err(),
            ConfigError::UnknownCandidateType("not_a_type".to_string())
        );

        assert_eq!(
            candidate_type_or(&ConfigMap::empty(), CandidateType::Prescale).unwrap(),
            CandidateType::Prescale
        );
    }

    #[test]
    fn test_section_lookup() {
        let value = json!({ "activity_maker": { "algorithm": "prescale" }, "candidate_maker": 4 });
        let config = ConfigMap::new(&value);

        let section = config.section("activity_maker").unwrap();
        assert_eq!(section.str_or("algorithm", "").unwrap(), "prescale");
        assert!(config.section("candidate_maker").is_err());
        assert_eq!(
            config.section("missing").unwrap_err(),
            ConfigError::MissingSection("missing".to_string())
        );
    }
}
