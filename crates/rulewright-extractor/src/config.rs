//! Configuration for the Rule Extractor

use rulewright_domain::table::DEFAULT_PRIORITY;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How multi-clause rule text is sent to the LLM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClauseMode {
    /// One call for the whole text; the response may hold several rules
    #[default]
    WholeText,
    /// One call per clause; every call must yield exactly one rule
    PerClause,
}

/// Configuration for the Rule Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum input text length (characters)
    pub max_text_length: usize,

    /// Maximum time for a single LLM call (seconds)
    pub extraction_timeout_secs: u64,

    /// Whole-text or per-clause extraction
    pub clause_mode: ClauseMode,

    /// Priority of rules that state none
    pub default_priority: i32,

    /// Priority of baseline rules (further clamped below every other rule)
    pub baseline_priority: i32,
}

impl ExtractorConfig {
    /// Get the extraction timeout as a Duration
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.extraction_timeout_secs == 0 {
            return Err("extraction_timeout_secs must be greater than 0".to_string());
        }
        if self.baseline_priority > self.default_priority {
            return Err("baseline_priority cannot exceed default_priority".to_string());
        }
        Ok(())
    }

    /// Aggressive preset: short texts, short timeouts
    pub fn aggressive() -> Self {
        Self {
            max_text_length: 2_000,
            extraction_timeout_secs: 20,
            ..Self::default()
        }
    }

    /// Lenient preset: long texts, one call per clause, long timeouts
    pub fn lenient() -> Self {
        Self {
            max_text_length: 50_000,
            extraction_timeout_secs: 180,
            clause_mode: ClauseMode::PerClause,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_text_length: 10_000,
            extraction_timeout_secs: 60,
            clause_mode: ClauseMode::WholeText,
            default_priority: DEFAULT_PRIORITY,
            baseline_priority: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(ExtractorConfig::default().validate().is_ok());
        assert!(ExtractorConfig::aggressive().validate().is_ok());
        assert!(ExtractorConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        let mut config = ExtractorConfig::default();
        config.max_text_length = 0;
        assert!(config.validate().is_err());

        let mut config = ExtractorConfig::default();
        config.baseline_priority = config.default_priority + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig::lenient();
        let parsed = ExtractorConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ExtractorConfig::from_toml("clause_mode = \"per_clause\"").unwrap();
        assert_eq!(config.clause_mode, ClauseMode::PerClause);
        assert_eq!(config.max_text_length, 10_000);
    }
}
