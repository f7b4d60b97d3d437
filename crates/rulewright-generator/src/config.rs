//! Configuration for the Slot Filler

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Slot Filler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Maximum time for a single naming call (seconds)
    pub generation_timeout_secs: u64,

    /// Maximum exemplars shown to the LLM
    pub max_exemplars: usize,

    /// Maximum rejection reasons fed back on a retry
    pub max_feedback_reasons: usize,
}

impl GeneratorConfig {
    /// Get the generation timeout as a Duration
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.generation_timeout_secs == 0 {
            return Err("generation_timeout_secs must be greater than 0".to_string());
        }
        if self.max_exemplars > 5 {
            return Err("max_exemplars cannot exceed 5".to_string());
        }
        if self.max_feedback_reasons == 0 {
            return Err("max_feedback_reasons must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Aggressive preset: short timeouts, small prompts
    pub fn aggressive() -> Self {
        Self {
            generation_timeout_secs: 20,
            max_exemplars: 1,
            max_feedback_reasons: 5,
        }
    }

    /// Lenient preset: long timeouts, full guidance
    pub fn lenient() -> Self {
        Self {
            generation_timeout_secs: 180,
            max_exemplars: 5,
            max_feedback_reasons: 25,
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

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            generation_timeout_secs: 60,
            max_exemplars: 3,
            max_feedback_reasons: 10,
        }
    }
}
