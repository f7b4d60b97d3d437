//! Gatekeeper configuration

use serde::{Deserialize, Serialize};

/// Configuration for validation rules
///
/// Structure, unresolved-slot and arity checks always run; they are what
/// makes a candidate a decision table at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Require the template scaffolding to be reproduced unchanged
    pub check_static_fragments: bool,

    /// Enable data type, value, name and operator checks
    pub check_types: bool,

    /// Maximum reasons reported for the failing category
    pub max_reasons_per_category: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            check_static_fragments: true,
            check_types: true,
            max_reasons_per_category: 20,
        }
    }
}

impl ValidationConfig {
    /// Create a permissive configuration (structural checks only)
    pub fn permissive() -> Self {
        Self {
            check_static_fragments: false,
            check_types: false,
            max_reasons_per_category: 5,
        }
    }

    /// Create a strict configuration (all validations enabled, full report)
    pub fn strict() -> Self {
        Self {
            check_static_fragments: true,
            check_types: true,
            max_reasons_per_category: 100,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_reasons_per_category == 0 {
            return Err("max_reasons_per_category must be greater than 0".to_string());
        }
        Ok(())
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
