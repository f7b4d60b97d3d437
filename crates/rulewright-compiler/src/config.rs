//! Compiler configuration: the single snapshot every compilation runs under

use rulewright_domain::table::{
    DEFAULT_IMPORT_PREFIX, DEFAULT_INPUT_TYPE, DEFAULT_PACKAGE, DEFAULT_PRIORITY,
    DEFAULT_TARGET_TYPE,
};
use rulewright_domain::{is_identifier, FactModel, FactType, TableMetadata};
use rulewright_extractor::ExtractorConfig;
use rulewright_gatekeeper::ValidationConfig;
use rulewright_generator::GeneratorConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Most exemplars a single retrieval may return
pub const MAX_RETRIEVAL_K: usize = 5;

/// How the rules of one request map onto documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClausePolicy {
    /// Every rule of the request becomes a row of one table
    #[default]
    SingleTable,
    /// Every rule becomes its own single-row table
    TablePerClause,
}

/// Bounded retry behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Regenerations allowed after a validation rejection
    pub max_retries: u32,

    /// Retries allowed after a capability timeout (extraction or generation)
    pub max_timeout_retries: u32,

    /// First backoff delay (milliseconds)
    pub backoff_base_ms: u64,

    /// Largest backoff delay (milliseconds)
    pub backoff_max_ms: u64,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`, capped
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        let delay = self.backoff_base_ms.saturating_mul(1u64 << exponent);
        Duration::from_millis(delay.min(self.backoff_max_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_timeout_retries: 2,
            backoff_base_ms: 250,
            backoff_max_ms: 4_000,
        }
    }
}

/// Table metadata applied when a request brings none
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableDefaults {
    /// Package of generated tables
    pub package_name: String,

    /// Package the fact types are imported from
    pub import_prefix: String,

    /// Fact type conditions reason over
    pub input_type: String,

    /// Fact type actions modify
    pub target_type: String,

    /// Salience of rules that state none
    pub default_priority: i32,

    /// Declared fact types by simple name; empty leaves fields unchecked
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub facts: BTreeMap<String, FactTypeSettings>,
}

/// One declared fact type, as written under `[table.facts.<Name>]`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FactTypeSettings {
    /// Package the type is imported from (falls back to `import_prefix`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    /// Field name to type name
    pub fields: BTreeMap<String, String>,
}

impl TableDefaults {
    /// Metadata for a request without a fixed table name
    pub fn metadata(&self) -> TableMetadata {
        let mut metadata = TableMetadata::default().with_types(
            &self.import_prefix,
            self.input_type.as_str(),
            self.target_type.as_str(),
        );
        metadata.package_name = self.package_name.clone();
        metadata.default_priority = self.default_priority;
        match self.fact_model() {
            Some(model) => metadata.with_fact_model(model),
            None => metadata,
        }
    }

    /// Fact model of the declared types, if any are declared
    pub fn fact_model(&self) -> Option<FactModel> {
        if self.facts.is_empty() {
            return None;
        }
        let model = self.facts.iter().fold(FactModel::new(), |model, (name, settings)| {
            let fact_type = FactType {
                package: Some(
                    settings
                        .package
                        .clone()
                        .unwrap_or_else(|| self.import_prefix.clone()),
                ),
                fields: settings.fields.clone(),
            };
            model.with_type(name.as_str(), fact_type)
        });
        Some(model)
    }

    fn validate_facts(&self) -> Result<(), String> {
        for (name, settings) in &self.facts {
            if !is_identifier(name) || name.contains('.') {
                return Err(format!("fact type '{}' is not a simple type name", name));
            }
            if settings.fields.is_empty() {
                return Err(format!("fact type '{}' declares no fields", name));
            }
            if let Some(field) = settings.fields.keys().find(|f| !is_identifier(f)) {
                return Err(format!("field '{}' of {} is not an identifier", field, name));
            }
        }
        Ok(())
    }
}

impl Default for TableDefaults {
    fn default() -> Self {
        Self {
            package_name: DEFAULT_PACKAGE.to_string(),
            import_prefix: DEFAULT_IMPORT_PREFIX.to_string(),
            input_type: DEFAULT_INPUT_TYPE.to_string(),
            target_type: DEFAULT_TARGET_TYPE.to_string(),
            default_priority: DEFAULT_PRIORITY,
            facts: BTreeMap::new(),
        }
    }
}

/// Configuration for the Compiler
///
/// Passed in at construction; a compilation depends only on this snapshot
/// and its request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Exemplars retrieved per table
    pub retrieval_k: usize,

    /// Upper bound for every capability call (milliseconds)
    pub call_timeout_ms: u64,

    /// Append `(rule text, document)` to the example index after success
    pub record_exemplars: bool,

    /// One table per request or one per rule
    pub clause_policy: ClausePolicy,

    /// Retry limits and backoff
    pub retry: RetryPolicy,

    /// Metadata used when a request brings none
    pub table: TableDefaults,

    /// Rule Extractor settings
    pub extractor: ExtractorConfig,

    /// Slot Filler settings
    pub generator: GeneratorConfig,

    /// Validator settings
    pub validation: ValidationConfig,
}

impl CompilerConfig {
    /// Get the per-call timeout as a Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Retrieval size after applying the hard cap
    pub fn effective_k(&self) -> usize {
        self.retrieval_k.min(MAX_RETRIEVAL_K)
    }

    /// Validate the configuration, including every nested section
    pub fn validate(&self) -> Result<(), String> {
        if self.retrieval_k > MAX_RETRIEVAL_K {
            return Err(format!("retrieval_k cannot exceed {}", MAX_RETRIEVAL_K));
        }
        if self.call_timeout_ms == 0 {
            return Err("call_timeout_ms must be greater than 0".to_string());
        }
        if self.retry.backoff_max_ms < self.retry.backoff_base_ms {
            return Err("backoff_max_ms cannot be less than backoff_base_ms".to_string());
        }
        if self.table.input_type.trim().is_empty() || self.table.target_type.trim().is_empty() {
            return Err("input_type and target_type must be set".to_string());
        }
        self.table.validate_facts().map_err(|e| format!("table: {}", e))?;
        self.extractor.validate().map_err(|e| format!("extractor: {}", e))?;
        self.generator.validate().map_err(|e| format!("generator: {}", e))?;
        self.validation.validate().map_err(|e| format!("validation: {}", e))?;
        Ok(())
    }

    /// Aggressive preset: few retries, short timeouts
    pub fn aggressive() -> Self {
        Self {
            retrieval_k: 1,
            call_timeout_ms: 20_000,
            retry: RetryPolicy {
                max_retries: 1,
                max_timeout_retries: 0,
                backoff_base_ms: 100,
                backoff_max_ms: 1_000,
            },
            extractor: ExtractorConfig::aggressive(),
            generator: GeneratorConfig::aggressive(),
            ..Self::default()
        }
    }

    /// Lenient preset: more retries, long timeouts
    pub fn lenient() -> Self {
        Self {
            retrieval_k: MAX_RETRIEVAL_K,
            call_timeout_ms: 180_000,
            retry: RetryPolicy {
                max_retries: 6,
                max_timeout_retries: 4,
                backoff_base_ms: 500,
                backoff_max_ms: 8_000,
            },
            extractor: ExtractorConfig::lenient(),
            generator: GeneratorConfig::lenient(),
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

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            retrieval_k: 3,
            call_timeout_ms: 60_000,
            record_exemplars: true,
            clause_policy: ClausePolicy::SingleTable,
            retry: RetryPolicy::default(),
            table: TableDefaults::default(),
            extractor: ExtractorConfig::default(),
            generator: GeneratorConfig::default(),
            validation: ValidationConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CompilerConfig::default();
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.max_timeout_retries, 2);
        assert_eq!(config.retrieval_k, 3);
        assert_eq!(config.call_timeout(), Duration::from_secs(60));
        assert!(config.record_exemplars);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(CompilerConfig::aggressive().validate().is_ok());
        assert!(CompilerConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let retry = RetryPolicy::default();
        assert_eq!(retry.backoff(1), Duration::from_millis(250));
        assert_eq!(retry.backoff(2), Duration::from_millis(500));
        assert_eq!(retry.backoff(3), Duration::from_millis(1_000));
        assert_eq!(retry.backoff(10), Duration::from_millis(4_000));
        assert_eq!(retry.backoff(u32::MAX), Duration::from_millis(4_000));
    }

    #[test]
    fn test_retrieval_k_capped() {
        let config = CompilerConfig {
            retrieval_k: 6,
            ..CompilerConfig::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.effective_k(), MAX_RETRIEVAL_K);
    }

    #[test]
    fn test_nested_section_errors_are_prefixed() {
        let mut config = CompilerConfig::default();
        config.generator.max_exemplars = 9;
        assert!(config.validate().unwrap_err().starts_with("generator:"));
    }

    #[test]
    fn test_table_defaults_build_metadata() {
        let defaults = TableDefaults {
            import_prefix: "com.acme.facts".to_string(),
            input_type: "Order".to_string(),
            target_type: "Discount".to_string(),
            ..TableDefaults::default()
        };
        let metadata = defaults.metadata();
        assert_eq!(metadata.input_type, "Order");
        assert_eq!(metadata.imports[1], "com.acme.facts.Discount");
        assert_eq!(metadata.package_name, DEFAULT_PACKAGE);
        assert!(metadata.table_name.is_none());
    }

    #[test]
    fn test_toml_sections() {
        let toml = r#"
            clause_policy = "table_per_clause"

            [retry]
            max_retries = 5

            [table]
            input_type = "Order"
        "#;
        let config = CompilerConfig::from_toml(toml).unwrap();
        assert_eq!(config.clause_policy, ClausePolicy::TablePerClause);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.max_timeout_retries, 2);
        assert_eq!(config.table.input_type, "Order");
        assert_eq!(config.table.target_type, DEFAULT_TARGET_TYPE);
    }

    #[test]
    fn test_fact_model_section() {
        let toml = r#"
            [table]
            import_prefix = "com.acme.ops"

            [table.facts.RestaurantData.fields]
            size = "String"
            dailyCustomers = "int"

            [table.facts.EmployeeRecommendation]
            package = "com.acme.staffing"

            [table.facts.EmployeeRecommendation.fields]
            employeeCount = "int"
        "#;
        let config = CompilerConfig::from_toml(toml).unwrap();
        assert!(config.validate().is_ok());

        let metadata = config.table.metadata();
        assert_eq!(
            metadata.imports,
            vec![
                "com.acme.ops.RestaurantData".to_string(),
                "com.acme.staffing.EmployeeRecommendation".to_string(),
            ]
        );
        let model = metadata.fact_model.unwrap();
        assert!(model.get("RestaurantData").unwrap().has_field("dailyCustomers"));
        assert!(model
            .get("EmployeeRecommendation")
            .unwrap()
            .accepts_target("setEmployeeCount"));

        assert_eq!(CompilerConfig::from_toml(&config.to_toml().unwrap()).unwrap(), config);
    }

    #[test]
    fn test_fact_model_rejects_bad_names() {
        let mut config = CompilerConfig::default();
        config.table.facts.insert(
            "RestaurantData".to_string(),
            FactTypeSettings {
                package: None,
                fields: BTreeMap::from([("seating capacity".to_string(), "int".to_string())]),
            },
        );
        assert!(config.validate().unwrap_err().starts_with("table:"));

        config.table.facts.clear();
        config.table.facts.insert("RestaurantData".to_string(), FactTypeSettings::default());
        assert!(config.validate().unwrap_err().contains("declares no fields"));
    }

    #[test]
    fn test_no_facts_means_no_model() {
        assert!(TableDefaults::default().metadata().fact_model.is_none());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = CompilerConfig::lenient();
        assert_eq!(CompilerConfig::from_toml(&config.to_toml().unwrap()).unwrap(), config);
    }
}
