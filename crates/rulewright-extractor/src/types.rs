//! Request types for the Rule Extractor

use rulewright_domain::FactModel;
use std::time::Duration;

/// A request to extract structured rules from rule text
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    /// Raw rule text
    pub rule_text: String,

    /// Fact type conditions reason over, unless the text names another
    pub input_type: String,

    /// Fact type actions modify, unless the text names another
    pub target_type: String,

    /// Priority of rules that state none (falls back to the configured default)
    pub default_priority: Option<i32>,

    /// Upper bound for each LLM call (falls back to the configured timeout)
    pub timeout: Option<Duration>,

    /// Declared fact types; extracted fields and targets must exist in it
    pub fact_model: Option<FactModel>,
}

impl ExtractionRequest {
    /// Create a request with configured defaults for priority and timeout
    pub fn new(
        rule_text: impl Into<String>,
        input_type: impl Into<String>,
        target_type: impl Into<String>,
    ) -> Self {
        Self {
            rule_text: rule_text.into(),
            input_type: input_type.into(),
            target_type: target_type.into(),
            default_priority: None,
            timeout: None,
            fact_model: None,
        }
    }

    /// Set the priority of rules that state none
    pub fn with_default_priority(mut self, priority: i32) -> Self {
        self.default_priority = Some(priority);
        self
    }

    /// Bound each LLM call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Ground extraction in declared fact types
    pub fn with_fact_model(mut self, model: FactModel) -> Self {
        self.fact_model = Some(model);
        self
    }
}
