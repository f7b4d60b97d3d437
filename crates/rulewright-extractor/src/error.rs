//! Error types for the Rule Extractor

use thiserror::Error;

/// Errors that can occur during extraction
///
/// Only [`ExtractionError::Timeout`] is worth retrying; every other variant
/// means the text cannot be mapped to a structured rule as it stands.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Rule text is empty after trimming
    #[error("Rule text is empty")]
    EmptyInput,

    /// Text exceeds maximum length
    #[error("Text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// The LLM did not answer in time
    #[error("Extraction timeout after {0} ms")]
    Timeout(u64),

    /// Response is not the requested JSON shape
    #[error("Invalid rule format: {0}")]
    InvalidFormat(String),

    /// Response holds no rules
    #[error("No rules found in text")]
    NoRules,

    /// A rule has no actions
    #[error("Rule {0} has no actions")]
    NoActions(usize),

    /// A non-baseline rule has no conditions
    #[error("Rule {0} has no conditions and is not a baseline rule")]
    MissingConditions(usize),

    /// A condition uses an operator outside the supported set
    #[error("Rule {rule} uses unknown operator '{operator}'")]
    UnknownOperator {
        /// Index of the rule in the response
        rule: usize,
        /// Operator as written by the LLM
        operator: String,
    },

    /// A value cannot be coerced to what its operator or action needs
    #[error("Rule {rule}: {message}")]
    InvalidValue {
        /// Index of the rule in the response
        rule: usize,
        /// What was wrong
        message: String,
    },

    /// A field or action target is not declared in the fact model
    #[error("Rule {rule}: '{field}' is not a field of {fact_type}")]
    UnknownField {
        /// Index of the rule in the response
        rule: usize,
        /// Fact type the field was looked up in
        fact_type: String,
        /// Field or target as extracted
        field: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractionError {
    /// Whether the orchestrator may retry the extraction
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExtractionError::Timeout(_))
    }
}

impl From<serde_json::Error> for ExtractionError {
    fn from(e: serde_json::Error) -> Self {
        ExtractionError::InvalidFormat(format!("JSON parse error: {}", e))
    }
}
