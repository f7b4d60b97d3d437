//! Error types for the Slot Filler

use rulewright_template::TemplateError;
use thiserror::Error;

/// Errors that can occur while filling the template
///
/// Malformed LLM output is not an error here: it becomes a candidate with
/// unresolved slots and is left for the validator to reject.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The LLM did not answer in time
    #[error("Generation timeout after {0} ms")]
    Timeout(u64),

    /// Nothing to lay out
    #[error("No rules to fill the table with")]
    NoRules,

    /// A rule reasons over a fact type other than the table's
    #[error("Rule {rule} uses fact type {found}, the table uses {expected}")]
    FactTypeMismatch {
        /// Index of the rule in the batch
        rule: usize,
        /// Type the rule names
        found: String,
        /// Type the table metadata names
        expected: String,
    },

    /// The template refused a value
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
