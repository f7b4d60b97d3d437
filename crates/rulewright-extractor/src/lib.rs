//! Rulewright Rule Extractor
//!
//! Converts natural-language rule text into [`StructuredRule`]s using an LLM.
//!
//! # Architecture
//!
//! ```text
//! Rule text → RuleExtractor → LLM (rules schema) → parse + coerce → StructuredRule*
//! ```
//!
//! The LLM does the language understanding. The extractor owns the prompt
//! and output schema, the coercion of loosely typed answers (operator
//! aliases, numeric text, comma lists) and the invariant checks.
//!
//! # Example Usage
//!
//! ```no_run
//! use rulewright_extractor::{ExtractionRequest, ExtractorConfig, RuleExtractor};
//! use rulewright_llm::MockProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new(r#"{"rules": []}"#);
//! let extractor = RuleExtractor::new(llm, ExtractorConfig::default());
//!
//! let request = ExtractionRequest::new(
//!     "If restaurant size is large then assign 10 employees",
//!     "RestaurantData",
//!     "EmployeeRecommendation",
//! );
//! let rules = extractor.extract(request).await?;
//! println!("Extracted {} rules", rules.len());
//! # Ok(())
//! # }
//! ```
//!
//! [`StructuredRule`]: rulewright_domain::StructuredRule

#![warn(missing_docs)]

mod clauses;
mod config;
mod error;
mod extractor;
mod parser;
mod prompt;
mod types;


pub use clauses::{split_clauses, CLAUSE_SEPARATORS};
pub use config::{ClauseMode, ExtractorConfig};
pub use error::ExtractionError;
pub use extractor::{order_rules, RuleExtractor};
pub use parser::extract_json;
pub use prompt::RULES_SCHEMA;
pub use types::ExtractionRequest;

/// Phrase every extraction prompt starts with
pub const EXTRACTION_PROMPT_MARKER: &str = "Extract decision rules";
