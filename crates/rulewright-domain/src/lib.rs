//! Rulewright Domain Layer
//!
//! Value types and boundary traits shared by every stage of the rule
//! compilation pipeline. This crate has no infrastructure dependencies:
//! it only describes what a structured rule, an exemplar and a table's
//! metadata are, and which external capabilities the pipeline consumes.
//!
//! ## Key Concepts
//!
//! - **StructuredRule**: conditions, actions and a priority extracted from a
//!   natural-language rule
//! - **Exemplar**: a previously compiled (rule text, document) pair used as
//!   few-shot guidance
//! - **TableMetadata**: naming and fact types of the decision table being built
//! - **FactModel**: optional declaration of the fact types and their fields
//!
//! ## Architecture
//!
//! - Pure value types only
//! - Trait definitions for the language-understanding capability and the
//!   example index live in [`traits`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod exemplar;
pub mod fact;
pub mod rule;
pub mod table;
pub mod traits;

// Re-exports for convenience
pub use exemplar::{Exemplar, ExemplarId};
pub use fact::{FactModel, FactType};
pub use rule::{
    is_identifier, to_identifier, Action, Condition, ConditionValue, Literal, LiteralKind,
    Operator, RuleViolation, StructuredRule,
};
pub use table::TableMetadata;
