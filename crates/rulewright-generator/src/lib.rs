//! Rulewright Slot Filler
//!
//! Produces slot-filled instances of the schema template from a batch of
//! structured rules.
//!
//! # Architecture
//!
//! ```text
//! StructuredRule* → TableLayout ─────────────────────┐
//!                       │                            ├→ render → candidate
//! exemplars, feedback → LLM (naming schema) → names ─┘
//! ```
//!
//! Generation is constrained template completion. Columns, rows, cell
//! values and data types follow from the rules alone and are laid out
//! deterministically; the LLM only names things (table, headers, row
//! descriptions). Static scaffolding comes from the template and is never
//! generated.

#![warn(missing_docs)]

mod config;
mod error;
mod filler;
mod layout;
mod naming;
mod prompt;

#[cfg(test)]
mod tests;

pub use config::GeneratorConfig;
pub use error::GenerationError;
pub use filler::{binding_for, render_candidate, FillRequest, SlotFiller};
pub use layout::{fact_field_of, ActionColumnSpec, ConditionColumnSpec, RowSpec, TableLayout};
pub use naming::{is_kebab_case, slugify, TableNaming, NAMING_SCHEMA};
pub use prompt::GenerationPromptBuilder;

/// Phrase every naming prompt starts with
pub const NAMING_PROMPT_MARKER: &str = "Name the decision table";
