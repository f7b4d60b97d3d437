//! Gatekeeper error types

use crate::validator::RejectionReason;
use std::fmt;
use thiserror::Error;

/// Validation check a candidate failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationCategory {
    /// Not parseable, or required fields missing
    Structure,
    /// `{{marker}}` left in the candidate
    UnresolvedSlots,
    /// Template scaffolding altered
    StaticFragments,
    /// Rows, cells and columns disagree in count or order
    Arity,
    /// Data types, values or identifiers are wrong
    Types,
}

impl ValidationCategory {
    /// All categories, in the order they are checked
    pub const ALL: [ValidationCategory; 5] = [
        ValidationCategory::Structure,
        ValidationCategory::UnresolvedSlots,
        ValidationCategory::StaticFragments,
        ValidationCategory::Arity,
        ValidationCategory::Types,
    ];

    /// Get the category name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCategory::Structure => "structure",
            ValidationCategory::UnresolvedSlots => "unresolved_slots",
            ValidationCategory::StaticFragments => "static_fragments",
            ValidationCategory::Arity => "arity",
            ValidationCategory::Types => "types",
        }
    }
}

impl fmt::Display for ValidationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rejected candidate: the first failing category and its reasons
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Validation failed ({category}): {}", summarize(.reasons))]
pub struct ValidationError {
    /// First category that failed
    pub category: ValidationCategory,

    /// Reasons within that category (never empty)
    pub reasons: Vec<RejectionReason>,
}

impl ValidationError {
    /// Reasons rendered as feedback lines for regeneration
    pub fn messages(&self) -> Vec<String> {
        self.reasons.iter().map(ToString::to_string).collect()
    }
}

fn summarize(reasons: &[RejectionReason]) -> String {
    reasons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
