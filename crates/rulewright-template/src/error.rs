//! Error types for schema templates

use thiserror::Error;

/// Errors raised while loading or rendering a schema template
#[derive(Error, Debug)]
pub enum TemplateError {
    /// A fragment uses a marker that the slot catalog does not declare
    #[error("Fragment '{fragment}' uses undeclared slot '{slot}'")]
    UndeclaredSlot {
        /// Fragment containing the marker
        fragment: String,
        /// Marker name
        slot: String,
    },

    /// A declared dynamic slot never occurs in any fragment
    #[error("Dynamic slot '{0}' does not occur in any fragment")]
    UnusedSlot(String),

    /// A dynamic slot occurs more than once in one fragment
    #[error("Slot '{slot}' occurs more than once in fragment '{fragment}'")]
    DuplicateSlot {
        /// Fragment containing the marker
        fragment: String,
        /// Marker name
        slot: String,
    },

    /// A slot sits inside a JSON string but its type is spliced raw, or the reverse
    #[error("Slot '{slot}' in fragment '{fragment}' is placed where its type cannot be spliced")]
    Placement {
        /// Fragment containing the marker
        fragment: String,
        /// Marker name
        slot: String,
    },

    /// A fragment required by the template is missing
    #[error("Missing fragment: {0}")]
    MissingFragment(String),

    /// The skeleton does not render to a JSON object
    #[error("Invalid skeleton in fragment '{fragment}': {message}")]
    InvalidSkeleton {
        /// Offending fragment
        fragment: String,
        /// Parser message
        message: String,
    },

    /// A supplied value does not have the slot's declared type
    #[error("Value for slot '{slot}' must be a {expected}")]
    SlotTypeMismatch {
        /// Slot name
        slot: String,
        /// Expected type description
        expected: String,
    },

    /// A compiled document could not be read
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// The slot marker pattern failed to compile
    #[error("Invalid marker pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
