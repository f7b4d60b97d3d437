//! Rulewright Schema Template
//!
//! The parameterized decision-table skeleton every compiled document is an
//! instance of. A template is a set of named fragments whose text mixes
//! fixed scaffolding with `{{slot}}` markers, and a catalog of typed
//! [`TemplateSlot`]s that says which markers are static and what each
//! dynamic marker must be filled with.
//!
//! ## Key Concepts
//!
//! - **Static slots** are resolved into the scaffolding when the template
//!   loads, so the scaffolding is fixed text that filled documents must
//!   reproduce byte for byte
//! - **Dynamic slots** are filled per instance; values are JSON-escaped so
//!   no value can change the surrounding structure
//! - **CompiledDocument** wraps validated text and offers a typed
//!   [`DecisionTable`] view, GDST XML export and DRL export

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod drl;
pub mod error;
pub mod fragment;
pub mod gdst;
pub mod slot;
pub mod template;

pub use document::{
    ActionColumn, AttributeColumn, Cell, CompiledDocument, ConditionColumn, ConditionPattern,
    DataType, DecisionTable, Row,
};
pub use error::TemplateError;
pub use fragment::{Fragment, Segment};
pub use slot::{FragmentKind, SlotKind, SlotType, SlotValue, SlotValues, TemplateSlot};
pub use template::{
    slots, SchemaTemplate, ATTRIBUTE_HEADER, DECISION_TABLE_V1, FRAGMENT_SEPARATOR,
    MARKER_PATTERN,
};
