//! Typed template slots
//!
//! A slot is a named `{{marker}}` in a skeleton fragment. Dynamic slots are
//! filled per instance; static slots carry a fixed value that becomes part
//! of the scaffolding when the template is loaded.

use crate::document::DataType;
use crate::error::TemplateError;
use std::collections::HashMap;
use std::fmt;

/// Which repeated fragment a `Fragments` slot expands to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FragmentKind {
    /// Document frame (one per document)
    Frame,
    /// One condition column
    ConditionColumn,
    /// One action column
    ActionColumn,
    /// One data row
    Row,
    /// One cell of a row
    Cell,
}

impl FragmentKind {
    /// All fragment kinds, frame first
    pub const ALL: [FragmentKind; 5] = [
        FragmentKind::Frame,
        FragmentKind::ConditionColumn,
        FragmentKind::ActionColumn,
        FragmentKind::Row,
        FragmentKind::Cell,
    ];

    /// Get the fragment name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentKind::Frame => "frame",
            FragmentKind::ConditionColumn => "condition_column",
            FragmentKind::ActionColumn => "action_column",
            FragmentKind::Row => "row",
            FragmentKind::Cell => "cell",
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected type of a slot's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotType {
    /// Free text, spliced inside a JSON string
    Text,
    /// Type, field or package identifier, spliced inside a JSON string
    Identifier,
    /// Whole number, spliced raw
    Integer,
    /// Column data type name, spliced inside a JSON string
    DataType,
    /// Any JSON value, spliced raw
    JsonValue,
    /// Rendered instances of another fragment, spliced raw
    Fragments(FragmentKind),
}

impl SlotType {
    /// Whether values of this type are spliced inside a JSON string literal
    pub fn is_quoted(&self) -> bool {
        matches!(self, SlotType::Text | SlotType::Identifier | SlotType::DataType)
    }

    fn describe(&self) -> &'static str {
        match self {
            SlotType::Text => "text",
            SlotType::Identifier => "identifier",
            SlotType::Integer => "integer",
            SlotType::DataType => "data type",
            SlotType::JsonValue => "JSON value",
            SlotType::Fragments(_) => "fragments",
        }
    }
}

/// Whether a slot must be filled or is fixed by the template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotKind {
    /// Must be filled with a value for every instance
    Dynamic,
    /// Fixed by the template; preserved verbatim
    Static(String),
}

/// A named placeholder of the schema template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSlot {
    /// Marker name, as written between `{{` and `}}`
    pub name: String,
    /// Dynamic or static
    pub kind: SlotKind,
    /// Expected value type
    pub value_type: SlotType,
}

impl TemplateSlot {
    /// Declare a slot that must be filled
    pub fn dynamic(name: impl Into<String>, value_type: SlotType) -> Self {
        Self {
            name: name.into(),
            kind: SlotKind::Dynamic,
            value_type,
        }
    }

    /// Declare a slot fixed to `value`
    pub fn fixed(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SlotKind::Static(value.into()),
            value_type: SlotType::Text,
        }
    }

    /// Whether the slot must be filled
    pub fn is_dynamic(&self) -> bool {
        matches!(self.kind, SlotKind::Dynamic)
    }
}

/// A value supplied for a dynamic slot
#[derive(Debug, Clone, PartialEq)]
pub enum SlotValue {
    /// Text or identifier
    Text(String),
    /// Whole number
    Integer(i64),
    /// Column data type
    DataType(DataType),
    /// Any JSON value
    Json(serde_json::Value),
    /// Already rendered fragment instances
    Fragments(Vec<String>),
}

impl SlotValue {
    /// Encode the value for splicing at a slot of type `value_type`
    ///
    /// Quoted values are JSON-escaped without their surrounding quotes, so a
    /// value can never close the string literal it is spliced into.
    pub(crate) fn encode(&self, slot: &str, value_type: SlotType) -> Result<String, TemplateError> {
        let mismatch = || TemplateError::SlotTypeMismatch {
            slot: slot.to_string(),
            expected: value_type.describe().to_string(),
        };

        match (value_type, self) {
            (SlotType::Text | SlotType::Identifier, SlotValue::Text(text)) => Ok(escape_json(text)),
            (SlotType::DataType, SlotValue::DataType(data_type)) => {
                Ok(data_type.as_str().to_string())
            }
            (SlotType::Integer, SlotValue::Integer(value)) => Ok(value.to_string()),
            (SlotType::JsonValue, SlotValue::Json(value)) => Ok(serde_json::to_string(value)?),
            (SlotType::Fragments(_), SlotValue::Fragments(items)) => {
                Ok(items.join(crate::template::FRAGMENT_SEPARATOR))
            }
            _ => Err(mismatch()),
        }
    }
}

impl From<&str> for SlotValue {
    fn from(value: &str) -> Self {
        SlotValue::Text(value.to_string())
    }
}

impl From<String> for SlotValue {
    fn from(value: String) -> Self {
        SlotValue::Text(value)
    }
}

impl From<i64> for SlotValue {
    fn from(value: i64) -> Self {
        SlotValue::Integer(value)
    }
}

impl From<DataType> for SlotValue {
    fn from(value: DataType) -> Self {
        SlotValue::DataType(value)
    }
}

impl From<serde_json::Value> for SlotValue {
    fn from(value: serde_json::Value) -> Self {
        SlotValue::Json(value)
    }
}

/// Values for the dynamic slots of one fragment instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotValues {
    values: HashMap<String, SlotValue>,
}

impl SlotValues {
    /// Create an empty set of values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a slot value (builder style)
    pub fn with(mut self, slot: &str, value: impl Into<SlotValue>) -> Self {
        self.set(slot, value);
        self
    }

    /// Set a slot value
    pub fn set(&mut self, slot: &str, value: impl Into<SlotValue>) {
        self.values.insert(slot.to_string(), value.into());
    }

    /// Set a slot value only when one is available
    pub fn set_opt(&mut self, slot: &str, value: Option<impl Into<SlotValue>>) {
        if let Some(value) = value {
            self.set(slot, value);
        }
    }

    /// Get a slot value
    pub fn get(&self, slot: &str) -> Option<&SlotValue> {
        self.values.get(slot)
    }
}

/// Escape text as the body of a JSON string literal
pub fn escape_json(text: &str) -> String {
    let quoted = serde_json::Value::String(text.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}
