//! Compiled documents and their typed decision-table view

use crate::error::TemplateError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared data type of a column or cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    /// Whole number
    NumericInteger,
    /// Fractional number
    NumericDouble,
    /// true / false
    Boolean,
    /// Text
    String,
}

impl DataType {
    /// All data types
    pub const ALL: [DataType; 4] = [
        DataType::NumericInteger,
        DataType::NumericDouble,
        DataType::Boolean,
        DataType::String,
    ];

    /// Get the data type name as written in documents
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::NumericInteger => "NUMERIC_INTEGER",
            DataType::NumericDouble => "NUMERIC_DOUBLE",
            DataType::Boolean => "BOOLEAN",
            DataType::String => "STRING",
        }
    }

    /// Parse a data type name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Whether a cell value is acceptable for this type (null is the wildcard)
    pub fn accepts(&self, value: &serde_json::Value) -> bool {
        use serde_json::Value;
        match (self, value) {
            (_, Value::Null) => true,
            (DataType::NumericInteger, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (DataType::NumericDouble, Value::Number(_)) => true,
            (DataType::Boolean, Value::Bool(_)) => true,
            (DataType::String, Value::String(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view of a `decision-table/1` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionTable {
    /// Template version the document was rendered from
    pub schema_version: String,
    /// Kebab-case table name
    pub table_name: String,
    /// Package the table belongs to
    pub package_name: String,
    /// Fully-qualified imported fact types
    pub imports: Vec<String>,
    /// Document format version
    pub version: u32,
    /// Table format (always extended entry)
    pub table_format: String,
    /// Hit policy
    pub hit_policy: String,
    /// Attribute columns (salience)
    pub attribute_columns: Vec<AttributeColumn>,
    /// Condition patterns with their condition columns
    pub condition_patterns: Vec<ConditionPattern>,
    /// Action columns
    pub action_columns: Vec<ActionColumn>,
    /// One row per rule
    pub data: Vec<Row>,
}

impl DecisionTable {
    /// Condition columns of every pattern, in document order
    pub fn condition_columns(&self) -> impl Iterator<Item = &ConditionColumn> {
        self.condition_patterns.iter().flat_map(|p| p.conditions.iter())
    }

    /// Number of cells every row must carry
    pub fn column_count(&self) -> usize {
        self.attribute_columns.len() + self.condition_columns().count() + self.action_columns.len()
    }
}

/// Rule attribute column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeColumn {
    /// Rule attribute name
    pub attribute: String,
    /// Column header
    pub header: String,
    /// Declared data type
    pub data_type: DataType,
    /// Value applied when a row leaves the cell empty
    pub default_value: i64,
}

/// Fact pattern the condition columns constrain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionPattern {
    /// Pattern kind
    #[serde(rename = "type")]
    pub kind: String,
    /// Fact type matched
    pub fact_type: String,
    /// Binding of the matched fact
    pub bound_name: String,
    /// Condition columns
    pub conditions: Vec<ConditionColumn>,
}

/// A condition column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionColumn {
    /// Column header
    pub header: String,
    /// Field of the input fact
    pub fact_field: String,
    /// Operator symbol
    pub operator: String,
    /// Declared data type
    pub data_type: DataType,
    /// Hidden in editors
    pub hidden: bool,
    /// Width in editors
    pub width: u32,
}

/// A column that sets a field on an inserted target fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionColumn {
    /// Action kind
    #[serde(rename = "type")]
    pub kind: String,
    /// Column header
    pub header: String,
    /// Target fact type
    pub fact_type: String,
    /// Binding of the inserted fact
    pub bound_name: String,
    /// Field set on the target fact
    pub fact_field: String,
    /// Declared data type
    pub data_type: DataType,
    /// Hidden in editors
    pub hidden: bool,
}

/// One rule of the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    /// 1-based row number
    pub row_number: u32,
    /// Human-readable rule description
    pub description: String,
    /// Cells: attributes, then conditions, then actions
    pub values: Vec<Cell>,
}

/// One cell of a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    /// Header of the column the cell belongs to
    pub column_name: String,
    /// Cell value; null is the wildcard
    pub value: serde_json::Value,
    /// Declared data type
    pub data_type: DataType,
}

/// A validated, fully filled template instance
///
/// Produced by the validator. The text is kept exactly as rendered; the
/// typed view is parsed on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledDocument {
    text: String,
}

impl CompiledDocument {
    /// Wrap document text that has passed validation
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Document text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consume and return the document text
    pub fn into_string(self) -> String {
        self.text
    }

    /// Parse the typed decision-table view
    pub fn table(&self) -> Result<DecisionTable, TemplateError> {
        serde_json::from_str(&self.text).map_err(|e| TemplateError::InvalidDocument(e.to_string()))
    }

    /// Table name, if the document is readable
    pub fn table_name(&self) -> Option<String> {
        self.table().ok().map(|t| t.table_name)
    }

    /// Export as a guided decision table XML document
    pub fn to_gdst(&self) -> Result<String, TemplateError> {
        Ok(crate::gdst::to_gdst_xml(&self.table()?))
    }

    /// Export as a DRL rule file, one rule per row
    pub fn to_drl(&self) -> Result<String, TemplateError> {
        Ok(crate::drl::to_drl(&self.table()?))
    }
}

impl fmt::Display for CompiledDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
