//! Candidate validation logic

use crate::config::ValidationConfig;
use crate::error::{ValidationCategory, ValidationError};
use rulewright_domain::Operator;
use rulewright_template::{CompiledDocument, DataType, FragmentKind, SchemaTemplate};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::debug;

const ATTRIBUTE_COLUMNS: &str = "attributeColumns";
const CONDITION_PATTERNS: &str = "conditionPatterns";
const CONDITIONS: &str = "conditions";
const ACTION_COLUMNS: &str = "actionColumns";
const DATA: &str = "data";
const VALUES: &str = "values";

/// Longest scaffolding excerpt quoted in a reason
const PIECE_PREVIEW: usize = 40;

/// Gatekeeper for candidate documents
pub struct Gatekeeper {
    config: ValidationConfig,
}

/// Why a candidate was rejected
///
/// Rows and cells are numbered from 1. Paths are JSON paths into the
/// candidate such as `data[1].values[2].columnName`.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    /// The candidate is not valid JSON
    Malformed {
        /// Line of the parse error
        line: usize,
        /// Column of the parse error
        column: usize,
        /// Parser message
        message: String,
    },

    /// A required field is absent
    MissingField {
        /// Path of the missing field
        path: String,
    },

    /// A field holds the wrong kind of JSON value
    WrongShape {
        /// Path of the field
        path: String,
        /// What was expected there
        expected: &'static str,
    },

    /// A collection that must not be empty is empty
    EmptyCollection {
        /// Path of the collection
        path: String,
    },

    /// A `{{marker}}` was left in the candidate
    UnresolvedSlot {
        /// Slot name inside the marker
        slot: String,
        /// Where the marker was found
        path: String,
        /// Row the marker sits in, if any
        row: Option<usize>,
    },

    /// Frame scaffolding is missing or out of order
    StaticFragmentAltered {
        /// Fragment the scaffolding belongs to
        fragment: FragmentKind,
        /// Excerpt of the scaffolding
        piece: String,
    },

    /// Instance scaffolding occurs fewer times than there are instances
    StaticFragmentMissing {
        /// Fragment the scaffolding belongs to
        fragment: FragmentKind,
        /// Excerpt of the scaffolding
        piece: String,
        /// Required occurrences
        expected: usize,
        /// Occurrences found
        found: usize,
    },

    /// Two columns share a header
    DuplicateHeader {
        /// Repeated header
        header: String,
    },

    /// Row numbers do not run 1, 2, 3, ...
    RowNumber {
        /// Position of the row
        row: usize,
        /// rowNumber the position requires
        expected: usize,
        /// rowNumber found
        actual: String,
    },

    /// A row has the wrong number of cells
    RowArity {
        /// Position of the row
        row: usize,
        /// Declared column count
        expected: usize,
        /// Cells found
        actual: usize,
    },

    /// A cell names a different column than the one it sits in
    ColumnMismatch {
        /// Row of the cell
        row: usize,
        /// Position of the cell in the row
        cell: usize,
        /// Header of the column at that position
        expected: String,
        /// columnName found
        actual: String,
    },

    /// A dataType is not one of the known names
    UnknownDataType {
        /// Path of the dataType field
        path: String,
        /// Value found
        value: String,
    },

    /// A cell declares a different data type than its column
    CellTypeMismatch {
        /// Row of the cell
        row: usize,
        /// Column the cell belongs to
        column: String,
        /// Column data type
        expected: DataType,
        /// Cell data type
        actual: DataType,
    },

    /// A cell value does not fit its data type
    ValueTypeMismatch {
        /// Row of the cell
        row: usize,
        /// Column the cell belongs to
        column: String,
        /// Declared data type
        data_type: DataType,
        /// Value found
        value: String,
    },

    /// An attribute cell is null
    NullAttribute {
        /// Row of the cell
        row: usize,
        /// Attribute column header
        column: String,
    },

    /// The table name is not kebab-case
    InvalidTableName {
        /// Name found
        name: String,
    },

    /// A type, binding, field or package name is not an identifier
    InvalidIdentifier {
        /// Path of the field
        path: String,
        /// Value found
        value: String,
    },

    /// A condition column uses an unsupported operator
    UnknownOperator {
        /// Path of the operator field
        path: String,
        /// Operator found
        operator: String,
    },

    /// The candidate does not deserialize as a decision table
    Schema {
        /// Deserializer message
        message: String,
    },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::Malformed { line, column, message } => {
                write!(f, "not valid JSON at line {}, column {}: {}", line, column, message)
            }
            RejectionReason::MissingField { path } => write!(f, "missing field '{}'", path),
            RejectionReason::WrongShape { path, expected } => {
                write!(f, "'{}' must be {}", path, expected)
            }
            RejectionReason::EmptyCollection { path } => write!(f, "'{}' must not be empty", path),
            RejectionReason::UnresolvedSlot { slot, path, row } => match row {
                Some(row) => write!(f, "slot '{}' unresolved at '{}' (row {})", slot, path, row),
                None => write!(f, "slot '{}' unresolved at '{}'", slot, path),
            },
            RejectionReason::StaticFragmentAltered { fragment, piece } => {
                write!(f, "{} scaffolding {:?} was altered or reordered", fragment, piece)
            }
            RejectionReason::StaticFragmentMissing {
                fragment,
                piece,
                expected,
                found,
            } => write!(
                f,
                "{} scaffolding {:?} found {} times, expected {}",
                fragment, piece, found, expected
            ),
            RejectionReason::DuplicateHeader { header } => {
                write!(f, "header '{}' is used by more than one column", header)
            }
            RejectionReason::RowNumber { row, expected, actual } => {
                write!(f, "row {} has rowNumber {}, expected {}", row, actual, expected)
            }
            RejectionReason::RowArity { row, expected, actual } => {
                write!(f, "row {} has {} cells, expected {}", row, actual, expected)
            }
            RejectionReason::ColumnMismatch {
                row,
                cell,
                expected,
                actual,
            } => write!(
                f,
                "row {} cell {} names column '{}', expected '{}'",
                row, cell, actual, expected
            ),
            RejectionReason::UnknownDataType { path, value } => {
                write!(f, "unknown dataType '{}' at '{}'", value, path)
            }
            RejectionReason::CellTypeMismatch {
                row,
                column,
                expected,
                actual,
            } => write!(
                f,
                "row {} column '{}' declares {}, column is {}",
                row, column, actual, expected
            ),
            RejectionReason::ValueTypeMismatch {
                row,
                column,
                data_type,
                value,
            } => write!(
                f,
                "row {} column '{}' value {} is not {}",
                row, column, value, data_type
            ),
            RejectionReason::NullAttribute { row, column } => {
                write!(f, "row {} attribute '{}' must not be null", row, column)
            }
            RejectionReason::InvalidTableName { name } => {
                write!(f, "table name '{}' is not kebab-case", name)
            }
            RejectionReason::InvalidIdentifier { path, value } => {
                write!(f, "'{}' at '{}' is not an identifier", value, path)
            }
            RejectionReason::UnknownOperator { path, operator } => {
                write!(f, "unknown operator '{}' at '{}'", operator, path)
            }
            RejectionReason::Schema { message } => write!(f, "not a decision table: {}", message),
        }
    }
}

impl Gatekeeper {
    /// Create a new gatekeeper with the given configuration
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Create a gatekeeper with default configuration
    pub fn default_config() -> Self {
        Self::new(ValidationConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a candidate against the template it was filled from
    ///
    /// Checks run in category order and stop at the first category with
    /// any reason. An accepted candidate is returned unchanged.
    pub fn validate(
        &self,
        candidate: &str,
        template: &SchemaTemplate,
    ) -> Result<CompiledDocument, ValidationError> {
        let root: Value = serde_json::from_str(candidate).map_err(|e| {
            self.reject(
                ValidationCategory::Structure,
                vec![RejectionReason::Malformed {
                    line: e.line(),
                    column: e.column(),
                    message: e.to_string(),
                }],
            )
        })?;

        // 1. Structure
        self.check(ValidationCategory::Structure, check_structure(&root, template))?;

        // 2. Unresolved slots
        let mut unresolved = Vec::new();
        collect_markers(&root, template, "", None, &mut unresolved);
        self.check(ValidationCategory::UnresolvedSlots, unresolved)?;

        // 3. Static fragments
        if self.config.check_static_fragments {
            self.check(
                ValidationCategory::StaticFragments,
                check_static_fragments(candidate, &root, template),
            )?;
        }

        // 4. Arity
        self.check(ValidationCategory::Arity, check_arity(&root))?;

        // 5. Types
        if self.config.check_types {
            self.check(ValidationCategory::Types, check_types(&root))?;
        }

        let document = CompiledDocument::new(candidate);
        if let Err(e) = document.table() {
            return Err(self.reject(
                ValidationCategory::Types,
                vec![RejectionReason::Schema {
                    message: e.to_string(),
                }],
            ));
        }

        debug!(
            table_name = document.table_name().as_deref().unwrap_or(""),
            "Candidate accepted"
        );
        Ok(document)
    }

    fn check(
        &self,
        category: ValidationCategory,
        reasons: Vec<RejectionReason>,
    ) -> Result<(), ValidationError> {
        if reasons.is_empty() {
            Ok(())
        } else {
            Err(self.reject(category, reasons))
        }
    }

    fn reject(&self, category: ValidationCategory, mut reasons: Vec<RejectionReason>) -> ValidationError {
        let total = reasons.len();
        reasons.truncate(self.config.max_reasons_per_category.max(1));
        debug!(%category, total, reported = reasons.len(), "Candidate rejected");
        ValidationError { category, reasons }
    }
}

fn check_structure(root: &Value, template: &SchemaTemplate) -> Vec<RejectionReason> {
    let mut reasons = Vec::new();
    let Some(frame) = root.as_object() else {
        reasons.push(RejectionReason::WrongShape {
            path: "$".to_string(),
            expected: "an object",
        });
        return reasons;
    };

    require_keys(frame, template.keys(FragmentKind::Frame), "", &mut reasons);

    if let Some(columns) = array_field(frame, ATTRIBUTE_COLUMNS, "", &mut reasons) {
        for (i, column) in columns.iter().enumerate() {
            object_item(column, &index(ATTRIBUTE_COLUMNS, i), &mut reasons);
        }
    }

    if let Some(patterns) = array_field(frame, CONDITION_PATTERNS, "", &mut reasons) {
        for (i, pattern) in patterns.iter().enumerate() {
            let path = index(CONDITION_PATTERNS, i);
            let Some(pattern) = object_item(pattern, &path, &mut reasons) else {
                continue;
            };
            match pattern.get(CONDITIONS) {
                None => reasons.push(RejectionReason::MissingField {
                    path: child(&path, CONDITIONS),
                }),
                Some(conditions) => {
                    let conditions_path = child(&path, CONDITIONS);
                    match conditions.as_array() {
                        None => reasons.push(RejectionReason::WrongShape {
                            path: conditions_path,
                            expected: "an array",
                        }),
                        Some(conditions) => {
                            for (j, column) in conditions.iter().enumerate() {
                                let column_path = index(&conditions_path, j);
                                if let Some(column) = object_item(column, &column_path, &mut reasons) {
                                    require_keys(
                                        column,
                                        template.keys(FragmentKind::ConditionColumn),
                                        &column_path,
                                        &mut reasons,
                                    );
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    if let Some(actions) = array_field(frame, ACTION_COLUMNS, "", &mut reasons) {
        if actions.is_empty() {
            reasons.push(RejectionReason::EmptyCollection {
                path: ACTION_COLUMNS.to_string(),
            });
        }
        for (i, column) in actions.iter().enumerate() {
            let path = index(ACTION_COLUMNS, i);
            if let Some(column) = object_item(column, &path, &mut reasons) {
                require_keys(column, template.keys(FragmentKind::ActionColumn), &path, &mut reasons);
            }
        }
    }

    if let Some(rows) = array_field(frame, DATA, "", &mut reasons) {
        if rows.is_empty() {
            reasons.push(RejectionReason::EmptyCollection {
                path: DATA.to_string(),
            });
        }
        for (i, row) in rows.iter().enumerate() {
            let path = index(DATA, i);
            let Some(row) = object_item(row, &path, &mut reasons) else {
                continue;
            };
            require_keys(row, template.keys(FragmentKind::Row), &path, &mut reasons);
            if let Some(cells) = array_field(row, VALUES, &path, &mut reasons) {
                let cells_path = child(&path, VALUES);
                for (j, cell) in cells.iter().enumerate() {
                    let cell_path = index(&cells_path, j);
                    if let Some(cell) = object_item(cell, &cell_path, &mut reasons) {
                        require_keys(cell, template.keys(FragmentKind::Cell), &cell_path, &mut reasons);
                    }
                }
            }
        }
    }

    reasons
}

fn collect_markers(
    value: &Value,
    template: &SchemaTemplate,
    path: &str,
    row: Option<usize>,
    out: &mut Vec<RejectionReason>,
) {
    match value {
        Value::String(text) => {
            for slot in template.find_markers(text) {
                out.push(RejectionReason::UnresolvedSlot {
                    slot: slot.to_string(),
                    path: path.to_string(),
                    row,
                });
            }
        }
        Value::Array(items) => {
            let in_data = path == DATA;
            for (i, item) in items.iter().enumerate() {
                let item_row = if in_data { Some(i + 1) } else { row };
                collect_markers(item, template, &index(path, i), item_row, out);
            }
        }
        Value::Object(fields) => {
            for (key, item) in fields {
                let item_path = child(path, key);
                for slot in template.find_markers(key) {
                    out.push(RejectionReason::UnresolvedSlot {
                        slot: slot.to_string(),
                        path: item_path.clone(),
                        row,
                    });
                }
                collect_markers(item, template, &item_path, row, out);
            }
        }
        _ => {}
    }
}

fn check_static_fragments(
    candidate: &str,
    root: &Value,
    template: &SchemaTemplate,
) -> Vec<RejectionReason> {
    let mut reasons = Vec::new();

    let mut cursor = 0;
    for piece in template.static_fragments(FragmentKind::Frame) {
        if piece.is_empty() {
            continue;
        }
        match candidate[cursor..].find(piece) {
            Some(offset) => cursor += offset + piece.len(),
            None => reasons.push(RejectionReason::StaticFragmentAltered {
                fragment: FragmentKind::Frame,
                piece: preview(piece),
            }),
        }
    }

    let conditions = condition_columns(root).len();
    let actions = array_at(root, ACTION_COLUMNS).len();
    let rows = array_at(root, DATA);
    let cells: usize = rows.iter().map(|row| array_at(row, VALUES).len()).sum();
    let instances = [
        (FragmentKind::ConditionColumn, conditions),
        (FragmentKind::ActionColumn, actions),
        (FragmentKind::Row, rows.len()),
        (FragmentKind::Cell, cells),
    ];

    // Pieces shared between fragments must occur once per instance of each.
    let mut required: BTreeMap<&str, (FragmentKind, usize)> = BTreeMap::new();
    for (kind, count) in instances {
        for piece in template.static_fragments(kind) {
            if piece.is_empty() || count == 0 {
                continue;
            }
            required.entry(piece).or_insert((kind, 0)).1 += count;
        }
    }

    for (piece, (fragment, expected)) in required {
        let found = candidate.matches(piece).count();
        if found < expected {
            reasons.push(RejectionReason::StaticFragmentMissing {
                fragment,
                piece: preview(piece),
                expected,
                found,
            });
        }
    }

    reasons
}

fn check_arity(root: &Value) -> Vec<RejectionReason> {
    let mut reasons = Vec::new();
    let headers = column_headers(root);

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for header in &headers {
        if !seen.insert(header.as_str()) && reported.insert(header.as_str()) {
            reasons.push(RejectionReason::DuplicateHeader {
                header: header.clone(),
            });
        }
    }

    for (i, row) in array_at(root, DATA).iter().enumerate() {
        let position = i + 1;
        match row.get("rowNumber").and_then(Value::as_u64) {
            Some(number) if number == position as u64 => {}
            _ => reasons.push(RejectionReason::RowNumber {
                row: position,
                expected: position,
                actual: row.get("rowNumber").map(Value::to_string).unwrap_or_default(),
            }),
        }

        let cells = array_at(row, VALUES);
        if cells.len() != headers.len() {
            reasons.push(RejectionReason::RowArity {
                row: position,
                expected: headers.len(),
                actual: cells.len(),
            });
            continue;
        }

        for (j, (cell, header)) in cells.iter().zip(&headers).enumerate() {
            let actual = str_at(cell, "columnName").unwrap_or_default();
            if actual != header {
                reasons.push(RejectionReason::ColumnMismatch {
                    row: position,
                    cell: j + 1,
                    expected: header.clone(),
                    actual: actual.to_string(),
                });
            }
        }
    }

    reasons
}

fn check_types(root: &Value) -> Vec<RejectionReason> {
    let mut reasons = Vec::new();

    if let Some(name) = str_at(root, "tableName") {
        if !is_kebab_case(name) {
            reasons.push(RejectionReason::InvalidTableName {
                name: name.to_string(),
            });
        }
    }

    identifier_at(root, "packageName", "", &mut reasons);
    for (i, import) in array_at(root, "imports").iter().enumerate() {
        let path = index("imports", i);
        match import.as_str() {
            Some(value) if is_identifier(value) => {}
            _ => reasons.push(RejectionReason::InvalidIdentifier {
                path,
                value: display_value(import),
            }),
        }
    }

    let mut column_types = Vec::new();
    let attributes = array_at(root, ATTRIBUTE_COLUMNS);
    for (i, column) in attributes.iter().enumerate() {
        column_types.push(data_type_at(column, &index(ATTRIBUTE_COLUMNS, i), &mut reasons));
    }

    for (i, pattern) in array_at(root, CONDITION_PATTERNS).iter().enumerate() {
        let path = index(CONDITION_PATTERNS, i);
        identifier_at(pattern, "factType", &path, &mut reasons);
        identifier_at(pattern, "boundName", &path, &mut reasons);
        let conditions_path = child(&path, CONDITIONS);
        for (j, column) in array_at(pattern, CONDITIONS).iter().enumerate() {
            let column_path = index(&conditions_path, j);
            identifier_at(column, "factField", &column_path, &mut reasons);
            if let Some(operator) = str_at(column, "operator") {
                if !Operator::ALL.iter().any(|op| op.symbol() == operator) {
                    reasons.push(RejectionReason::UnknownOperator {
                        path: child(&column_path, "operator"),
                        operator: operator.to_string(),
                    });
                }
            }
            column_types.push(data_type_at(column, &column_path, &mut reasons));
        }
    }

    for (i, column) in array_at(root, ACTION_COLUMNS).iter().enumerate() {
        let path = index(ACTION_COLUMNS, i);
        identifier_at(column, "factType", &path, &mut reasons);
        identifier_at(column, "boundName", &path, &mut reasons);
        identifier_at(column, "factField", &path, &mut reasons);
        column_types.push(data_type_at(column, &path, &mut reasons));
    }

    let headers = column_headers(root);
    for (i, row) in array_at(root, DATA).iter().enumerate() {
        let position = i + 1;
        let cells_path = child(&index(DATA, i), VALUES);
        for (j, cell) in array_at(row, VALUES).iter().enumerate() {
            let column = headers.get(j).cloned().unwrap_or_default();
            let cell_type = data_type_at(cell, &index(&cells_path, j), &mut reasons);
            let value = cell.get("value").unwrap_or(&Value::Null);

            if j < attributes.len() && value.is_null() {
                reasons.push(RejectionReason::NullAttribute {
                    row: position,
                    column: column.clone(),
                });
            }

            let Some(cell_type) = cell_type else {
                continue;
            };
            if let Some(Some(column_type)) = column_types.get(j) {
                if *column_type != cell_type {
                    reasons.push(RejectionReason::CellTypeMismatch {
                        row: position,
                        column,
                        expected: *column_type,
                        actual: cell_type,
                    });
                    continue;
                }
            }
            if !cell_type.accepts(value) {
                reasons.push(RejectionReason::ValueTypeMismatch {
                    row: position,
                    column,
                    data_type: cell_type,
                    value: display_value(value),
                });
            }
        }
    }

    reasons
}

/// Headers of every column in cell order: attributes, conditions, actions
fn column_headers(root: &Value) -> Vec<String> {
    let header = |column: &Value| str_at(column, "header").unwrap_or_default().to_string();
    array_at(root, ATTRIBUTE_COLUMNS)
        .iter()
        .map(header)
        .chain(condition_columns(root).into_iter().map(header))
        .chain(array_at(root, ACTION_COLUMNS).iter().map(header))
        .collect()
}

fn condition_columns(root: &Value) -> Vec<&Value> {
    array_at(root, CONDITION_PATTERNS)
        .iter()
        .flat_map(|pattern| array_at(pattern, CONDITIONS))
        .collect()
}

fn require_keys(
    object: &Map<String, Value>,
    keys: &[String],
    path: &str,
    reasons: &mut Vec<RejectionReason>,
) {
    for key in keys {
        if !object.contains_key(key) {
            reasons.push(RejectionReason::MissingField {
                path: child(path, key),
            });
        }
    }
}

fn array_field<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    path: &str,
    reasons: &mut Vec<RejectionReason>,
) -> Option<&'a Vec<Value>> {
    let value = object.get(key)?;
    let array = value.as_array();
    if array.is_none() {
        reasons.push(RejectionReason::WrongShape {
            path: child(path, key),
            expected: "an array",
        });
    }
    array
}

fn object_item<'a>(
    value: &'a Value,
    path: &str,
    reasons: &mut Vec<RejectionReason>,
) -> Option<&'a Map<String, Value>> {
    let object = value.as_object();
    if object.is_none() {
        reasons.push(RejectionReason::WrongShape {
            path: path.to_string(),
            expected: "an object",
        });
    }
    object
}

fn data_type_at(value: &Value, path: &str, reasons: &mut Vec<RejectionReason>) -> Option<DataType> {
    let raw = value.get("dataType")?;
    let parsed = raw.as_str().and_then(DataType::parse);
    if parsed.is_none() {
        reasons.push(RejectionReason::UnknownDataType {
            path: child(path, "dataType"),
            value: display_value(raw),
        });
    }
    parsed
}

fn identifier_at(value: &Value, key: &str, path: &str, reasons: &mut Vec<RejectionReason>) {
    let Some(raw) = value.get(key) else {
        return;
    };
    match raw.as_str() {
        Some(text) if is_identifier(text) => {}
        _ => reasons.push(RejectionReason::InvalidIdentifier {
            path: child(path, key),
            value: display_value(raw),
        }),
    }
}

fn array_at<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn str_at<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn child(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn index(path: &str, i: usize) -> String {
    format!("{}[{}]", path, i)
}

fn preview(piece: &str) -> String {
    let mut chars = piece.chars();
    let head: String = chars.by_ref().take(PIECE_PREVIEW).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Lowercase words joined by single hyphens
fn is_kebab_case(name: &str) -> bool {
    !name.is_empty()
        && name.split('-').all(|word| {
            !word.is_empty() && word.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        })
}

/// Dotted identifier, optionally `$`-prefixed (`com.acme.Type`, `$order`)
fn is_identifier(text: &str) -> bool {
    let text = text.strip_prefix('$').unwrap_or(text);
    !text.is_empty()
        && text.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
