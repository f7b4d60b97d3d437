//! Table layout: the deterministic part of slot filling
//!
//! Columns are the union of what the rules of a batch test and set, in
//! first-seen order. Everything here follows from the rules alone; only the
//! human-facing names are left to the LLM.

use rulewright_domain::{ConditionValue, Literal, LiteralKind, Operator, StructuredRule};
use rulewright_template::DataType;
use serde_json::Value;
use std::collections::HashMap;

/// A condition column of the table
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionColumnSpec {
    /// Field of the input fact
    pub field: String,
    /// Operator applied to every cell of the column
    pub operator: Operator,
    /// Position among columns with the same field and operator
    pub occurrence: usize,
    /// Inferred data type
    pub data_type: DataType,
}

/// An action column of the table
#[derive(Debug, Clone, PartialEq)]
pub struct ActionColumnSpec {
    /// Method or field named by the rules
    pub target: String,
    /// Field set on the target fact
    pub fact_field: String,
    /// Position among columns with the same target
    pub occurrence: usize,
    /// Inferred data type
    pub data_type: DataType,
}

/// One row of the table
#[derive(Debug, Clone, PartialEq)]
pub struct RowSpec {
    /// Salience cell
    pub priority: i32,
    /// One value per condition column; null is the wildcard
    pub conditions: Vec<Value>,
    /// One value per action column; null leaves the field alone
    pub actions: Vec<Value>,
    /// Clause the rule came from
    pub source_clause: Option<String>,
    /// Catch-all rule
    pub baseline: bool,
}

/// Columns and rows of a decision table built from a batch of rules
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    /// Condition columns in first-seen order
    pub condition_columns: Vec<ConditionColumnSpec>,
    /// Action columns in first-seen order
    pub action_columns: Vec<ActionColumnSpec>,
    /// One row per rule, in rule order
    pub rows: Vec<RowSpec>,
}

impl TableLayout {
    /// Lay out a batch of rules as one table
    pub fn build(rules: &[StructuredRule]) -> Self {
        let mut condition_keys: Vec<(String, Operator, usize)> = Vec::new();
        let mut action_keys: Vec<(String, usize)> = Vec::new();
        let mut raw_rows = Vec::with_capacity(rules.len());

        for rule in rules {
            let mut seen: HashMap<(String, Operator), usize> = HashMap::new();
            let mut conditions = Vec::with_capacity(rule.conditions.len());
            for condition in &rule.conditions {
                let counter = seen
                    .entry((condition.field.clone(), condition.operator))
                    .or_insert(0);
                let key = (condition.field.clone(), condition.operator, *counter);
                *counter += 1;
                let column = position_or_push(&mut condition_keys, key);
                conditions.push((column, condition_cell(condition.operator, &condition.value)));
            }

            let mut seen: HashMap<String, usize> = HashMap::new();
            let mut actions = Vec::with_capacity(rule.actions.len());
            for action in &rule.actions {
                let counter = seen.entry(action.target.clone()).or_insert(0);
                let key = (action.target.clone(), *counter);
                *counter += 1;
                let column = position_or_push(&mut action_keys, key);
                actions.push((column, Cell::from_literal(&action.argument)));
            }

            raw_rows.push((rule, conditions, actions));
        }

        let mut condition_cells = vec![vec![Cell::Wildcard; condition_keys.len()]; rules.len()];
        let mut action_cells = vec![vec![Cell::Wildcard; action_keys.len()]; rules.len()];
        for (row, (_, conditions, actions)) in raw_rows.iter().enumerate() {
            for (column, cell) in conditions {
                condition_cells[row][*column] = cell.clone();
            }
            for (column, cell) in actions {
                action_cells[row][*column] = cell.clone();
            }
        }

        let condition_types: Vec<DataType> = condition_keys
            .iter()
            .enumerate()
            .map(|(column, (_, operator, _))| match operator {
                Operator::Matches | Operator::In => DataType::String,
                _ => infer_type(condition_cells.iter().map(|r| &r[column])),
            })
            .collect();
        let action_types: Vec<DataType> = (0..action_keys.len())
            .map(|column| infer_type(action_cells.iter().map(|r| &r[column])))
            .collect();

        let rows = raw_rows
            .iter()
            .enumerate()
            .map(|(row, (rule, _, _))| RowSpec {
                priority: rule.priority,
                conditions: condition_cells[row]
                    .iter()
                    .zip(&condition_types)
                    .map(|(cell, data_type)| cell.to_json(*data_type))
                    .collect(),
                actions: action_cells[row]
                    .iter()
                    .zip(&action_types)
                    .map(|(cell, data_type)| cell.to_json(*data_type))
                    .collect(),
                source_clause: rule.source_clause.clone(),
                baseline: rule.baseline,
            })
            .collect();

        Self {
            condition_columns: condition_keys
                .into_iter()
                .zip(condition_types)
                .map(|((field, operator, occurrence), data_type)| ConditionColumnSpec {
                    field,
                    operator,
                    occurrence,
                    data_type,
                })
                .collect(),
            action_columns: action_keys
                .into_iter()
                .zip(action_types)
                .map(|((target, occurrence), data_type)| ActionColumnSpec {
                    fact_field: fact_field_of(&target),
                    target,
                    occurrence,
                    data_type,
                })
                .collect(),
            rows,
        }
    }

    /// Number of cells in every row (attribute, conditions, actions)
    pub fn cell_count(&self) -> usize {
        1 + self.condition_columns.len() + self.action_columns.len()
    }
}

fn position_or_push<K: PartialEq>(keys: &mut Vec<K>, key: K) -> usize {
    match keys.iter().position(|k| *k == key) {
        Some(idx) => idx,
        None => {
            keys.push(key);
            keys.len() - 1
        }
    }
}

/// Field set by an action target: `setEmployeeCount` sets `employeeCount`
pub fn fact_field_of(target: &str) -> String {
    let mut rest = target.strip_prefix("set").unwrap_or("").chars();
    match rest.next() {
        Some(first) if first.is_uppercase() => {
            let mut field: String = first.to_lowercase().collect();
            field.extend(rest);
            field
        }
        _ => target.to_string(),
    }
}

/// A cell value before the column type is known
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Wildcard,
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Text(String),
}

impl Cell {
    fn from_literal(literal: &Literal) -> Self {
        match literal {
            Literal::Integer(v) => Cell::Integer(*v),
            Literal::Decimal(v) => Cell::Decimal(*v),
            Literal::Boolean(v) => Cell::Boolean(*v),
            Literal::Text(v) => Cell::Text(v.clone()),
            Literal::List(_) => Cell::Text(literal.to_string()),
        }
    }

    fn kind(&self) -> Option<LiteralKind> {
        match self {
            Cell::Wildcard => None,
            Cell::Integer(_) => Some(LiteralKind::Integer),
            Cell::Decimal(_) => Some(LiteralKind::Decimal),
            Cell::Boolean(_) => Some(LiteralKind::Boolean),
            Cell::Text(_) => Some(LiteralKind::Text),
        }
    }

    fn to_json(&self, data_type: DataType) -> Value {
        match (self, data_type) {
            (Cell::Wildcard, _) => Value::Null,
            (Cell::Integer(v), DataType::NumericInteger | DataType::NumericDouble) => {
                Value::from(*v)
            }
            (Cell::Decimal(v), DataType::NumericDouble) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(v.to_string())),
            (Cell::Boolean(v), DataType::Boolean) => Value::Bool(*v),
            (Cell::Integer(v), _) => Value::String(v.to_string()),
            (Cell::Decimal(v), _) => Value::String(v.to_string()),
            (Cell::Boolean(v), _) => Value::String(v.to_string()),
            (Cell::Text(v), _) => Value::String(v.clone()),
        }
    }
}

fn condition_cell(operator: Operator, value: &ConditionValue) -> Cell {
    match (operator, value) {
        (_, ConditionValue::Pattern(pattern)) => Cell::Text(pattern.clone()),
        (_, ConditionValue::Literal(literal)) => Cell::from_literal(literal),
    }
}

fn infer_type<'a>(cells: impl Iterator<Item = &'a Cell>) -> DataType {
    let mut inferred: Option<DataType> = None;
    for kind in cells.filter_map(Cell::kind) {
        let current = match kind {
            LiteralKind::Integer => DataType::NumericInteger,
            LiteralKind::Decimal => DataType::NumericDouble,
            LiteralKind::Boolean => DataType::Boolean,
            LiteralKind::Text | LiteralKind::List => DataType::String,
        };
        inferred = Some(match (inferred, current) {
            (None, t) => t,
            (Some(a), b) if a == b => a,
            (Some(DataType::NumericInteger), DataType::NumericDouble)
            | (Some(DataType::NumericDouble), DataType::NumericInteger) => DataType::NumericDouble,
            _ => DataType::String,
        });
    }
    inferred.unwrap_or(DataType::String)
}
