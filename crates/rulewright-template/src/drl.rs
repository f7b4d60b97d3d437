//! Export to Drools rule language (DRL), one rule per table row

use crate::document::{ActionColumn, Cell, ConditionColumn, DataType, DecisionTable, Row};
use serde_json::Value;

const INDENT: &str = "    ";

static NULL: Value = Value::Null;

/// Render a decision table as a DRL rule file
///
/// Every row becomes a rule named `<table>-<row>`. Empty condition cells
/// are wildcards and drop out of the pattern; empty action cells set
/// nothing.
pub fn to_drl(table: &DecisionTable) -> String {
    let mut out = format!("package {};\n\n", table.package_name);
    for import in &table.imports {
        out.push_str(&format!("import {};\n", import));
    }
    out.push_str("\ndialect \"mvel\";\n");

    for row in &table.data {
        out.push('\n');
        push_rule(&mut out, table, row);
    }
    out
}

fn push_rule(out: &mut String, table: &DecisionTable, row: &Row) {
    let attributes = table.attribute_columns.len();
    let conditions = table.condition_columns().count();
    let cell = |idx: usize| row.values.get(idx).map(|c: &Cell| &c.value).unwrap_or(&NULL);

    let description = row.description.split_whitespace().collect::<Vec<_>>().join(" ");
    if !description.is_empty() {
        out.push_str(&format!("// {}\n", description));
    }
    out.push_str(&format!(
        "rule \"{}-{}\"\n",
        escape_string(&table.table_name),
        row.row_number
    ));

    for (idx, attribute) in table.attribute_columns.iter().enumerate() {
        let value = match cell(idx) {
            Value::Null => attribute.default_value.to_string(),
            other => plain_text(other),
        };
        out.push_str(&format!("{}{} {}\n", INDENT, attribute.attribute, value));
    }

    out.push_str("when\n");
    let mut offset = attributes;
    for pattern in &table.condition_patterns {
        let constraints: Vec<String> = pattern
            .conditions
            .iter()
            .enumerate()
            .filter_map(|(i, column)| constraint(column, cell(offset + i)))
            .collect();
        offset += pattern.conditions.len();
        let body = if constraints.is_empty() {
            String::new()
        } else {
            format!(" {} ", constraints.join(", "))
        };
        out.push_str(&format!(
            "{}{} : {}({})\n",
            INDENT, pattern.bound_name, pattern.fact_type, body
        ));
    }

    out.push_str("then\n");
    let actions_from = attributes + conditions;
    let mut bound: Vec<&str> = Vec::new();
    for action in &table.action_columns {
        if !bound.contains(&action.bound_name.as_str()) {
            bound.push(&action.bound_name);
        }
    }
    for name in bound {
        let columns: Vec<(usize, &ActionColumn)> = table
            .action_columns
            .iter()
            .enumerate()
            .filter(|(_, a)| a.bound_name == name)
            .collect();
        let fact_type = columns.first().map(|(_, a)| a.fact_type.as_str()).unwrap_or("Object");
        out.push_str(&format!("{}{} {} = new {}();\n", INDENT, fact_type, name, fact_type));
        for (i, column) in columns {
            let value = cell(actions_from + i);
            if value.is_null() {
                continue;
            }
            out.push_str(&format!(
                "{}{}.{}( {} );\n",
                INDENT,
                name,
                setter(&column.fact_field),
                literal(value, column.data_type)
            ));
        }
        out.push_str(&format!("{}insert( {} );\n", INDENT, name));
    }
    out.push_str("end\n");
}

/// One constraint inside a pattern, or `None` for a wildcard cell
fn constraint(column: &ConditionColumn, value: &Value) -> Option<String> {
    if value.is_null() {
        return None;
    }
    let field = &column.fact_field;
    let rendered = match column.operator.as_str() {
        "in" => {
            let items: Vec<String> = match value {
                Value::Array(items) => items.iter().map(|v| literal(v, column.data_type)).collect(),
                other => plain_text(other)
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| list_item(s, column.data_type))
                    .collect(),
            };
            format!("{} in ( {} )", field, items.join(", "))
        }
        "matches" => format!("{} matches \"{}\"", field, escape_string(&plain_text(value))),
        operator => format!("{} {} {}", field, operator, literal(value, column.data_type)),
    };
    Some(rendered)
}

fn list_item(text: &str, data_type: DataType) -> String {
    match data_type {
        DataType::String => quote(text),
        _ => text.to_string(),
    }
}

fn literal(value: &Value, data_type: DataType) -> String {
    match (value, data_type) {
        (Value::String(text), DataType::String) => quote(text),
        (Value::String(text), _) if text.trim().parse::<f64>().is_ok() || is_flag(text) => {
            text.trim().to_string()
        }
        (Value::String(text), _) => quote(text),
        (other, _) => other.to_string(),
    }
}

fn is_flag(text: &str) -> bool {
    matches!(text.trim(), "true" | "false")
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", escape_string(text))
}

fn escape_string(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// `employeeCount` -> `setEmployeeCount`
fn setter(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => format!("set{}{}", first.to_uppercase(), chars.as_str()),
        None => "set".to_string(),
    }
}
