//! Naming slots: the part of a table the LLM is asked to produce

use serde_json::Value;

/// JSON schema of the naming response, sent as the output format
pub const NAMING_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "tableName": {"type": "string"},
    "conditionHeaders": {"type": "array", "items": {"type": "string"}},
    "actionHeaders": {"type": "array", "items": {"type": "string"}},
    "rowDescriptions": {"type": "array", "items": {"type": "string"}}
  },
  "required": ["tableName", "conditionHeaders", "actionHeaders", "rowDescriptions"]
}"#;

/// Human-facing names of a table
///
/// A `None` entry is a slot the LLM did not fill; it renders as an
/// unresolved marker for the validator to report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableNaming {
    /// Kebab-case table name
    pub table_name: Option<String>,
    /// One header per condition column
    pub condition_headers: Vec<Option<String>>,
    /// One header per action column
    pub action_headers: Vec<Option<String>>,
    /// One description per row
    pub row_descriptions: Vec<Option<String>>,
}

impl TableNaming {
    /// Naming with every slot unresolved
    pub fn unresolved(conditions: usize, actions: usize, rows: usize) -> Self {
        Self {
            table_name: None,
            condition_headers: vec![None; conditions],
            action_headers: vec![None; actions],
            row_descriptions: vec![None; rows],
        }
    }

    /// Parse an LLM naming response, sized to the table
    ///
    /// Lenient: anything missing or of the wrong type stays unresolved.
    pub fn parse(response: &str, conditions: usize, actions: usize, rows: usize) -> Option<Self> {
        let json: Value = serde_json::from_str(strip_fences(response)).ok()?;
        let obj = json.as_object()?;

        let names = |key: &str, len: usize| -> Vec<Option<String>> {
            let items = obj.get(key).and_then(Value::as_array);
            (0..len)
                .map(|i| {
                    items
                        .and_then(|a| a.get(i))
                        .and_then(Value::as_str)
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                })
                .collect()
        };

        Some(Self {
            table_name: obj
                .get("tableName")
                .and_then(Value::as_str)
                .and_then(slugify),
            condition_headers: names("conditionHeaders", conditions),
            action_headers: names("actionHeaders", actions),
            row_descriptions: names("rowDescriptions", rows),
        })
    }
}

fn strip_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// Normalize a name to kebab-case
///
/// `Restaurant Staffing_by Size` becomes `restaurant-staffing-by-size`;
/// `EmployeeCount` becomes `employee-count`. Returns `None` when nothing
/// alphanumeric is left.
pub fn slugify(name: &str) -> Option<String> {
    let mut slug = String::new();
    let mut previous: Option<char> = None;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            let boundary = c.is_ascii_uppercase()
                && previous.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit());
            if boundary && !slug.ends_with('-') {
                slug.push('-');
            }
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
        previous = Some(c);
    }

    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

/// Whether `name` is already kebab-case
pub fn is_kebab_case(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && !name.ends_with('-')
        && !name.contains("--")
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
