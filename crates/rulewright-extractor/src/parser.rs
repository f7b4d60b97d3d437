//! Parse and coerce LLM output into structured rules

use crate::error::ExtractionError;
use regex::Regex;
use rulewright_domain::{
    to_identifier, Action, Condition, ConditionValue, FactModel, Literal, Operator,
    RuleViolation, StructuredRule,
};
use serde_json::{Map, Value};

/// Defaults applied to fields the LLM leaves out
#[derive(Debug, Clone)]
pub struct ParseDefaults<'a> {
    /// Input fact type
    pub input_type: &'a str,
    /// Target fact type
    pub target_type: &'a str,
    /// Priority of rules that state none
    pub default_priority: i32,
    /// Clause the response was produced for, if extraction ran per clause
    pub source_clause: Option<&'a str>,
    /// Declared fact types to check fields and targets against
    pub fact_model: Option<&'a FactModel>,
}

/// Parse an LLM response into structured rules
///
/// Accepts `{"rules": [...]}` or a bare array. Every rule must satisfy the
/// structured-rule invariants; the first violation fails the whole response.
/// Field and target names are normalised to camelCase identifiers, and a
/// rule naming fact types other than the requested ones is rejected.
pub fn parse_rules(
    response: &str,
    defaults: &ParseDefaults<'_>,
) -> Result<Vec<StructuredRule>, ExtractionError> {
    let json_str = extract_json(response)?;
    let json: Value = serde_json::from_str(&json_str)?;

    let rules = match &json {
        Value::Array(items) => items,
        Value::Object(obj) => obj
            .get("rules")
            .and_then(Value::as_array)
            .ok_or_else(|| ExtractionError::InvalidFormat("Missing 'rules' array".to_string()))?,
        _ => {
            return Err(ExtractionError::InvalidFormat(
                "Expected JSON object or array".to_string(),
            ))
        }
    };

    if rules.is_empty() {
        return Err(ExtractionError::NoRules);
    }

    rules
        .iter()
        .enumerate()
        .map(|(idx, rule)| parse_rule(idx, rule, defaults))
        .collect()
}

/// Extract JSON from response, handling markdown code blocks
pub fn extract_json(response: &str) -> Result<String, ExtractionError> {
    let trimmed = response.trim();

    if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() < 2 {
            return Err(ExtractionError::InvalidFormat("Empty code block".to_string()));
        }
        let end = if lines[lines.len() - 1].trim_start().starts_with("```") {
            lines.len() - 1
        } else {
            lines.len()
        };
        Ok(lines[1..end].join("\n"))
    } else {
        Ok(trimmed.to_string())
    }
}

fn parse_rule(
    idx: usize,
    json: &Value,
    defaults: &ParseDefaults<'_>,
) -> Result<StructuredRule, ExtractionError> {
    let obj = json
        .as_object()
        .ok_or_else(|| ExtractionError::InvalidFormat(format!("Rule {} is not a JSON object", idx)))?;

    let conditions = match obj.get("conditions") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|c| parse_condition(idx, c))
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(ExtractionError::InvalidFormat(format!(
                "Rule {}: 'conditions' is not an array",
                idx
            )))
        }
    };

    let actions = match obj.get("actions") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|a| parse_action(idx, a))
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(ExtractionError::InvalidFormat(format!(
                "Rule {}: 'actions' is not an array",
                idx
            )))
        }
    };

    let priority = match obj.get("priority") {
        None | Some(Value::Null) => defaults.default_priority,
        Some(value) => coerce_integer(value).ok_or_else(|| ExtractionError::InvalidValue {
            rule: idx,
            message: format!("priority {} is not an integer", value),
        })?,
    };

    let baseline = obj.get("baseline").and_then(Value::as_bool).unwrap_or(false);

    let source_clause = defaults
        .source_clause
        .map(str::to_string)
        .or_else(|| text_field(obj, &["clause", "sourceClause"]));

    let rule = StructuredRule {
        conditions,
        actions,
        priority,
        baseline,
        input_type: expected_type(idx, obj, &["inputType", "input_type"], defaults.input_type)?,
        target_type: expected_type(idx, obj, &["targetType", "target_type"], defaults.target_type)?,
        source_clause,
    };

    rule.validate().map_err(|violation| match violation {
        RuleViolation::NoActions => ExtractionError::NoActions(idx),
        RuleViolation::MissingConditions => ExtractionError::MissingConditions(idx),
        other => ExtractionError::InvalidValue {
            rule: idx,
            message: other.to_string(),
        },
    })?;

    if let Some(model) = defaults.fact_model {
        check_fact_model(idx, &rule, model)?;
    }

    Ok(rule)
}

/// The requested fact type, unless the LLM named a different one
fn expected_type(
    idx: usize,
    obj: &Map<String, Value>,
    names: &[&str],
    expected: &str,
) -> Result<String, ExtractionError> {
    match text_field(obj, names) {
        Some(named) if simple_name(&named) != simple_name(expected) => {
            Err(ExtractionError::InvalidValue {
                rule: idx,
                message: format!("rule names fact type {}, the table uses {}", named, expected),
            })
        }
        _ => Ok(expected.to_string()),
    }
}

fn simple_name(type_name: &str) -> &str {
    type_name.rsplit('.').next().unwrap_or(type_name)
}

/// Fields must be declared on the input type, targets on the target type
///
/// Types the model does not declare are not checked.
fn check_fact_model(
    idx: usize,
    rule: &StructuredRule,
    model: &FactModel,
) -> Result<(), ExtractionError> {
    let unknown = |fact_type: &str, field: &str| ExtractionError::UnknownField {
        rule: idx,
        fact_type: fact_type.to_string(),
        field: field.to_string(),
    };

    if let Some(input) = model.get(&rule.input_type) {
        for condition in &rule.conditions {
            let root = condition.field.split('.').next().unwrap_or(&condition.field);
            if !input.has_field(root) {
                return Err(unknown(&rule.input_type, &condition.field));
            }
        }
    }
    if let Some(target) = model.get(&rule.target_type) {
        for action in &rule.actions {
            if !target.accepts_target(&action.target) {
                return Err(unknown(&rule.target_type, &action.target));
            }
        }
    }
    Ok(())
}

fn identifier(idx: usize, raw: String, role: &str) -> Result<String, ExtractionError> {
    to_identifier(&raw).ok_or_else(|| ExtractionError::InvalidValue {
        rule: idx,
        message: format!("{} '{}' is not an identifier", role, raw),
    })
}

fn parse_condition(idx: usize, json: &Value) -> Result<Condition, ExtractionError> {
    let obj = json.as_object().ok_or_else(|| {
        ExtractionError::InvalidFormat(format!("Rule {}: condition is not a JSON object", idx))
    })?;

    let field = text_field(obj, &["field", "factField"]).ok_or_else(|| {
        ExtractionError::InvalidFormat(format!("Rule {}: condition without 'field'", idx))
    })?;
    let field = identifier(idx, field, "field")?;

    let raw_operator = text_field(obj, &["operator", "op"]).ok_or_else(|| {
        ExtractionError::InvalidFormat(format!("Rule {}: condition without 'operator'", idx))
    })?;
    let operator = Operator::parse(&raw_operator).ok_or(ExtractionError::UnknownOperator {
        rule: idx,
        operator: raw_operator,
    })?;

    let raw_value = obj.get("value").unwrap_or(&Value::Null);
    let invalid = |message: String| ExtractionError::InvalidValue { rule: idx, message };

    let value = match operator {
        Operator::Matches => {
            let pattern = raw_value
                .as_str()
                .ok_or_else(|| invalid(format!("'{}' matches needs a pattern string", field)))?;
            Regex::new(pattern)
                .map_err(|e| invalid(format!("'{}' pattern does not compile: {}", field, e)))?;
            ConditionValue::Pattern(pattern.to_string())
        }
        Operator::In => {
            let items = match raw_value {
                Value::Array(items) => items
                    .iter()
                    .map(coerce_scalar)
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| invalid(format!("'{}' in-list holds a non-scalar", field)))?,
                Value::String(text) => text
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(coerce_text)
                    .collect(),
                other => vec![coerce_scalar(other)
                    .ok_or_else(|| invalid(format!("'{}' in-list is empty", field)))?],
            };
            if items.is_empty() {
                return Err(invalid(format!("'{}' in-list is empty", field)));
            }
            ConditionValue::Literal(Literal::List(items))
        }
        op if op.is_ordered() => {
            let number = coerce_number(raw_value).ok_or_else(|| {
                invalid(format!("'{}' {} needs a number, got {}", field, op.symbol(), raw_value))
            })?;
            ConditionValue::Literal(number)
        }
        _ => ConditionValue::Literal(
            coerce_scalar(raw_value)
                .ok_or_else(|| invalid(format!("'{}' has no comparable value", field)))?,
        ),
    };

    Ok(Condition {
        field,
        operator,
        value,
    })
}

fn parse_action(idx: usize, json: &Value) -> Result<Action, ExtractionError> {
    let obj = json.as_object().ok_or_else(|| {
        ExtractionError::InvalidFormat(format!("Rule {}: action is not a JSON object", idx))
    })?;

    let target = text_field(obj, &["target", "targetMethodOrField", "method", "field"])
        .ok_or_else(|| {
            ExtractionError::InvalidFormat(format!("Rule {}: action without 'target'", idx))
        })?;
    let target = identifier(idx, target, "action target")?;

    let raw = obj
        .get("argument")
        .or_else(|| obj.get("value"))
        .unwrap_or(&Value::Null);
    let argument = match raw {
        Value::String(text) => coerce_text(text),
        other => coerce_scalar(other).ok_or_else(|| ExtractionError::InvalidValue {
            rule: idx,
            message: format!("action '{}' has no usable argument", target),
        })?,
    };

    Ok(Action { target, argument })
}

fn text_field(obj: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| obj.get(*name).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// JSON scalar to literal; strings stay text
fn coerce_scalar(value: &Value) -> Option<Literal> {
    match value {
        Value::Bool(b) => Some(Literal::Boolean(*b)),
        Value::Number(n) => number_literal(n),
        Value::String(s) => Some(Literal::Text(s.clone())),
        _ => None,
    }
}

/// Text to literal; numeric and boolean text become numbers and booleans
fn coerce_text(text: &str) -> Literal {
    let trimmed = text.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Literal::Integer(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return Literal::Decimal(f);
        }
    }
    match trimmed.to_lowercase().as_str() {
        "true" => Literal::Boolean(true),
        "false" => Literal::Boolean(false),
        _ => Literal::Text(trimmed.to_string()),
    }
}

fn coerce_number(value: &Value) -> Option<Literal> {
    match value {
        Value::Number(n) => number_literal(n),
        Value::String(s) => match coerce_text(s) {
            literal @ (Literal::Integer(_) | Literal::Decimal(_)) => Some(literal),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_integer(value: &Value) -> Option<i32> {
    match coerce_number(value)? {
        Literal::Integer(i) => i32::try_from(i).ok(),
        Literal::Decimal(f) if f.fract() == 0.0 => i32::try_from(f as i64).ok(),
        _ => None,
    }
}

fn number_literal(n: &serde_json::Number) -> Option<Literal> {
    match n.as_i64() {
        Some(i) => Some(Literal::Integer(i)),
        None => n.as_f64().map(Literal::Decimal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> ParseDefaults<'static> {
        ParseDefaults {
            input_type: "RestaurantData",
            target_type: "EmployeeRecommendation",
            default_priority: 10,
            source_clause: None,
            fact_model: None,
        }
    }

    #[test]
    fn test_parse_single_rule() {
        let response = r#"{"rules": [{
            "conditions": [{"field": "size", "operator": "eq", "value": "large"}],
            "actions": [{"target": "setEmployeeCount", "argument": 10}],
            "clause": "if size is large then assign 10 employees"
        }]}"#;

        let rules = parse_rules(response, &defaults()).unwrap();
        assert_eq!(rules.len(), 1);
        let rule = &rules[0];
        assert_eq!(rule.conditions[0].field, "size");
        assert_eq!(rule.conditions[0].operator, Operator::Eq);
        assert_eq!(
            rule.conditions[0].value,
            ConditionValue::Literal(Literal::Text("large".into()))
        );
        assert_eq!(rule.actions[0].argument, Literal::Integer(10));
        assert_eq!(rule.priority, 10);
        assert_eq!(rule.input_type, "RestaurantData");
        assert_eq!(
            rule.source_clause.as_deref(),
            Some("if size is large then assign 10 employees")
        );
    }

    #[test]
    fn test_parse_bare_array_in_code_fence() {
        let response = "```json\n[{\"conditions\": [{\"field\": \"open\", \"operator\": \"==\", \"value\": true}], \"actions\": [{\"target\": \"setStaff\", \"argument\": \"3\"}], \"priority\": \"20\"}]\n```";
        let rules = parse_rules(response, &defaults()).unwrap();
        assert_eq!(rules[0].conditions[0].operator, Operator::Eq);
        assert_eq!(rules[0].actions[0].argument, Literal::Integer(3));
        assert_eq!(rules[0].priority, 20);
    }

    #[test]
    fn test_ordered_operator_coerces_numeric_text() {
        let response = r#"[{"conditions": [{"field": "dailyCustomers", "operator": "greater than", "value": "250.5"}],
            "actions": [{"target": "setEmployeeCount", "argument": 12}]}]"#;
        let rules = parse_rules(response, &defaults()).unwrap();
        assert_eq!(rules[0].conditions[0].operator, Operator::Gt);
        assert_eq!(
            rules[0].conditions[0].value,
            ConditionValue::Literal(Literal::Decimal(250.5))
        );
    }

    #[test]
    fn test_ordered_operator_rejects_text() {
        let response = r#"[{"conditions": [{"field": "size", "operator": "gt", "value": "large"}],
            "actions": [{"target": "setEmployeeCount", "argument": 12}]}]"#;
        assert!(matches!(
            parse_rules(response, &defaults()),
            Err(ExtractionError::InvalidValue { rule: 0, .. })
        ));
    }

    #[test]
    fn test_in_operator_splits_text() {
        let response = r#"[{"conditions": [{"field": "size", "operator": "in", "value": "small, medium"}],
            "actions": [{"target": "setEmployeeCount", "argument": 5}]}]"#;
        let rules = parse_rules(response, &defaults()).unwrap();
        assert_eq!(
            rules[0].conditions[0].value,
            ConditionValue::Literal(Literal::List(vec![
                Literal::Text("small".into()),
                Literal::Text("medium".into()),
            ]))
        );
    }

    #[test]
    fn test_matches_requires_valid_pattern() {
        let ok = r#"[{"conditions": [{"field": "name", "operator": "matches", "value": "^Cafe.*"}],
            "actions": [{"target": "setEmployeeCount", "argument": 4}]}]"#;
        let rules = parse_rules(ok, &defaults()).unwrap();
        assert_eq!(
            rules[0].conditions[0].value,
            ConditionValue::Pattern("^Cafe.*".into())
        );

        let bad = r#"[{"conditions": [{"field": "name", "operator": "matches", "value": "(unclosed"}],
            "actions": [{"target": "setEmployeeCount", "argument": 4}]}]"#;
        assert!(matches!(
            parse_rules(bad, &defaults()),
            Err(ExtractionError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_unknown_operator() {
        let response = r#"[{"conditions": [{"field": "size", "operator": "roughly", "value": 3}],
            "actions": [{"target": "setEmployeeCount", "argument": 5}]}]"#;
        assert_eq!(
            parse_rules(response, &defaults()).unwrap_err(),
            ExtractionError::UnknownOperator {
                rule: 0,
                operator: "roughly".into()
            }
        );
    }

    #[test]
    fn test_no_actions() {
        let response = r#"{"rules": [{"conditions": [{"field": "size", "operator": "eq", "value": "large"}], "actions": []}]}"#;
        assert_eq!(
            parse_rules(response, &defaults()).unwrap_err(),
            ExtractionError::NoActions(0)
        );
    }

    #[test]
    fn test_missing_conditions_unless_baseline() {
        let response = r#"[{"conditions": [], "actions": [{"target": "setEmployeeCount", "argument": 2}]}]"#;
        assert_eq!(
            parse_rules(response, &defaults()).unwrap_err(),
            ExtractionError::MissingConditions(0)
        );

        let response = r#"[{"conditions": [], "baseline": true, "actions": [{"target": "setEmployeeCount", "argument": 2}]}]"#;
        let rules = parse_rules(response, &defaults()).unwrap();
        assert!(rules[0].baseline);
    }

    #[test]
    fn test_empty_rules() {
        assert_eq!(
            parse_rules(r#"{"rules": []}"#, &defaults()).unwrap_err(),
            ExtractionError::NoRules
        );
    }

    #[test]
    fn test_not_json() {
        assert!(matches!(
            parse_rules("Sorry, I cannot help.", &defaults()),
            Err(ExtractionError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_source_clause_default_wins() {
        let response = r#"[{"conditions": [{"field": "size", "operator": "eq", "value": "small"}],
            "actions": [{"target": "setEmployeeCount", "argument": 5}], "clause": "paraphrase"}]"#;
        let mut defaults = defaults();
        defaults.source_clause = Some("if size is small then assign 5");
        let rules = parse_rules(response, &defaults).unwrap();
        assert_eq!(rules[0].source_clause.as_deref(), Some("if size is small then assign 5"));
    }

    #[test]
    fn test_spaced_names_become_camel_case() {
        let response = r#"[{"conditions": [{"field": "restaurant size", "operator": "eq", "value": "large"}],
            "actions": [{"target": "set employee count", "argument": 10}]}]"#;
        let rules = parse_rules(response, &defaults()).unwrap();
        assert_eq!(rules[0].conditions[0].field, "restaurantSize");
        assert_eq!(rules[0].actions[0].target, "setEmployeeCount");
    }

    #[test]
    fn test_non_identifier_field_rejected() {
        let response = r#"[{"conditions": [{"field": "size (sq ft)", "operator": "gt", "value": 200}],
            "actions": [{"target": "setEmployeeCount", "argument": 10}]}]"#;
        assert!(matches!(
            parse_rules(response, &defaults()),
            Err(ExtractionError::InvalidValue { rule: 0, message }) if message.contains("size (sq ft)")
        ));

        let response = r#"[{"conditions": [{"field": "size", "operator": "eq", "value": "large"}],
            "actions": [{"target": "10 staff", "argument": 10}]}]"#;
        assert!(matches!(
            parse_rules(response, &defaults()),
            Err(ExtractionError::InvalidValue { rule: 0, .. })
        ));
    }

    #[test]
    fn test_foreign_fact_type_rejected() {
        let response = r#"[{"conditions": [{"field": "size", "operator": "eq", "value": "large"}],
            "actions": [{"target": "setEmployeeCount", "argument": 10}],
            "inputType": "com.myspace.restopsrecomms.RestaurantData"}]"#;
        let rules = parse_rules(response, &defaults()).unwrap();
        assert_eq!(rules[0].input_type, "RestaurantData");

        let response = r#"[{"conditions": [{"field": "size", "operator": "eq", "value": "large"}],
            "actions": [{"target": "setEmployeeCount", "argument": 10}],
            "targetType": "ShiftPlan"}]"#;
        assert!(matches!(
            parse_rules(response, &defaults()),
            Err(ExtractionError::InvalidValue { rule: 0, message }) if message.contains("ShiftPlan")
        ));
    }

    #[test]
    fn test_fact_model_rejects_undeclared_names() {
        use rulewright_domain::FactType;

        let model = FactModel::new()
            .with_type("RestaurantData", FactType::new("com.acme").with_field("size", "String"))
            .with_type(
                "EmployeeRecommendation",
                FactType::new("com.acme").with_field("employeeCount", "int"),
            );
        let mut defaults = defaults();
        defaults.fact_model = Some(&model);

        let ok = r#"[{"conditions": [{"field": "size", "operator": "eq", "value": "large"}],
            "actions": [{"target": "setEmployeeCount", "argument": 10}]}]"#;
        assert!(parse_rules(ok, &defaults).is_ok());

        let bad_field = r#"[{"conditions": [{"field": "seats", "operator": "gt", "value": 40}],
            "actions": [{"target": "setEmployeeCount", "argument": 10}]}]"#;
        assert_eq!(
            parse_rules(bad_field, &defaults).unwrap_err(),
            ExtractionError::UnknownField {
                rule: 0,
                fact_type: "RestaurantData".into(),
                field: "seats".into(),
            }
        );

        let bad_target = r#"[{"conditions": [{"field": "size", "operator": "eq", "value": "large"}],
            "actions": [{"target": "setHeadcount", "argument": 10}]}]"#;
        assert!(matches!(
            parse_rules(bad_target, &defaults),
            Err(ExtractionError::UnknownField { field, .. }) if field == "setHeadcount"
        ));
    }

    #[test]
    fn test_extract_json_variants() {
        assert_eq!(extract_json(" {\"a\": 1} ").unwrap(), "{\"a\": 1}");
        assert_eq!(extract_json("```json\n{\"a\": 1}\n```").unwrap(), "{\"a\": 1}");
        assert_eq!(extract_json("```\n[1]\n```").unwrap(), "[1]");
        assert!(extract_json("```").is_err());
    }
}
