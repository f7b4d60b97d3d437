//! Structured rule module - the intermediate representation of one rule

use std::fmt;

/// Comparison operator of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equality
    Eq,

    /// Strictly greater than
    Gt,

    /// Greater than or equal
    Gte,

    /// Strictly less than
    Lt,

    /// Less than or equal
    Lte,

    /// Regular expression match
    Matches,

    /// Membership in a list of literals
    In,
}

impl Operator {
    /// All operators, in declaration order
    pub const ALL: [Operator; 7] = [
        Operator::Eq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Matches,
        Operator::In,
    ];

    /// Get the operator name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Matches => "matches",
            Operator::In => "in",
        }
    }

    /// Get the operator as it appears in a rule-engine condition column
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Matches => "matches",
            Operator::In => "in",
        }
    }

    /// Parse an operator from its name, its symbol or a common English alias
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "eq" | "==" | "=" | "equals" | "equal" | "is" => Some(Operator::Eq),
            "gt" | ">" | "greater_than" | "above" | "more_than" => Some(Operator::Gt),
            "gte" | ">=" | "greater_than_or_equal" | "greater_or_equal" | "at_least" => {
                Some(Operator::Gte)
            }
            "lt" | "<" | "less_than" | "below" | "fewer_than" => Some(Operator::Lt),
            "lte" | "<=" | "less_than_or_equal" | "less_or_equal" | "at_most" => {
                Some(Operator::Lte)
            }
            "matches" | "match" | "regex" | "~=" => Some(Operator::Matches),
            "in" | "one_of" | "any_of" => Some(Operator::In),
            _ => None,
        }
    }

    /// Whether the operator compares by ordering (and so needs a numeric value)
    pub fn is_ordered(&self) -> bool {
        matches!(self, Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte)
    }
}

impl std::str::FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown operator: {}", s))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a literal, used for column type inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    /// Whole number
    Integer,
    /// Fractional number
    Decimal,
    /// true / false
    Boolean,
    /// Free text
    Text,
    /// List of literals
    List,
}

/// A literal value appearing in a condition or as an action argument
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Whole number
    Integer(i64),

    /// Fractional number
    Decimal(f64),

    /// Boolean flag
    Boolean(bool),

    /// Free text
    Text(String),

    /// List of literals (right-hand side of `in`)
    List(Vec<Literal>),
}

impl Literal {
    /// Get the kind of this literal
    pub fn kind(&self) -> LiteralKind {
        match self {
            Literal::Integer(_) => LiteralKind::Integer,
            Literal::Decimal(_) => LiteralKind::Decimal,
            Literal::Boolean(_) => LiteralKind::Boolean,
            Literal::Text(_) => LiteralKind::Text,
            Literal::List(_) => LiteralKind::List,
        }
    }

    /// Whether this literal is a number
    pub fn is_numeric(&self) -> bool {
        matches!(self, Literal::Integer(_) | Literal::Decimal(_))
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(v) => write!(f, "{}", v),
            Literal::Decimal(v) => write!(f, "{}", v),
            Literal::Boolean(v) => write!(f, "{}", v),
            Literal::Text(v) => f.write_str(v),
            Literal::List(items) => {
                let rendered: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "{}", rendered.join(", "))
            }
        }
    }
}

/// Right-hand side of a condition
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    /// A literal to compare against
    Literal(Literal),

    /// A regular expression source (only valid with [`Operator::Matches`])
    Pattern(String),
}

impl fmt::Display for ConditionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionValue::Literal(l) => write!(f, "{}", l),
            ConditionValue::Pattern(p) => f.write_str(p),
        }
    }
}

/// A single `field operator value` test over the input fact
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Field of the input fact being tested
    pub field: String,

    /// Comparison operator
    pub operator: Operator,

    /// Value compared against
    pub value: ConditionValue,
}

impl Condition {
    /// Create a condition comparing `field` against a literal
    pub fn new(field: impl Into<String>, operator: Operator, value: Literal) -> Self {
        Self {
            field: field.into(),
            operator,
            value: ConditionValue::Literal(value),
        }
    }
}

/// An effect on the target fact: call a setter or assign a field
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    /// Method or field of the target fact
    pub target: String,

    /// Argument passed to the method or assigned to the field
    pub argument: Literal,
}

impl Action {
    /// Create a new action
    pub fn new(target: impl Into<String>, argument: Literal) -> Self {
        Self {
            target: target.into(),
            argument,
        }
    }
}

/// A structured rule: conditions, actions and a priority
///
/// Produced by the extractor, consumed by the slot filler. Transient: it
/// lives for the duration of one compilation request.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredRule {
    /// Ordered conditions; empty only for a baseline rule
    pub conditions: Vec<Condition>,

    /// Ordered actions; never empty
    pub actions: Vec<Action>,

    /// Salience: higher executes first
    pub priority: i32,

    /// Catch-all rule with no conditions
    pub baseline: bool,

    /// Fact type the conditions reason over
    pub input_type: String,

    /// Fact type the actions modify
    pub target_type: String,

    /// Clause of the original text this rule was extracted from
    pub source_clause: Option<String>,
}

impl StructuredRule {
    /// Check the structural invariants of a rule
    ///
    /// - actions are never empty
    /// - conditions are empty only when the rule is a baseline rule
    /// - condition fields and action targets are identifiers
    /// - `matches` carries a pattern, `in` carries a list, ordered
    ///   comparisons carry a number
    pub fn validate(&self) -> Result<(), RuleViolation> {
        if self.actions.is_empty() {
            return Err(RuleViolation::NoActions);
        }
        if self.conditions.is_empty() && !self.baseline {
            return Err(RuleViolation::MissingConditions);
        }

        let names = self
            .conditions
            .iter()
            .map(|c| c.field.as_str())
            .chain(self.actions.iter().map(|a| a.target.as_str()));
        if let Some(name) = names.into_iter().find(|name| !is_identifier(name)) {
            return Err(RuleViolation::NotAnIdentifier(name.to_string()));
        }

        for condition in &self.conditions {
            let consistent = match (&condition.operator, &condition.value) {
                (Operator::Matches, ConditionValue::Pattern(_)) => true,
                (Operator::Matches, _) => false,
                (_, ConditionValue::Pattern(_)) => false,
                (Operator::In, ConditionValue::Literal(Literal::List(_))) => true,
                (Operator::In, _) => false,
                (op, ConditionValue::Literal(l)) if op.is_ordered() => l.is_numeric(),
                (_, ConditionValue::Literal(Literal::List(_))) => false,
                _ => true,
            };
            if !consistent {
                return Err(RuleViolation::OperatorValueMismatch {
                    field: condition.field.clone(),
                    operator: condition.operator,
                });
            }
        }

        Ok(())
    }
}

/// Violated invariant of a [`StructuredRule`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    /// The rule has no effect
    NoActions,

    /// A non-baseline rule has no conditions
    MissingConditions,

    /// A condition field or action target is not an identifier
    NotAnIdentifier(String),

    /// The value does not fit the operator
    OperatorValueMismatch {
        /// Field of the offending condition
        field: String,
        /// Operator of the offending condition
        operator: Operator,
    },
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleViolation::NoActions => write!(f, "rule has no actions"),
            RuleViolation::MissingConditions => {
                write!(f, "rule has no conditions and is not a baseline rule")
            }
            RuleViolation::NotAnIdentifier(name) => write!(f, "'{}' is not an identifier", name),
            RuleViolation::OperatorValueMismatch { field, operator } => write!(
                f,
                "value of condition on '{}' does not fit operator '{}'",
                field, operator
            ),
        }
    }
}

impl std::error::Error for RuleViolation {}

/// Dotted identifier such as `size` or `address.city`
pub fn is_identifier(text: &str) -> bool {
    !text.is_empty()
        && text.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

/// Turn a loosely written name into a camelCase identifier
///
/// Words separated by spaces or hyphens are joined (`restaurant size`
/// becomes `restaurantSize`). Returns `None` when the result is still not
/// an identifier.
pub fn to_identifier(raw: &str) -> Option<String> {
    let words: Vec<&str> = raw
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|w| !w.is_empty())
        .collect();

    let candidate = match words.as_slice() {
        [] => return None,
        [single] => (*single).to_string(),
        [first, rest @ ..] => {
            let mut name = recase_first(first, false);
            for word in rest {
                name.push_str(&recase_first(word, true));
            }
            name
        }
    };

    is_identifier(&candidate).then_some(candidate)
}

fn recase_first(word: &str, upper: bool) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if upper => first.to_uppercase().chain(chars).collect(),
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size_rule(size: &str, count: i64) -> StructuredRule {
        StructuredRule {
            conditions: vec![Condition::new("size", Operator::Eq, Literal::Text(size.into()))],
            actions: vec![Action::new("setEmployeeCount", Literal::Integer(count))],
            priority: 10,
            baseline: false,
            input_type: "RestaurantData".to_string(),
            target_type: "EmployeeRecommendation".to_string(),
            source_clause: None,
        }
    }

    #[test]
    fn test_operator_parsing() {
        assert_eq!(Operator::parse("gte"), Some(Operator::Gte));
        assert_eq!(Operator::parse(">="), Some(Operator::Gte));
        assert_eq!(Operator::parse("At Least"), Some(Operator::Gte));
        assert_eq!(Operator::parse("=="), Some(Operator::Eq));
        assert_eq!(Operator::parse("one-of"), Some(Operator::In));
        assert_eq!(Operator::parse("between"), None);
        assert!("roughly".parse::<Operator>().is_err());
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(Operator::Gte.symbol(), ">=");
        assert_eq!(Operator::Eq.symbol(), "==");
        assert_eq!(Operator::Matches.symbol(), "matches");
    }

    #[test]
    fn test_valid_rule() {
        assert!(size_rule("large", 10).validate().is_ok());
    }

    #[test]
    fn test_rule_without_actions_is_invalid() {
        let mut rule = size_rule("large", 10);
        rule.actions.clear();
        assert_eq!(rule.validate(), Err(RuleViolation::NoActions));
    }

    #[test]
    fn test_baseline_rule_may_omit_conditions() {
        let mut rule = size_rule("large", 10);
        rule.conditions.clear();
        assert_eq!(rule.validate(), Err(RuleViolation::MissingConditions));

        rule.baseline = true;
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn test_operator_value_mismatch() {
        let mut rule = size_rule("large", 10);
        rule.conditions[0].operator = Operator::Gt;
        assert!(matches!(
            rule.validate(),
            Err(RuleViolation::OperatorValueMismatch { .. })
        ));

        rule.conditions[0].operator = Operator::Matches;
        assert!(rule.validate().is_err());

        rule.conditions[0].value = ConditionValue::Pattern("^l.*".to_string());
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn test_in_requires_list() {
        let mut rule = size_rule("large", 10);
        rule.conditions[0].operator = Operator::In;
        assert!(rule.validate().is_err());

        rule.conditions[0].value = ConditionValue::Literal(Literal::List(vec![
            Literal::Text("large".into()),
            Literal::Text("medium".into()),
        ]));
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn test_non_identifier_field_is_invalid() {
        let mut rule = size_rule("large", 10);
        rule.conditions[0].field = "restaurant size".into();
        assert_eq!(
            rule.validate(),
            Err(RuleViolation::NotAnIdentifier("restaurant size".into()))
        );

        let mut rule = size_rule("large", 10);
        rule.actions[0].target = "set count!".into();
        assert!(matches!(rule.validate(), Err(RuleViolation::NotAnIdentifier(_))));
    }

    #[test]
    fn test_to_identifier() {
        assert_eq!(to_identifier("size").as_deref(), Some("size"));
        assert_eq!(to_identifier("restaurant size").as_deref(), Some("restaurantSize"));
        assert_eq!(to_identifier("Daily Customers").as_deref(), Some("dailyCustomers"));
        assert_eq!(to_identifier("employee-count").as_deref(), Some("employeeCount"));
        assert_eq!(to_identifier("address.city").as_deref(), Some("address.city"));
        assert_eq!(to_identifier("size (sq ft)"), None);
        assert_eq!(to_identifier("2nd floor"), None);
        assert_eq!(to_identifier("   "), None);
    }

    #[test]
    fn test_literal_display() {
        assert_eq!(Literal::Integer(5).to_string(), "5");
        assert_eq!(Literal::Decimal(2.5).to_string(), "2.5");
        let list = Literal::List(vec![Literal::Text("a".into()), Literal::Text("b".into())]);
        assert_eq!(list.to_string(), "a, b");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: every operator parses back from its name and its symbol
        #[test]
        fn test_operator_name_and_symbol_roundtrip(idx in 0usize..7) {
            let op = Operator::ALL[idx];
            prop_assert_eq!(Operator::parse(op.as_str()), Some(op));
            prop_assert_eq!(Operator::parse(op.symbol()), Some(op));
        }

        /// Property: parsing ignores case and surrounding whitespace
        #[test]
        fn test_operator_parse_case_insensitive(idx in 0usize..7, pad in "[ ]{0,3}") {
            let op = Operator::ALL[idx];
            let input = format!("{}{}{}", pad, op.as_str().to_uppercase(), pad);
            prop_assert_eq!(Operator::parse(&input), Some(op));
        }

        /// Property: whatever `to_identifier` returns is an identifier
        #[test]
        fn test_to_identifier_yields_identifiers(raw in "[a-zA-Z0-9 _.()-]{0,24}") {
            if let Some(name) = to_identifier(&raw) {
                prop_assert!(is_identifier(&name));
            }
        }
    }
}
