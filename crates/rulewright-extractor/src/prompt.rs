//! LLM prompt engineering for rule extraction

use rulewright_domain::{FactModel, FactType};

/// Builds prompts that ask the LLM for structured rules
pub struct ExtractionPromptBuilder {
    text: String,
    input_type: String,
    target_type: String,
    single_rule: bool,
    input_fields: Option<String>,
    target_fields: Option<String>,
}

impl ExtractionPromptBuilder {
    /// Create a new prompt builder
    pub fn new(text: impl Into<String>, input_type: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            input_type: input_type.into(),
            target_type: target_type.into(),
            single_rule: false,
            input_fields: None,
            target_fields: None,
        }
    }

    /// List the declared fields of the input and target types
    pub fn with_fact_model(mut self, model: Option<&FactModel>) -> Self {
        if let Some(model) = model {
            self.input_fields = model.get(&self.input_type).map(field_list);
            self.target_fields = model.get(&self.target_type).map(field_list);
        }
        self
    }

    /// Ask for exactly one rule (per-clause extraction)
    pub fn single_rule(mut self) -> Self {
        self.single_rule = true;
        self
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(EXTRACTION_INSTRUCTIONS);
        prompt.push_str("\n\n");

        prompt.push_str(&format!(
            "Conditions test fields of the fact type: {}\n",
            self.input_type
        ));
        prompt.push_str(&format!(
            "Actions set fields on the fact type: {}\n",
            self.target_type
        ));
        if let Some(fields) = &self.input_fields {
            prompt.push_str(&format!("Fields of {}: {}\n", self.input_type, fields));
        }
        if let Some(fields) = &self.target_fields {
            prompt.push_str(&format!(
                "Fields of {}: {} (an action targets one of these or its setter)\n",
                self.target_type, fields
            ));
        }
        if self.input_fields.is_some() || self.target_fields.is_some() {
            prompt.push_str("Use only the fields listed; do not invent others.\n");
        }
        if self.single_rule {
            prompt.push_str("The text holds exactly one rule; return exactly one entry in \"rules\".\n");
        } else {
            prompt.push_str("Return one entry in \"rules\" per \"if ... then ...\" statement, in the order they appear.\n");
        }
        prompt.push('\n');

        prompt.push_str("Rule text:\n");
        prompt.push_str("---\n");
        prompt.push_str(&self.text);
        prompt.push_str("\n---\n\n");

        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }
}

fn field_list(fact_type: &FactType) -> String {
    fact_type
        .fields
        .iter()
        .map(|(name, type_name)| format!("{} ({})", name, type_name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// JSON schema of the extraction response, sent as the output format
pub const RULES_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "rules": {
      "type": "array",
      "items": {
        "type": "object",
        "properties": {
          "conditions": {
            "type": "array",
            "items": {
              "type": "object",
              "properties": {
                "field": {"type": "string"},
                "operator": {"type": "string", "enum": ["eq", "gt", "gte", "lt", "lte", "matches", "in"]},
                "value": {}
              },
              "required": ["field", "operator", "value"]
            }
          },
          "actions": {
            "type": "array",
            "items": {
              "type": "object",
              "properties": {
                "target": {"type": "string"},
                "argument": {}
              },
              "required": ["target", "argument"]
            }
          },
          "priority": {"type": "integer"},
          "baseline": {"type": "boolean"},
          "clause": {"type": "string"}
        },
        "required": ["conditions", "actions"]
      }
    }
  },
  "required": ["rules"]
}"#;

const EXTRACTION_INSTRUCTIONS: &str = r#"Extract decision rules from the business rule text below.

Each rule has:
- "conditions": tests on fields of the input fact, each {"field", "operator", "value"}
- "actions": effects on the target fact, each {"target", "argument"} where
  "target" is the setter or field being assigned (e.g. "setEmployeeCount")
- "priority": integer salience, higher runs first; omit when the text states none
- "baseline": true only for a catch-all rule that applies when nothing else does;
  a baseline rule has no conditions
- "clause": the exact words of the text this rule came from

Operators: eq, gt, gte, lt, lte, matches (value is a regular expression),
in (value is a list).

Rules:
- Use camelCase field names (e.g. "size", "dailyCustomers")
- Numbers stay numbers: "10 employees" gives the argument 10
- A range such as "sales between 1000 and 5000" is two conditions: gte 1000 and lt 5000
- A rule without a "then" part has no actions; return it with an empty "actions" list
- Do not invent conditions or actions that the text does not state"#;

const OUTPUT_FORMAT_REMINDER: &str = r#"Output format (JSON object only, no additional text):
{
  "rules": [
    {
      "conditions": [{"field": "size", "operator": "eq", "value": "large"}],
      "actions": [{"target": "setEmployeeCount", "argument": 10}],
      "clause": "when the restaurant is large, staff it with 10 employees"
    }
  ]
}

Remember: Return ONLY valid JSON, no markdown code blocks, no explanations."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_includes_text_and_types() {
        let prompt = ExtractionPromptBuilder::new(
            "if size is large then assign 10 employees",
            "RestaurantData",
            "EmployeeRecommendation",
        )
        .build();

        assert!(prompt.starts_with("Extract decision rules"));
        assert!(prompt.contains("if size is large then assign 10 employees"));
        assert!(prompt.contains("fact type: RestaurantData"));
        assert!(prompt.contains("fact type: EmployeeRecommendation"));
        assert!(prompt.contains("one entry in \"rules\" per"));
    }

    #[test]
    fn test_single_rule_prompt() {
        let prompt = ExtractionPromptBuilder::new("a then b", "In", "Out")
            .single_rule()
            .build();
        assert!(prompt.contains("exactly one rule"));
    }

    #[test]
    fn test_fact_model_fields_listed() {
        let model = FactModel::new()
            .with_type(
                "RestaurantData",
                FactType::new("com.acme").with_field("size", "String").with_field("dailyCustomers", "int"),
            )
            .with_type("EmployeeRecommendation", FactType::default().with_field("employeeCount", "int"));

        let prompt = ExtractionPromptBuilder::new("text", "RestaurantData", "EmployeeRecommendation")
            .with_fact_model(Some(&model))
            .build();
        assert!(prompt.contains("Fields of RestaurantData: dailyCustomers (int), size (String)"));
        assert!(prompt.contains("Fields of EmployeeRecommendation: employeeCount (int)"));
        assert!(prompt.contains("Use only the fields listed"));

        let plain = ExtractionPromptBuilder::new("text", "RestaurantData", "EmployeeRecommendation")
            .with_fact_model(None)
            .build();
        assert!(!plain.contains("Fields of"));
    }

    #[test]
    fn test_schema_is_json() {
        let schema: serde_json::Value = serde_json::from_str(RULES_SCHEMA).unwrap();
        assert_eq!(schema["required"][0], "rules");
        assert_eq!(
            schema["properties"]["rules"]["items"]["properties"]["conditions"]["items"]
                ["properties"]["operator"]["enum"]
                .as_array()
                .unwrap()
                .len(),
            7
        );
    }
}
