//! LLM prompt engineering for table naming

use crate::layout::TableLayout;
use rulewright_domain::Exemplar;
use rulewright_template::CompiledDocument;

/// Builds prompts that ask the LLM to name a laid-out table
pub struct GenerationPromptBuilder<'a> {
    layout: &'a TableLayout,
    input_type: &'a str,
    target_type: &'a str,
    exemplars: &'a [Exemplar],
    feedback: &'a [String],
}

impl<'a> GenerationPromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(layout: &'a TableLayout, input_type: &'a str, target_type: &'a str) -> Self {
        Self {
            layout,
            input_type,
            target_type,
            exemplars: &[],
            feedback: &[],
        }
    }

    /// Add exemplars as naming guidance
    pub fn with_exemplars(mut self, exemplars: &'a [Exemplar]) -> Self {
        self.exemplars = exemplars;
        self
    }

    /// Add reasons the previous attempt was rejected
    pub fn with_feedback(mut self, feedback: &'a [String]) -> Self {
        self.feedback = feedback;
        self
    }

    /// Build the complete naming prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(NAMING_INSTRUCTIONS);
        prompt.push_str("\n\n");

        prompt.push_str(&format!(
            "Condition columns (fields of {}):\n",
            self.input_type
        ));
        for (idx, column) in self.layout.condition_columns.iter().enumerate() {
            prompt.push_str(&format!(
                "{}. {} {}\n",
                idx + 1,
                column.field,
                column.operator.symbol()
            ));
        }
        if self.layout.condition_columns.is_empty() {
            prompt.push_str("(none)\n");
        }

        prompt.push_str(&format!("\nAction columns (set on {}):\n", self.target_type));
        for (idx, column) in self.layout.action_columns.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", idx + 1, column.fact_field));
        }

        prompt.push_str("\nRows:\n");
        for (idx, row) in self.layout.rows.iter().enumerate() {
            let clause = row.source_clause.as_deref().unwrap_or("(no source text)");
            let marker = if row.baseline { " [baseline]" } else { "" };
            prompt.push_str(&format!("{}. {}{}\n", idx + 1, clause, marker));
        }
        prompt.push('\n');

        let guidance: Vec<String> = self.exemplars.iter().map(describe_exemplar).collect();
        if !guidance.is_empty() {
            prompt.push_str("Previously compiled tables (follow their naming style, not their values):\n");
            for line in &guidance {
                prompt.push_str(line);
            }
            prompt.push('\n');
        }

        if !self.feedback.is_empty() {
            prompt.push_str("Your previous answer was rejected:\n");
            for reason in self.feedback {
                prompt.push_str(&format!("- {}\n", reason));
            }
            prompt.push('\n');
        }

        prompt.push_str(&format!(
            "Return exactly {} condition headers, {} action headers and {} row descriptions.\n\n",
            self.layout.condition_columns.len(),
            self.layout.action_columns.len(),
            self.layout.rows.len()
        ));
        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }
}

/// One guidance entry: the exemplar's rule text and the names it used
fn describe_exemplar(exemplar: &Exemplar) -> String {
    let mut line = format!("- Rule: {}\n", exemplar.rule_text.trim());
    if let Ok(table) = CompiledDocument::new(exemplar.compiled_document.as_str()).table() {
        let conditions: Vec<&str> = table.condition_columns().map(|c| c.header.as_str()).collect();
        let actions: Vec<&str> = table.action_columns.iter().map(|a| a.header.as_str()).collect();
        line.push_str(&format!(
            "  tableName: {}; condition headers: {}; action headers: {}\n",
            table.table_name,
            conditions.join(", "),
            actions.join(", ")
        ));
    }
    line
}

const NAMING_INSTRUCTIONS: &str = r#"Name the decision table described below.

The columns and rows are already fixed. Provide only:
- "tableName": a short kebab-case name describing the table's purpose
  (e.g. "restaurant-staffing-by-size")
- "conditionHeaders": one short title-case header per condition column, in order
- "actionHeaders": one short title-case header per action column, in order
- "rowDescriptions": one short sentence per row saying what the rule does, in order

Headers must be unique within the table."#;

const OUTPUT_FORMAT_REMINDER: &str = r#"Output format (JSON object only, no additional text):
{
  "tableName": "restaurant-staffing-by-size",
  "conditionHeaders": ["Restaurant Size"],
  "actionHeaders": ["Employees"],
  "rowDescriptions": ["Small restaurants get 5 employees"]
}

Remember: Return ONLY valid JSON, no markdown code blocks, no explanations."#;
