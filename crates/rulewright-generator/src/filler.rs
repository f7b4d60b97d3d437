//! Slot Filler: lays out the table, asks the LLM for names, renders the candidate

use crate::config::GeneratorConfig;
use crate::error::GenerationError;
use crate::layout::TableLayout;
use crate::naming::{slugify, TableNaming, NAMING_SCHEMA};
use crate::prompt::GenerationPromptBuilder;
use rulewright_domain::traits::LlmProvider;
use rulewright_domain::{Exemplar, StructuredRule, TableMetadata};
use rulewright_llm::LlmError;
use rulewright_template::{
    slots, DataType, FragmentKind, SchemaTemplate, SlotValue, SlotValues, TemplateError,
    ATTRIBUTE_HEADER,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Inputs of one fill
#[derive(Debug, Clone, Copy)]
pub struct FillRequest<'a> {
    /// Rules of the batch, one row each
    pub rules: &'a [StructuredRule],
    /// Retrieved exemplars, most similar first
    pub exemplars: &'a [Exemplar],
    /// Template to instantiate
    pub template: &'a SchemaTemplate,
    /// Table naming and fact types
    pub metadata: &'a TableMetadata,
    /// Reasons the previous candidate was rejected
    pub feedback: &'a [String],
    /// Upper bound for the LLM call (falls back to the configured timeout)
    pub timeout: Option<Duration>,
}

/// Produces slot-filled candidate documents
///
/// Pure with respect to its inputs: it never touches the example index.
pub struct SlotFiller<L>
where
    L: LlmProvider,
{
    llm_provider: Arc<L>,
    config: GeneratorConfig,
}

impl<L> SlotFiller<L>
where
    L: LlmProvider<Error = LlmError> + Send + Sync + 'static,
{
    /// Create a new slot filler owning its provider
    pub fn new(llm_provider: L, config: GeneratorConfig) -> Self {
        Self::with_shared(Arc::new(llm_provider), config)
    }

    /// Create a new slot filler sharing a provider with other stages
    pub fn with_shared(llm_provider: Arc<L>, config: GeneratorConfig) -> Self {
        Self {
            llm_provider,
            config,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Fill the template for a batch of rules, returning the raw candidate
    pub async fn fill(&self, request: FillRequest<'_>) -> Result<String, GenerationError> {
        if request.rules.is_empty() {
            return Err(GenerationError::NoRules);
        }
        check_fact_types(request.rules, request.metadata)?;

        let layout = TableLayout::build(request.rules);
        let exemplars = &request.exemplars[..request.exemplars.len().min(self.config.max_exemplars)];
        let feedback =
            &request.feedback[..request.feedback.len().min(self.config.max_feedback_reasons)];

        let prompt = GenerationPromptBuilder::new(
            &layout,
            &request.metadata.input_type,
            &request.metadata.target_type,
        )
        .with_exemplars(exemplars)
        .with_feedback(feedback)
        .build();

        let budget = request
            .timeout
            .map(|t| t.min(self.config.generation_timeout()))
            .unwrap_or_else(|| self.config.generation_timeout());

        let conditions = layout.condition_columns.len();
        let actions = layout.action_columns.len();
        let rows = layout.rows.len();

        let naming = match self.call_llm(prompt, budget).await {
            Ok(response) => TableNaming::parse(&response, conditions, actions, rows)
                .unwrap_or_else(|| {
                    warn!("Naming response is not a JSON object; leaving names unresolved");
                    TableNaming::unresolved(conditions, actions, rows)
                }),
            Err(LlmError::Timeout(_)) => {
                return Err(GenerationError::Timeout(budget.as_millis() as u64))
            }
            Err(e) => {
                warn!("Naming call failed, leaving names unresolved: {}", e);
                TableNaming::unresolved(conditions, actions, rows)
            }
        };

        Ok(render_candidate(request.template, &layout, &naming, request.metadata)?)
    }

    async fn call_llm(&self, prompt: String, budget: Duration) -> Result<String, LlmError> {
        let llm = Arc::clone(&self.llm_provider);
        debug!("Naming prompt length: {} chars", prompt.len());

        match timeout(
            budget,
            tokio::task::spawn_blocking(move || llm.generate_structured(&prompt, NAMING_SCHEMA)),
        )
        .await
        {
            Err(_) => Err(LlmError::Timeout(format!("no answer within {:?}", budget))),
            Ok(Err(join)) => Err(LlmError::Other(format!("Task join error: {}", join))),
            Ok(Ok(result)) => result,
        }
    }
}

/// Every rule must reason over the table's input type and modify its target type
fn check_fact_types(rules: &[StructuredRule], metadata: &TableMetadata) -> Result<(), GenerationError> {
    let simple = |name: &str| name.rsplit('.').next().unwrap_or(name).to_string();
    for (idx, rule) in rules.iter().enumerate() {
        for (found, expected) in [
            (&rule.input_type, &metadata.input_type),
            (&rule.target_type, &metadata.target_type),
        ] {
            if simple(found) != simple(expected) {
                return Err(GenerationError::FactTypeMismatch {
                    rule: idx,
                    found: found.clone(),
                    expected: expected.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Fact binding derived from a type name: `RestaurantData` binds as `$restaurantData`
pub fn binding_for(type_name: &str) -> String {
    let short = type_name.rsplit('.').next().unwrap_or(type_name);
    let mut chars = short.chars();
    match chars.next() {
        Some(first) => format!("${}{}", first.to_lowercase(), chars.as_str()),
        None => "$fact".to_string(),
    }
}

/// Render a candidate document from a layout and its naming
///
/// Deterministic: identical inputs give byte-identical output. Unresolved
/// names keep their slot markers.
pub fn render_candidate(
    template: &SchemaTemplate,
    layout: &TableLayout,
    naming: &TableNaming,
    metadata: &TableMetadata,
) -> Result<String, TemplateError> {
    let table_name = metadata
        .table_name
        .as_deref()
        .and_then(slugify)
        .or_else(|| naming.table_name.clone());
    let condition_headers = headers(&naming.condition_headers, layout.condition_columns.len());
    let action_headers = headers(&naming.action_headers, layout.action_columns.len());

    let condition_columns = layout
        .condition_columns
        .iter()
        .zip(&condition_headers)
        .map(|(column, header)| {
            let mut values = SlotValues::new()
                .with(slots::FACT_FIELD, column.field.as_str())
                .with(slots::OPERATOR, column.operator.symbol())
                .with(slots::DATA_TYPE, column.data_type);
            values.set_opt(slots::HEADER, header.clone());
            template.render(FragmentKind::ConditionColumn, &values)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let action_columns = layout
        .action_columns
        .iter()
        .zip(&action_headers)
        .map(|(column, header)| {
            let mut values = SlotValues::new()
                .with(slots::TARGET_TYPE, metadata.target_type.as_str())
                .with(slots::TARGET_BINDING, binding_for(&metadata.target_type))
                .with(slots::FACT_FIELD, column.fact_field.as_str())
                .with(slots::DATA_TYPE, column.data_type);
            values.set_opt(slots::HEADER, header.clone());
            template.render(FragmentKind::ActionColumn, &values)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let rows = layout
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let mut cells = vec![render_cell(
                template,
                Some(ATTRIBUTE_HEADER),
                Value::from(row.priority),
                DataType::NumericInteger,
            )?];
            for ((value, column), header) in row
                .conditions
                .iter()
                .zip(&layout.condition_columns)
                .zip(&condition_headers)
            {
                cells.push(render_cell(template, header.as_deref(), value.clone(), column.data_type)?);
            }
            for ((value, column), header) in row
                .actions
                .iter()
                .zip(&layout.action_columns)
                .zip(&action_headers)
            {
                cells.push(render_cell(template, header.as_deref(), value.clone(), column.data_type)?);
            }

            let description = naming
                .row_descriptions
                .get(idx)
                .cloned()
                .flatten()
                .or_else(|| row.source_clause.clone());

            let mut values = SlotValues::new()
                .with(slots::ROW_NUMBER, (idx + 1) as i64)
                .with(slots::CELLS, SlotValue::Fragments(cells));
            values.set_opt(slots::DESCRIPTION, description);
            template.render(FragmentKind::Row, &values)
        })
        .collect::<Result<Vec<_>, TemplateError>>()?;

    let imports: Vec<Value> = metadata.imports.iter().map(|i| Value::from(i.as_str())).collect();
    let mut values = SlotValues::new()
        .with(slots::PACKAGE_NAME, metadata.package_name.as_str())
        .with(slots::IMPORTS, Value::Array(imports))
        .with(slots::DEFAULT_PRIORITY, i64::from(metadata.default_priority))
        .with(slots::INPUT_TYPE, metadata.input_type.as_str())
        .with(slots::INPUT_BINDING, binding_for(&metadata.input_type))
        .with(slots::CONDITION_COLUMNS, SlotValue::Fragments(condition_columns))
        .with(slots::ACTION_COLUMNS, SlotValue::Fragments(action_columns))
        .with(slots::ROWS, SlotValue::Fragments(rows));
    values.set_opt(slots::TABLE_NAME, table_name);

    template.render(FragmentKind::Frame, &values)
}

fn headers(names: &[Option<String>], len: usize) -> Vec<Option<String>> {
    (0..len).map(|i| names.get(i).cloned().flatten()).collect()
}

fn render_cell(
    template: &SchemaTemplate,
    column_name: Option<&str>,
    value: Value,
    data_type: DataType,
) -> Result<String, TemplateError> {
    let mut values = SlotValues::new()
        .with(slots::VALUE, value)
        .with(slots::DATA_TYPE, data_type);
    values.set_opt(slots::COLUMN_NAME, column_name);
    template.render(FragmentKind::Cell, &values)
}
