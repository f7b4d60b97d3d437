//! The schema template: fragments plus the slot catalog they are typed by

use crate::error::TemplateError;
use crate::fragment::Fragment;
use crate::slot::{FragmentKind, SlotType, SlotValues, TemplateSlot};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};

/// Version tag of the built-in decision-table template
pub const DECISION_TABLE_V1: &str = "decision-table/1";

/// Separator placed between rendered fragment instances
pub const FRAGMENT_SEPARATOR: &str = ", ";

/// Header of the salience attribute column (fixed in the frame)
pub const ATTRIBUTE_HEADER: &str = "Priority";

/// Pattern of a `{{slotName}}` marker
pub const MARKER_PATTERN: &str = r"\{\{([A-Za-z][A-Za-z0-9_]*)\}\}";

/// Slot names of the built-in template
pub mod slots {
    /// Template version (static)
    pub const SCHEMA_VERSION: &str = "schemaVersion";
    /// Table format (static)
    pub const TABLE_FORMAT: &str = "tableFormat";
    /// Hit policy (static)
    pub const HIT_POLICY: &str = "hitPolicy";
    /// Kebab-case table name
    pub const TABLE_NAME: &str = "tableName";
    /// Package name
    pub const PACKAGE_NAME: &str = "packageName";
    /// Imports array
    pub const IMPORTS: &str = "imports";
    /// Default salience
    pub const DEFAULT_PRIORITY: &str = "defaultPriority";
    /// Input fact type
    pub const INPUT_TYPE: &str = "inputType";
    /// Input fact binding
    pub const INPUT_BINDING: &str = "inputBinding";
    /// Target fact type
    pub const TARGET_TYPE: &str = "targetType";
    /// Target fact binding
    pub const TARGET_BINDING: &str = "targetBinding";
    /// Rendered condition columns
    pub const CONDITION_COLUMNS: &str = "conditionColumns";
    /// Rendered action columns
    pub const ACTION_COLUMNS: &str = "actionColumns";
    /// Rendered rows
    pub const ROWS: &str = "rows";
    /// Rendered cells of one row
    pub const CELLS: &str = "cells";
    /// Column header
    pub const HEADER: &str = "header";
    /// Fact field of a column
    pub const FACT_FIELD: &str = "factField";
    /// Operator symbol of a condition column
    pub const OPERATOR: &str = "operator";
    /// Data type of a column or cell
    pub const DATA_TYPE: &str = "dataType";
    /// Row number
    pub const ROW_NUMBER: &str = "rowNumber";
    /// Row description
    pub const DESCRIPTION: &str = "description";
    /// Column a cell belongs to
    pub const COLUMN_NAME: &str = "columnName";
    /// Cell value
    pub const VALUE: &str = "value";
}

/// A parameterized document skeleton
///
/// Immutable once loaded. Loading checks that every marker is declared,
/// that every dynamic slot occurs, and that an empty render of every
/// fragment is a JSON object.
#[derive(Debug, Clone)]
pub struct SchemaTemplate {
    version: String,
    fragments: BTreeMap<FragmentKind, Fragment>,
    slots: BTreeMap<String, TemplateSlot>,
    keys: BTreeMap<FragmentKind, Vec<String>>,
    marker: Regex,
}

impl SchemaTemplate {
    /// Load a template from fragment sources and a slot catalog
    pub fn load(
        version: impl Into<String>,
        sources: &[(FragmentKind, &str)],
        catalog: Vec<TemplateSlot>,
    ) -> Result<Self, TemplateError> {
        let marker = Regex::new(MARKER_PATTERN)?;
        let slots: BTreeMap<String, TemplateSlot> =
            catalog.into_iter().map(|s| (s.name.clone(), s)).collect();

        let mut fragments = BTreeMap::new();
        for (kind, source) in sources {
            fragments.insert(*kind, Fragment::parse(*kind, source, &marker, &slots)?);
        }

        for kind in FragmentKind::ALL {
            if !fragments.contains_key(&kind) {
                return Err(TemplateError::MissingFragment(kind.to_string()));
            }
        }

        let used: HashSet<&str> = fragments.values().flat_map(|f| f.slot_names()).collect();
        if let Some(unused) = slots
            .values()
            .find(|s| s.is_dynamic() && !used.contains(s.name.as_str()))
        {
            return Err(TemplateError::UnusedSlot(unused.name.clone()));
        }

        let mut keys = BTreeMap::new();
        for (kind, fragment) in &fragments {
            let spy = fragment.render(&SlotValues::new())?;
            let parsed: serde_json::Value =
                serde_json::from_str(&spy).map_err(|e| TemplateError::InvalidSkeleton {
                    fragment: kind.to_string(),
                    message: e.to_string(),
                })?;
            let object = parsed.as_object().ok_or_else(|| TemplateError::InvalidSkeleton {
                fragment: kind.to_string(),
                message: "fragment is not a JSON object".to_string(),
            })?;
            keys.insert(*kind, object.keys().cloned().collect());
        }

        Ok(Self {
            version: version.into(),
            fragments,
            slots,
            keys,
            marker,
        })
    }

    /// The built-in `decision-table/1` template
    pub fn decision_table_v1() -> Result<Self, TemplateError> {
        use slots::*;
        use SlotType::*;

        let catalog = vec![
            TemplateSlot::fixed(SCHEMA_VERSION, DECISION_TABLE_V1),
            TemplateSlot::fixed(TABLE_FORMAT, "EXTENDED_ENTRY"),
            TemplateSlot::fixed(HIT_POLICY, "NONE"),
            TemplateSlot::dynamic(TABLE_NAME, Text),
            TemplateSlot::dynamic(PACKAGE_NAME, Identifier),
            TemplateSlot::dynamic(IMPORTS, JsonValue),
            TemplateSlot::dynamic(DEFAULT_PRIORITY, Integer),
            TemplateSlot::dynamic(INPUT_TYPE, Identifier),
            TemplateSlot::dynamic(INPUT_BINDING, Identifier),
            TemplateSlot::dynamic(TARGET_TYPE, Identifier),
            TemplateSlot::dynamic(TARGET_BINDING, Identifier),
            TemplateSlot::dynamic(CONDITION_COLUMNS, Fragments(FragmentKind::ConditionColumn)),
            TemplateSlot::dynamic(ACTION_COLUMNS, Fragments(FragmentKind::ActionColumn)),
            TemplateSlot::dynamic(ROWS, Fragments(FragmentKind::Row)),
            TemplateSlot::dynamic(CELLS, Fragments(FragmentKind::Cell)),
            TemplateSlot::dynamic(HEADER, Text),
            TemplateSlot::dynamic(FACT_FIELD, Identifier),
            TemplateSlot::dynamic(OPERATOR, Text),
            TemplateSlot::dynamic(DATA_TYPE, DataType),
            TemplateSlot::dynamic(ROW_NUMBER, Integer),
            TemplateSlot::dynamic(DESCRIPTION, Text),
            TemplateSlot::dynamic(COLUMN_NAME, Text),
            TemplateSlot::dynamic(VALUE, JsonValue),
        ];

        let sources = [
            (FragmentKind::Frame, include_str!("skeleton/frame.tmpl").trim_end()),
            (
                FragmentKind::ConditionColumn,
                include_str!("skeleton/condition_column.tmpl").trim_end(),
            ),
            (
                FragmentKind::ActionColumn,
                include_str!("skeleton/action_column.tmpl").trim_end(),
            ),
            (FragmentKind::Row, include_str!("skeleton/row.tmpl").trim_end()),
            (FragmentKind::Cell, include_str!("skeleton/cell.tmpl").trim_end()),
        ];

        Self::load(DECISION_TABLE_V1, &sources, catalog)
    }

    /// Template version tag
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Look up a slot by name
    pub fn slot(&self, name: &str) -> Option<&TemplateSlot> {
        self.slots.get(name)
    }

    /// All declared slots
    pub fn slots(&self) -> impl Iterator<Item = &TemplateSlot> {
        self.slots.values()
    }

    /// A parsed fragment
    pub fn fragment(&self, kind: FragmentKind) -> Option<&Fragment> {
        self.fragments.get(&kind)
    }

    /// Render one instance of a fragment
    pub fn render(&self, kind: FragmentKind, values: &SlotValues) -> Result<String, TemplateError> {
        self.fragments
            .get(&kind)
            .ok_or_else(|| TemplateError::MissingFragment(kind.to_string()))?
            .render(values)
    }

    /// Static scaffolding of a fragment, in order
    pub fn static_fragments(&self, kind: FragmentKind) -> Vec<&str> {
        self.fragments
            .get(&kind)
            .map(|f| f.static_pieces().collect())
            .unwrap_or_default()
    }

    /// Object keys every instance of a fragment carries
    pub fn keys(&self, kind: FragmentKind) -> &[String] {
        self.keys.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Names of the slot markers left in `text`
    pub fn find_markers<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.marker
            .captures_iter(text)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DataType, DecisionTable};
    use serde_json::json;

    fn render_sample(template: &SchemaTemplate) -> String {
        let cell = |column: &str, value: serde_json::Value, data_type: DataType| {
            template
                .render(
                    FragmentKind::Cell,
                    &SlotValues::new()
                        .with(slots::COLUMN_NAME, column)
                        .with(slots::VALUE, value)
                        .with(slots::DATA_TYPE, data_type),
                )
                .unwrap()
        };
        let row = template
            .render(
                FragmentKind::Row,
                &SlotValues::new()
                    .with(slots::ROW_NUMBER, 1i64)
                    .with(slots::DESCRIPTION, "Large restaurants")
                    .with(
                        slots::CELLS,
                        SlotValue::Fragments(vec![
                            cell(ATTRIBUTE_HEADER, json!(10), DataType::NumericInteger),
                            cell("Size", json!("large"), DataType::String),
                            cell("Employees", json!(10), DataType::NumericInteger),
                        ]),
                    ),
            )
            .unwrap();
        let condition = template
            .render(
                FragmentKind::ConditionColumn,
                &SlotValues::new()
                    .with(slots::HEADER, "Size")
                    .with(slots::FACT_FIELD, "size")
                    .with(slots::OPERATOR, "==")
                    .with(slots::DATA_TYPE, DataType::String),
            )
            .unwrap();
        let action = template
            .render(
                FragmentKind::ActionColumn,
                &SlotValues::new()
                    .with(slots::HEADER, "Employees")
                    .with(slots::TARGET_TYPE, "EmployeeRecommendation")
                    .with(slots::TARGET_BINDING, "recommendation")
                    .with(slots::FACT_FIELD, "employeeCount")
                    .with(slots::DATA_TYPE, DataType::NumericInteger),
            )
            .unwrap();

        template
            .render(
                FragmentKind::Frame,
                &SlotValues::new()
                    .with(slots::TABLE_NAME, "restaurant-staffing")
                    .with(slots::PACKAGE_NAME, "com.myspace.rules")
                    .with(slots::IMPORTS, json!(["com.myspace.restopsrecomms.RestaurantData"]))
                    .with(slots::DEFAULT_PRIORITY, 10i64)
                    .with(slots::INPUT_TYPE, "RestaurantData")
                    .with(slots::INPUT_BINDING, "restaurant")
                    .with(slots::CONDITION_COLUMNS, SlotValue::Fragments(vec![condition]))
                    .with(slots::ACTION_COLUMNS, SlotValue::Fragments(vec![action]))
                    .with(slots::ROWS, SlotValue::Fragments(vec![row])),
            )
            .unwrap()
    }

    use crate::slot::SlotValue;

    #[test]
    fn test_builtin_template_loads() {
        let template = SchemaTemplate::decision_table_v1().unwrap();
        assert_eq!(template.version(), "decision-table/1");
        assert!(template.slot(slots::TABLE_NAME).unwrap().is_dynamic());
        assert!(!template.slot(slots::HIT_POLICY).unwrap().is_dynamic());
        assert!(template.keys(FragmentKind::Frame).contains(&"tableName".to_string()));
        assert!(template.keys(FragmentKind::Frame).contains(&"data".to_string()));
        assert!(template.keys(FragmentKind::Cell).contains(&"columnName".to_string()));
    }

    #[test]
    fn test_static_slots_resolved_into_scaffolding() {
        let template = SchemaTemplate::decision_table_v1().unwrap();
        let frame = template.static_fragments(FragmentKind::Frame).concat();
        assert!(frame.contains("\"schemaVersion\": \"decision-table/1\""));
        assert!(frame.contains("\"tableFormat\": \"EXTENDED_ENTRY\""));
        assert!(frame.contains("\"hitPolicy\": \"NONE\""));
        assert!(template.find_markers(&frame).is_empty());
    }

    #[test]
    fn test_full_render_parses_as_decision_table() {
        let template = SchemaTemplate::decision_table_v1().unwrap();
        let text = render_sample(&template);
        assert!(template.find_markers(&text).is_empty());

        let table: DecisionTable = serde_json::from_str(&text).unwrap();
        assert_eq!(table.table_name, "restaurant-staffing");
        assert_eq!(table.hit_policy, "NONE");
        assert_eq!(table.attribute_columns[0].header, ATTRIBUTE_HEADER);
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.data[0].values[1].value, json!("large"));
        assert_eq!(table.action_columns[0].fact_field, "employeeCount");
    }

    #[test]
    fn test_unfilled_frame_keeps_markers() {
        let template = SchemaTemplate::decision_table_v1().unwrap();
        let text = template.render(FragmentKind::Frame, &SlotValues::new()).unwrap();
        let markers = template.find_markers(&text);
        assert!(markers.contains(&"tableName"));
        assert!(markers.contains(&"rows"));
        assert!(serde_json::from_str::<serde_json::Value>(&text).is_ok());
    }

    #[test]
    fn test_load_rejects_unused_dynamic_slot() {
        let sources = [
            (FragmentKind::Frame, "{}"),
            (FragmentKind::ConditionColumn, "{}"),
            (FragmentKind::ActionColumn, "{}"),
            (FragmentKind::Row, "{}"),
            (FragmentKind::Cell, "{}"),
        ];
        let result = SchemaTemplate::load(
            "test/1",
            &sources,
            vec![TemplateSlot::dynamic("orphan", SlotType::Text)],
        );
        assert!(matches!(result, Err(TemplateError::UnusedSlot(ref s)) if s == "orphan"));
    }

    #[test]
    fn test_load_rejects_missing_fragment() {
        let result = SchemaTemplate::load("test/1", &[(FragmentKind::Frame, "{}")], vec![]);
        assert!(matches!(result, Err(TemplateError::MissingFragment(_))));
    }

    #[test]
    fn test_load_rejects_non_object_skeleton() {
        let sources = [
            (FragmentKind::Frame, "[1, 2"),
            (FragmentKind::ConditionColumn, "{}"),
            (FragmentKind::ActionColumn, "{}"),
            (FragmentKind::Row, "{}"),
            (FragmentKind::Cell, "{}"),
        ];
        let result = SchemaTemplate::load("test/1", &sources, vec![]);
        assert!(matches!(result, Err(TemplateError::InvalidSkeleton { .. })));
    }

    #[test]
    fn test_escaping_cannot_break_structure() {
        let template = SchemaTemplate::decision_table_v1().unwrap();
        let text = template
            .render(
                FragmentKind::Row,
                &SlotValues::new()
                    .with(slots::ROW_NUMBER, 1i64)
                    .with(slots::DESCRIPTION, "\", \"rowNumber\": 99, \"x\": \"")
                    .with(slots::CELLS, SlotValue::Fragments(vec![])),
            )
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["rowNumber"], 1);
        assert!(parsed.get("x").is_none());
    }
}
