//! Export to Drools guided decision table XML (`decision-table52`)

use crate::document::{DataType, DecisionTable};

const AUDIT_FILTER_CLASS: &str =
    "org.drools.guvnor.client.modeldriven.dt52.auditlog.DecisionTableAuditLogFilter";
const IMPORT_ELEMENT: &str = "org.kie.soup.project.datamodel.imports.Import";
const AUDIT_EVENT_TYPES: [&str; 5] = [
    "INSERT_ROW",
    "INSERT_COLUMN",
    "DELETE_ROW",
    "DELETE_COLUMN",
    "UPDATE_COLUMN",
];

/// Minimal indenting XML writer
struct XmlWriter {
    out: String,
    depth: usize,
}

impl XmlWriter {
    fn new() -> Self {
        Self {
            out: String::new(),
            depth: 0,
        }
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }

    fn open(&mut self, tag: &str) {
        self.open_with(tag, &[]);
    }

    fn open_with(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
        self.push_attrs(attrs);
        self.out.push_str(">\n");
        self.depth += 1;
    }

    fn close(&mut self, tag: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        self.out.push_str(&format!("</{}>\n", tag));
    }

    fn leaf(&mut self, tag: &str, text: &str) {
        self.leaf_with(tag, &[], text);
    }

    fn leaf_with(&mut self, tag: &str, attrs: &[(&str, &str)], text: &str) {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
        self.push_attrs(attrs);
        if text.is_empty() {
            self.out.push_str("/>\n");
        } else {
            self.out.push('>');
            self.out.push_str(&escape_xml(text));
            self.out.push_str(&format!("</{}>\n", tag));
        }
    }

    fn push_attrs(&mut self, attrs: &[(&str, &str)]) {
        for (name, value) in attrs {
            self.out.push_str(&format!(" {}=\"{}\"", name, escape_xml(value)));
        }
    }

    fn column_display(&mut self, hidden: bool, width: u32) {
        self.leaf("hideColumn", bool_text(hidden));
        self.leaf("width", &width.to_string());
    }

    fn finish(self) -> String {
        self.out
    }
}

fn bool_text(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Escape text for XML element content and attribute values
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Java type name of a column's data type
fn field_type(data_type: DataType) -> &'static str {
    match data_type {
        DataType::NumericInteger => "Integer",
        DataType::NumericDouble => "Double",
        DataType::Boolean => "Boolean",
        DataType::String => "String",
    }
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a decision table as `decision-table52` XML
pub fn to_gdst_xml(table: &DecisionTable) -> String {
    let mut w = XmlWriter::new();
    w.open("decision-table52");
    w.leaf("tableName", &table.table_name);

    w.open("rowNumberCol");
    w.column_display(false, 50);
    w.close("rowNumberCol");
    w.open("descriptionCol");
    w.column_display(false, 150);
    w.close("descriptionCol");
    w.open("ruleNameColumn");
    w.column_display(true, 150);
    w.close("ruleNameColumn");
    w.leaf("metadataCols", "");

    w.open("attributeCols");
    for attribute in &table.attribute_columns {
        w.open("attribute-column52");
        w.open("typedDefaultValue");
        w.leaf_with(
            "valueNumeric",
            &[("class", "int")],
            &attribute.default_value.to_string(),
        );
        w.leaf("valueString", "");
        w.leaf("dataType", attribute.data_type.as_str());
        w.leaf("isOtherwise", "false");
        w.close("typedDefaultValue");
        w.column_display(false, 130);
        w.leaf("attribute", &attribute.attribute);
        w.leaf("reverseOrder", "false");
        w.leaf("useRowNumber", "false");
        w.close("attribute-column52");
    }
    w.close("attributeCols");

    w.open("conditionPatterns");
    for pattern in &table.condition_patterns {
        w.open("Pattern52");
        w.leaf("factType", &pattern.fact_type);
        w.leaf("boundName", &pattern.bound_name);
        w.leaf("isNegated", "false");
        w.open("conditions");
        for column in &pattern.conditions {
            w.open("condition-column52");
            w.open("typedDefaultValue");
            w.leaf("valueString", "");
            w.leaf("dataType", column.data_type.as_str());
            w.leaf("isOtherwise", "false");
            w.close("typedDefaultValue");
            w.column_display(column.hidden, column.width);
            w.leaf("header", &column.header);
            w.leaf("constraintValueType", "1");
            w.leaf("factField", &column.fact_field);
            w.leaf("fieldType", field_type(column.data_type));
            w.leaf("operator", &column.operator);
            w.leaf("parameters", "");
            w.leaf("binding", "");
            w.close("condition-column52");
        }
        w.close("conditions");
        w.open("window");
        w.leaf("parameters", "");
        w.close("window");
        w.leaf("entryPointName", "");
        w.close("Pattern52");
    }
    w.close("conditionPatterns");

    w.open("actionCols");
    for action in &table.action_columns {
        w.open("ActionInsertFact");
        w.leaf("factType", &action.fact_type);
        w.leaf("boundName", &action.bound_name);
        w.leaf("factField", &action.fact_field);
        w.leaf("type", field_type(action.data_type));
        w.leaf("valueList", "");
        w.leaf("isInsertLogical", "false");
        w.leaf("header", &action.header);
        w.leaf("hideColumn", bool_text(action.hidden));
        w.leaf("defaultValue", "");
        w.leaf("width", "100");
        w.close("ActionInsertFact");
    }
    w.close("actionCols");

    w.open("auditLog");
    w.open_with("filter", &[("class", AUDIT_FILTER_CLASS)]);
    w.open("acceptedTypes");
    for event in AUDIT_EVENT_TYPES {
        w.open("entry");
        w.leaf("string", event);
        w.leaf("boolean", "false");
        w.close("entry");
    }
    w.close("acceptedTypes");
    w.close("filter");
    w.leaf("entries", "");
    w.close("auditLog");

    w.open("imports");
    w.open("imports");
    for import in &table.imports {
        w.open(IMPORT_ELEMENT);
        w.leaf("type", import);
        w.close(IMPORT_ELEMENT);
    }
    w.close("imports");
    w.close("imports");

    w.leaf("packageName", &table.package_name);
    w.leaf("version", &table.version.to_string());
    w.leaf("tableFormat", &table.table_format);
    w.leaf("hitPolicy", &table.hit_policy);

    w.open("data");
    for row in &table.data {
        w.open("list");

        w.open("value");
        w.leaf_with("valueNumeric", &[("class", "int")], &row.row_number.to_string());
        w.leaf("valueString", "");
        w.leaf("dataType", DataType::NumericInteger.as_str());
        w.leaf("isOtherwise", "false");
        w.close("value");

        w.open("value");
        w.leaf("valueString", &row.description);
        w.leaf("dataType", DataType::String.as_str());
        w.leaf("isOtherwise", "false");
        w.close("value");

        for cell in &row.values {
            w.open("value");
            let text = cell_text(&cell.value);
            match cell.data_type {
                DataType::NumericInteger | DataType::NumericDouble => {
                    if !cell.value.is_null() {
                        let class = if cell.data_type == DataType::NumericInteger {
                            "int"
                        } else {
                            "double"
                        };
                        w.leaf_with("valueNumeric", &[("class", class)], &text);
                    }
                    w.leaf("valueString", "");
                }
                DataType::Boolean => {
                    let flag = if text.is_empty() { "false" } else { text.as_str() };
                    w.leaf("valueBoolean", flag);
                    w.leaf("valueString", "");
                }
                DataType::String => w.leaf("valueString", &text),
            }
            w.leaf("dataType", cell.data_type.as_str());
            w.leaf("isOtherwise", "false");
            w.close("value");
        }

        w.close("list");
    }
    w.close("data");

    w.close("decision-table52");
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ActionColumn, AttributeColumn, Cell, ConditionColumn, ConditionPattern, Row};
    use serde_json::json;

    fn sample() -> DecisionTable {
        DecisionTable {
            schema_version: "decision-table/1".into(),
            table_name: "restaurant-staffing".into(),
            package_name: "com.myspace.rules".into(),
            imports: vec!["com.myspace.restopsrecomms.RestaurantData".into()],
            version: 1,
            table_format: "EXTENDED_ENTRY".into(),
            hit_policy: "NONE".into(),
            attribute_columns: vec![AttributeColumn {
                attribute: "salience".into(),
                header: "Priority".into(),
                data_type: DataType::NumericInteger,
                default_value: 10,
            }],
            condition_patterns: vec![ConditionPattern {
                kind: "Pattern".into(),
                fact_type: "RestaurantData".into(),
                bound_name: "restaurant".into(),
                conditions: vec![ConditionColumn {
                    header: "Size & Kind".into(),
                    fact_field: "size".into(),
                    operator: "==".into(),
                    data_type: DataType::String,
                    hidden: false,
                    width: 150,
                }],
            }],
            action_columns: vec![ActionColumn {
                kind: "ActionInsertFact".into(),
                header: "Employees".into(),
                fact_type: "EmployeeRecommendation".into(),
                bound_name: "recommendation".into(),
                fact_field: "employeeCount".into(),
                data_type: DataType::NumericInteger,
                hidden: false,
            }],
            data: vec![Row {
                row_number: 1,
                description: "Large <restaurants>".into(),
                values: vec![
                    Cell {
                        column_name: "Priority".into(),
                        value: json!(10),
                        data_type: DataType::NumericInteger,
                    },
                    Cell {
                        column_name: "Size & Kind".into(),
                        value: json!("large"),
                        data_type: DataType::String,
                    },
                    Cell {
                        column_name: "Employees".into(),
                        value: json!(10),
                        data_type: DataType::NumericInteger,
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_xml("\"q\""), "&quot;q&quot;");
    }

    #[test]
    fn test_gdst_element_order() {
        let xml = to_gdst_xml(&sample());
        let order = [
            "<decision-table52>",
            "<tableName>restaurant-staffing</tableName>",
            "<rowNumberCol>",
            "<attributeCols>",
            "<conditionPatterns>",
            "<actionCols>",
            "<auditLog>",
            "<imports>",
            "<packageName>com.myspace.rules</packageName>",
            "<hitPolicy>NONE</hitPolicy>",
            "<data>",
            "</decision-table52>",
        ];
        let mut cursor = 0;
        for tag in order {
            let found = xml[cursor..].find(tag).unwrap_or_else(|| panic!("missing {}", tag));
            cursor += found + tag.len();
        }
    }

    #[test]
    fn test_gdst_content() {
        let xml = to_gdst_xml(&sample());
        assert!(xml.contains("<header>Size &amp; Kind</header>"));
        assert!(xml.contains("<fieldType>String</fieldType>"));
        assert!(xml.contains("<type>Integer</type>"));
        assert!(xml.contains("<valueString>Large &lt;restaurants&gt;</valueString>"));
        assert!(xml.contains("<valueString>large</valueString>"));
        assert!(xml.contains("<valueNumeric class=\"int\">10</valueNumeric>"));
        assert!(xml.contains(AUDIT_FILTER_CLASS));
        assert_eq!(xml.matches("<entry>").count(), 5);
    }
}
