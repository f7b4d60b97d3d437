//! Integration tests for the Slot Filler

#[cfg(test)]
mod tests {
    use crate::{FillRequest, GenerationError, GeneratorConfig, SlotFiller, NAMING_PROMPT_MARKER};
    use rulewright_domain::{Action, Condition, Exemplar, Literal, Operator, StructuredRule, TableMetadata};
    use rulewright_llm::MockProvider;
    use rulewright_template::{DecisionTable, SchemaTemplate};
    use std::time::Duration;

    const NAMING: &str = r#"{"tableName": "Restaurant Staffing", "conditionHeaders": ["Size"],
        "actionHeaders": ["Employees"], "rowDescriptions": ["Small", "Medium", "Large"]}"#;

    fn size_rule(size: &str, count: i64) -> StructuredRule {
        StructuredRule {
            conditions: vec![Condition::new("size", Operator::Eq, Literal::Text(size.into()))],
            actions: vec![Action::new("setEmployeeCount", Literal::Integer(count))],
            priority: 10,
            baseline: false,
            input_type: "RestaurantData".into(),
            target_type: "EmployeeRecommendation".into(),
            source_clause: None,
        }
    }

    fn rules() -> Vec<StructuredRule> {
        vec![size_rule("small", 5), size_rule("medium", 7), size_rule("large", 10)]
    }

    fn request<'a>(
        rules: &'a [StructuredRule],
        exemplars: &'a [Exemplar],
        template: &'a SchemaTemplate,
        metadata: &'a TableMetadata,
        feedback: &'a [String],
    ) -> FillRequest<'a> {
        FillRequest {
            rules,
            exemplars,
            template,
            metadata,
            feedback,
            timeout: None,
        }
    }

    #[tokio::test]
    async fn test_fill_three_rows() {
        let filler = SlotFiller::new(MockProvider::new(NAMING), GeneratorConfig::default());
        let template = SchemaTemplate::decision_table_v1().unwrap();
        let metadata = TableMetadata::default();
        let rules = rules();

        let text = filler
            .fill(request(&rules, &[], &template, &metadata, &[]))
            .await
            .unwrap();

        let table: DecisionTable = serde_json::from_str(&text).unwrap();
        assert_eq!(table.table_name, "restaurant-staffing");
        assert_eq!(
            table.data.iter().map(|r| r.row_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        let counts: Vec<_> = table.data.iter().map(|r| r.values[2].value.clone()).collect();
        assert_eq!(counts, vec![serde_json::json!(5), serde_json::json!(7), serde_json::json!(10)]);
    }

    #[tokio::test]
    async fn test_exemplars_capped_and_feedback_included() {
        let llm = MockProvider::new(NAMING);
        let spy = llm.clone();
        let filler = SlotFiller::new(llm, GeneratorConfig::aggressive());
        let template = SchemaTemplate::decision_table_v1().unwrap();
        let metadata = TableMetadata::default();
        let rules = rules();
        let exemplars = vec![
            Exemplar::new("first exemplar rule", "{}"),
            Exemplar::new("second exemplar rule", "{}"),
        ];
        let feedback = vec!["header missing at row 1".to_string()];

        filler
            .fill(request(&rules, &exemplars, &template, &metadata, &feedback))
            .await
            .unwrap();

        let prompt = &spy.prompts()[0];
        assert!(prompt.starts_with(NAMING_PROMPT_MARKER));
        assert!(prompt.contains("first exemplar rule"));
        assert!(!prompt.contains("second exemplar rule"));
        assert!(prompt.contains("header missing at row 1"));
    }

    #[tokio::test]
    async fn test_exemplars_never_override_values() {
        let filler = SlotFiller::new(MockProvider::new(NAMING), GeneratorConfig::default());
        let template = SchemaTemplate::decision_table_v1().unwrap();
        let metadata = TableMetadata::default();
        let rules = rules();
        let exemplars = vec![Exemplar::new(
            "if size is large then assign 99 employees",
            "{\"data\": [{\"values\": [99]}]}",
        )];

        let text = filler
            .fill(request(&rules, &exemplars, &template, &metadata, &[]))
            .await
            .unwrap();
        assert!(!text.contains("99"));
    }

    #[tokio::test]
    async fn test_llm_error_gives_unresolved_candidate() {
        let llm = MockProvider::new(NAMING);
        llm.add_error_containing(NAMING_PROMPT_MARKER);
        let filler = SlotFiller::new(llm, GeneratorConfig::default());
        let template = SchemaTemplate::decision_table_v1().unwrap();
        let metadata = TableMetadata::default();
        let rules = rules();

        let text = filler
            .fill(request(&rules, &[], &template, &metadata, &[]))
            .await
            .unwrap();
        assert!(template.find_markers(&text).contains(&"tableName"));
    }

    #[tokio::test]
    async fn test_garbage_response_gives_unresolved_candidate() {
        let filler = SlotFiller::new(MockProvider::new("I'd call it Bob."), GeneratorConfig::default());
        let template = SchemaTemplate::decision_table_v1().unwrap();
        let metadata = TableMetadata::default();
        let rules = rules();

        let text = filler
            .fill(request(&rules, &[], &template, &metadata, &[]))
            .await
            .unwrap();
        assert!(template.find_markers(&text).contains(&"header"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let llm = MockProvider::new(NAMING).with_latency(Duration::from_millis(300));
        let filler = SlotFiller::new(llm, GeneratorConfig::default());
        let template = SchemaTemplate::decision_table_v1().unwrap();
        let metadata = TableMetadata::default();
        let rules = rules();
        let mut req = request(&rules, &[], &template, &metadata, &[]);
        req.timeout = Some(Duration::from_millis(20));

        let result = filler.fill(req).await;
        assert!(matches!(result, Err(GenerationError::Timeout(20))));
    }

    #[tokio::test]
    async fn test_no_rules() {
        let filler = SlotFiller::new(MockProvider::new(NAMING), GeneratorConfig::default());
        let template = SchemaTemplate::decision_table_v1().unwrap();
        let metadata = TableMetadata::default();

        let result = filler.fill(request(&[], &[], &template, &metadata, &[])).await;
        assert!(matches!(result, Err(GenerationError::NoRules)));
    }

    #[tokio::test]
    async fn test_rule_with_foreign_fact_type_rejected() {
        let llm = MockProvider::new(NAMING);
        let spy = llm.clone();
        let filler = SlotFiller::new(llm, GeneratorConfig::default());
        let template = SchemaTemplate::decision_table_v1().unwrap();
        let metadata = TableMetadata::default();
        let mut rules = rules();
        rules[1].target_type = "ShiftPlan".into();

        let result = filler.fill(request(&rules, &[], &template, &metadata, &[])).await;
        assert!(matches!(
            result,
            Err(GenerationError::FactTypeMismatch { rule: 1, ref found, .. }) if found == "ShiftPlan"
        ));
        assert_eq!(spy.call_count(), 0);

        // A qualified name of the table's own type is the same type
        let mut rules = self::rules();
        rules[0].input_type = "com.myspace.restopsrecomms.RestaurantData".into();
        assert!(filler.fill(request(&rules, &[], &template, &metadata, &[])).await.is_ok());
    }
}
