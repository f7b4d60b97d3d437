//! Core Rule Extractor implementation

use crate::clauses::split_clauses;
use crate::config::{ClauseMode, ExtractorConfig};
use crate::error::ExtractionError;
use crate::parser::{parse_rules, ParseDefaults};
use crate::prompt::{ExtractionPromptBuilder, RULES_SCHEMA};
use crate::types::ExtractionRequest;
use rulewright_domain::traits::LlmProvider;
use rulewright_domain::StructuredRule;
use rulewright_llm::LlmError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

/// Turns rule text into structured rules through an LLM
///
/// The extractor builds the constrained prompt, parses and coerces the
/// response, and rejects anything that breaks the structured-rule
/// invariants. It never retries; timeouts are reported as such so the
/// caller can decide.
pub struct RuleExtractor<L>
where
    L: LlmProvider,
{
    llm_provider: Arc<L>,
    config: ExtractorConfig,
}

impl<L> RuleExtractor<L>
where
    L: LlmProvider<Error = LlmError> + Send + Sync + 'static,
{
    /// Create a new extractor owning its provider
    pub fn new(llm_provider: L, config: ExtractorConfig) -> Self {
        Self::with_shared(Arc::new(llm_provider), config)
    }

    /// Create a new extractor sharing a provider with other stages
    pub fn with_shared(llm_provider: Arc<L>, config: ExtractorConfig) -> Self {
        Self {
            llm_provider,
            config,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract structured rules from rule text
    ///
    /// Rules come back in text order with baseline rules moved last and
    /// their priority clamped to at most every other rule's priority.
    pub async fn extract(
        &self,
        request: ExtractionRequest,
    ) -> Result<Vec<StructuredRule>, ExtractionError> {
        let text = request.rule_text.trim();
        if text.is_empty() {
            return Err(ExtractionError::EmptyInput);
        }
        let length = text.chars().count();
        if length > self.config.max_text_length {
            return Err(ExtractionError::TextTooLong(length, self.config.max_text_length));
        }

        let budget = request
            .timeout
            .map(|t| t.min(self.config.extraction_timeout()))
            .unwrap_or_else(|| self.config.extraction_timeout());
        let default_priority = request
            .default_priority
            .unwrap_or(self.config.default_priority);

        info!(
            "Extracting rules ({:?} mode, {} chars)",
            self.config.clause_mode, length
        );

        let rules = match self.config.clause_mode {
            ClauseMode::WholeText => {
                let prompt =
                    ExtractionPromptBuilder::new(text, &request.input_type, &request.target_type)
                        .with_fact_model(request.fact_model.as_ref())
                        .build();
                let response = self.call_llm(&prompt, budget).await?;
                let defaults = ParseDefaults {
                    input_type: &request.input_type,
                    target_type: &request.target_type,
                    default_priority,
                    source_clause: None,
                    fact_model: request.fact_model.as_ref(),
                };
                parse_rules(&response, &defaults)?
            }
            ClauseMode::PerClause => {
                let clauses = split_clauses(text);
                if clauses.is_empty() {
                    return Err(ExtractionError::EmptyInput);
                }
                debug!("Split rule text into {} clauses", clauses.len());

                let mut rules = Vec::with_capacity(clauses.len());
                for (idx, clause) in clauses.iter().enumerate() {
                    let prompt = ExtractionPromptBuilder::new(
                        clause.as_str(),
                        &request.input_type,
                        &request.target_type,
                    )
                    .single_rule()
                    .with_fact_model(request.fact_model.as_ref())
                    .build();
                    let response = self.call_llm(&prompt, budget).await?;
                    let defaults = ParseDefaults {
                        input_type: &request.input_type,
                        target_type: &request.target_type,
                        default_priority,
                        source_clause: Some(clause),
                        fact_model: request.fact_model.as_ref(),
                    };
                    let mut parsed = parse_rules(&response, &defaults)?;
                    if parsed.len() != 1 {
                        return Err(ExtractionError::InvalidFormat(format!(
                            "clause {} produced {} rules, expected 1",
                            idx,
                            parsed.len()
                        )));
                    }
                    rules.append(&mut parsed);
                }
                rules
            }
        };

        let rules = order_rules(rules, self.config.baseline_priority);
        info!("Extracted {} rules", rules.len());
        Ok(rules)
    }

    /// Call the LLM provider within `budget`
    async fn call_llm(&self, prompt: &str, budget: Duration) -> Result<String, ExtractionError> {
        let llm = Arc::clone(&self.llm_provider);
        let prompt = prompt.to_string();

        debug!("Prompt length: {} chars", prompt.len());

        let joined = timeout(
            budget,
            tokio::task::spawn_blocking(move || llm.generate_structured(&prompt, RULES_SCHEMA)),
        )
        .await
        .map_err(|_| ExtractionError::Timeout(budget.as_millis() as u64))?;

        let response = joined
            .map_err(|e| ExtractionError::Llm(format!("Task join error: {}", e)))?
            .map_err(|e| match e {
                LlmError::Timeout(_) => ExtractionError::Timeout(budget.as_millis() as u64),
                other => ExtractionError::Llm(other.to_string()),
            })?;

        debug!("LLM response length: {} chars", response.len());
        Ok(response)
    }
}

/// Move baseline rules last and clamp their priority below the others
///
/// Conditional rules keep their relative order. Every baseline rule ends
/// with a priority no higher than `baseline_priority` and no higher than
/// the lowest conditional priority, so it can only fire as a fallback.
/// Applying it again to a merged batch restores the guarantee across texts.
pub fn order_rules(rules: Vec<StructuredRule>, baseline_priority: i32) -> Vec<StructuredRule> {
    let floor = rules
        .iter()
        .filter(|r| !r.baseline)
        .map(|r| r.priority)
        .min()
        .unwrap_or(baseline_priority);

    let (mut ordered, baselines): (Vec<_>, Vec<_>) = rules.into_iter().partition(|r| !r.baseline);
    ordered.extend(baselines.into_iter().map(|mut rule| {
        rule.priority = baseline_priority.min(floor);
        rule
    }));
    ordered
}
