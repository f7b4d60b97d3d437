//! The Compiler: drives one request through extraction, retrieval,
//! generation and validation

use crate::config::{ClausePolicy, CompilerConfig};
use crate::error::CompileError;
use crate::state::{CompileState, StateTrace};
use crate::types::{CompilationMetadata, CompilationResult, CompileRequest};
use rulewright_domain::traits::{ExampleIndex, LlmProvider};
use rulewright_domain::{Exemplar, StructuredRule, TableMetadata};
use rulewright_extractor::{order_rules, ExtractionError, ExtractionRequest, RuleExtractor};
use rulewright_gatekeeper::Gatekeeper;
use rulewright_generator::{FillRequest, GenerationError, SlotFiller};
use rulewright_llm::LlmError;
use rulewright_template::{CompiledDocument, SchemaTemplate};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Compiles natural-language rules into validated decision-table documents
///
/// Requests are independent; a `Compiler` can be shared behind an `Arc`
/// and used from many tasks at once. The example index is the only state
/// shared between requests.
pub struct Compiler<L, I>
where
    L: LlmProvider,
    I: ExampleIndex,
{
    extractor: RuleExtractor<L>,
    filler: SlotFiller<L>,
    gatekeeper: Gatekeeper,
    index: Arc<I>,
    template: SchemaTemplate,
    config: CompilerConfig,
}

/// One table to generate: its rules, the text to retrieve and record by,
/// and its metadata
struct TablePlan {
    rules: Vec<StructuredRule>,
    text: String,
    metadata: TableMetadata,
}

/// Bookkeeping of one request
struct Run {
    started: Instant,
    deadline: Option<Instant>,
    trace: StateTrace,
    rules: usize,
    extraction_attempts: u32,
    generation_attempts: u32,
    timeouts: u32,
    exemplars_used: usize,
    retrieval_degraded: bool,
    exemplars_recorded: usize,
}

impl Run {
    fn new(deadline: Option<Instant>) -> Self {
        Self {
            started: Instant::now(),
            deadline,
            trace: StateTrace::new(),
            rules: 0,
            extraction_attempts: 0,
            generation_attempts: 0,
            timeouts: 0,
            exemplars_used: 0,
            retrieval_degraded: false,
            exemplars_recorded: 0,
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

impl<L, I> Compiler<L, I>
where
    L: LlmProvider<Error = LlmError> + Send + Sync + 'static,
    I: ExampleIndex + Send + Sync + 'static,
    I::Error: fmt::Display,
{
    /// Create a compiler owning its provider and index
    pub fn new(llm_provider: L, index: I, config: CompilerConfig) -> Result<Self, CompileError> {
        Self::with_shared(Arc::new(llm_provider), Arc::new(index), config)
    }

    /// Create a compiler over a shared provider and index, using the
    /// built-in `decision-table/1` template
    pub fn with_shared(
        llm_provider: Arc<L>,
        index: Arc<I>,
        config: CompilerConfig,
    ) -> Result<Self, CompileError> {
        let template = SchemaTemplate::decision_table_v1()
            .map_err(|e| CompileError::Configuration(format!("template: {}", e)))?;
        Self::with_template(llm_provider, index, template, config)
    }

    /// Create a compiler for a specific template
    pub fn with_template(
        llm_provider: Arc<L>,
        index: Arc<I>,
        template: SchemaTemplate,
        config: CompilerConfig,
    ) -> Result<Self, CompileError> {
        config.validate().map_err(CompileError::Configuration)?;

        Ok(Self {
            extractor: RuleExtractor::with_shared(Arc::clone(&llm_provider), config.extractor.clone()),
            filler: SlotFiller::with_shared(llm_provider, config.generator.clone()),
            gatekeeper: Gatekeeper::new(config.validation.clone()),
            index,
            template,
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Get the template documents are instances of
    pub fn template(&self) -> &SchemaTemplate {
        &self.template
    }

    /// Get the example index
    pub fn index(&self) -> &Arc<I> {
        &self.index
    }

    /// Compile a request
    ///
    /// Atomic: either every document of the request validates or the
    /// request fails. The example index is only written after success.
    pub async fn compile(&self, request: CompileRequest) -> Result<CompilationResult, CompileError> {
        let mut run = Run::new(request.deadline);
        info!(texts = request.rule_texts.len(), "Compiling rule text");

        match self.run(&request, &mut run).await {
            Ok(documents) => {
                info!(
                    documents = documents.len(),
                    rules = run.rules,
                    attempts = run.generation_attempts,
                    elapsed_ms = run.elapsed_ms(),
                    "Compilation succeeded"
                );
                Ok(CompilationResult {
                    documents,
                    metadata: CompilationMetadata {
                        trace: run.trace.into_states(),
                        rules: run.rules,
                        extraction_attempts: run.extraction_attempts,
                        generation_attempts: run.generation_attempts,
                        exemplars_used: run.exemplars_used,
                        retrieval_degraded: run.retrieval_degraded,
                        exemplars_recorded: run.exemplars_recorded,
                        elapsed: run.started.elapsed(),
                    },
                })
            }
            Err(e) => {
                run.trace.advance(CompileState::Failed);
                warn!(
                    kind = %e.kind(),
                    elapsed_ms = run.elapsed_ms(),
                    "Compilation failed: {}",
                    e
                );
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        request: &CompileRequest,
        run: &mut Run,
    ) -> Result<Vec<CompiledDocument>, CompileError> {
        let metadata = request
            .metadata
            .clone()
            .unwrap_or_else(|| self.config.table.metadata());

        let rules = self.extract(request, &metadata, run).await?;
        run.rules = rules.len();
        let plans = self.plan(rules, request, &metadata);

        let mut documents = Vec::with_capacity(plans.len());
        for plan in &plans {
            self.call_budget(run, CompileState::Retrieving)?;
            run.trace.advance(CompileState::Retrieving);
            let exemplars = self.retrieve(&plan.text, run).await;
            run.exemplars_used += exemplars.len().min(self.config.generator.max_exemplars);

            documents.push(self.generate(plan, &exemplars, run).await?);
        }
        run.trace.advance(CompileState::Succeeded);

        if self.config.record_exemplars {
            run.exemplars_recorded = self.record(&plans, &documents).await;
        }

        Ok(documents)
    }

    async fn extract(
        &self,
        request: &CompileRequest,
        metadata: &TableMetadata,
        run: &mut Run,
    ) -> Result<Vec<StructuredRule>, CompileError> {
        let texts: Vec<&str> = request
            .rule_texts
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if texts.is_empty() {
            return Err(ExtractionError::EmptyInput.into());
        }

        let mut rules = Vec::new();
        for text in texts {
            rules.extend(self.extract_text(text, metadata, run).await?);
        }
        // Baselines of every text fall below the conditional rules of every text
        let rules = order_rules(rules, self.config.extractor.baseline_priority);
        debug!(rules = rules.len(), "Extracted structured rules");
        Ok(rules)
    }

    async fn extract_text(
        &self,
        text: &str,
        metadata: &TableMetadata,
        run: &mut Run,
    ) -> Result<Vec<StructuredRule>, CompileError> {
        loop {
            let budget = self.call_budget(run, CompileState::Extracting)?;
            run.trace.advance(CompileState::Extracting);
            run.extraction_attempts += 1;

            let mut request =
                ExtractionRequest::new(text, metadata.input_type.as_str(), metadata.target_type.as_str())
                    .with_default_priority(metadata.default_priority)
                    .with_timeout(budget);
            if let Some(model) = &metadata.fact_model {
                request = request.with_fact_model(model.clone());
            }

            match self.extractor.extract(request).await {
                Ok(rules) => return Ok(rules),
                Err(e) if e.is_retryable() => {
                    debug!("Extraction attempt {} timed out: {}", run.extraction_attempts, e);
                    let attempts = run.extraction_attempts;
                    self.after_timeout(run, CompileState::Extracting, attempts).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn plan(
        &self,
        rules: Vec<StructuredRule>,
        request: &CompileRequest,
        metadata: &TableMetadata,
    ) -> Vec<TablePlan> {
        match self.config.clause_policy {
            ClausePolicy::SingleTable => vec![TablePlan {
                rules,
                text: request.joined_text(),
                metadata: metadata.clone(),
            }],
            ClausePolicy::TablePerClause => {
                let numbered = rules.len() > 1;
                rules
                    .into_iter()
                    .enumerate()
                    .map(|(idx, rule)| {
                        let mut table = metadata.clone();
                        if let (true, Some(name)) = (numbered, &metadata.table_name) {
                            table.table_name = Some(format!("{}-{}", name, idx + 1));
                        }
                        TablePlan {
                            text: rule
                                .source_clause
                                .clone()
                                .unwrap_or_else(|| request.joined_text()),
                            rules: vec![rule],
                            metadata: table,
                        }
                    })
                    .collect()
            }
        }
    }

    /// Query the example index; any failure degrades to no exemplars
    async fn retrieve(&self, text: &str, run: &mut Run) -> Vec<Exemplar> {
        let k = self.config.effective_k();
        if k == 0 {
            return Vec::new();
        }

        let index = Arc::clone(&self.index);
        let query = text.to_string();
        let result =
            tokio::task::spawn_blocking(move || index.query(&query, k).map_err(|e| e.to_string()))
                .await;

        match result {
            Ok(Ok(mut exemplars)) => {
                exemplars.truncate(k);
                debug!(found = exemplars.len(), "Retrieved exemplars");
                exemplars
            }
            Ok(Err(e)) => {
                warn!("Example index unavailable, generating without exemplars: {}", e);
                run.retrieval_degraded = true;
                Vec::new()
            }
            Err(join) => {
                warn!("Example index query aborted, generating without exemplars: {}", join);
                run.retrieval_degraded = true;
                Vec::new()
            }
        }
    }

    /// Generate and validate until a candidate is accepted or a budget runs out
    async fn generate(
        &self,
        plan: &TablePlan,
        exemplars: &[Exemplar],
        run: &mut Run,
    ) -> Result<CompiledDocument, CompileError> {
        let mut feedback: Vec<String> = Vec::new();
        let mut candidates = 0u32;
        let mut rejections = 0u32;

        loop {
            let budget = self.call_budget(run, CompileState::Generating)?;
            run.trace.advance(CompileState::Generating);
            run.generation_attempts += 1;
            candidates += 1;

            let fill = FillRequest {
                rules: &plan.rules,
                exemplars,
                template: &self.template,
                metadata: &plan.metadata,
                feedback: &feedback,
                timeout: Some(budget),
            };

            let candidate = match self.filler.fill(fill).await {
                Ok(candidate) => candidate,
                Err(GenerationError::Timeout(ms)) => {
                    debug!("Generation attempt {} timed out after {} ms", candidates, ms);
                    self.after_timeout(run, CompileState::Generating, candidates).await?;
                    continue;
                }
                Err(e) => return Err(CompileError::Configuration(e.to_string())),
            };

            run.trace.advance(CompileState::Validating);
            match self.gatekeeper.validate(&candidate, &self.template) {
                Ok(document) => {
                    debug!(candidates, "Candidate accepted");
                    return Ok(document);
                }
                Err(rejection) => {
                    rejections += 1;
                    info!(
                        attempt = candidates,
                        category = %rejection.category,
                        reasons = rejection.reasons.len(),
                        "Candidate rejected"
                    );
                    if rejections > self.config.retry.max_retries {
                        return Err(CompileError::Compilation {
                            attempts: candidates,
                            category: rejection.category,
                            reasons: rejection.messages(),
                        });
                    }
                    feedback = rejection.messages();
                    self.pause(run, self.config.retry.backoff(rejections)).await;
                }
            }
        }
    }

    /// Append one exemplar per document; failures are logged, never fatal
    async fn record(&self, plans: &[TablePlan], documents: &[CompiledDocument]) -> usize {
        let exemplars: Vec<Exemplar> = plans
            .iter()
            .zip(documents)
            .map(|(plan, document)| Exemplar::new(plan.text.as_str(), document.as_str()))
            .collect();

        let index = Arc::clone(&self.index);
        let result = tokio::task::spawn_blocking(move || {
            let mut added = 0;
            for exemplar in exemplars {
                match index.add(exemplar) {
                    Ok(()) => added += 1,
                    Err(e) => warn!("Failed to record exemplar: {}", e),
                }
            }
            added
        })
        .await;

        match result {
            Ok(added) => {
                debug!(added, "Recorded exemplars");
                added
            }
            Err(join) => {
                warn!("Recording exemplars aborted: {}", join);
                0
            }
        }
    }

    /// Time allowed for the next call, or `DeadlineExceeded` before entering `state`
    fn call_budget(&self, run: &Run, state: CompileState) -> Result<Duration, CompileError> {
        let limit = self.config.call_timeout();
        let Some(deadline) = run.deadline else {
            return Ok(limit);
        };
        let now = Instant::now();
        if now >= deadline {
            return Err(CompileError::DeadlineExceeded {
                state,
                elapsed_ms: run.elapsed_ms(),
            });
        }
        Ok(limit.min(deadline - now))
    }

    async fn after_timeout(
        &self,
        run: &mut Run,
        stage: CompileState,
        attempts: u32,
    ) -> Result<(), CompileError> {
        run.timeouts += 1;
        if run.timeouts > self.config.retry.max_timeout_retries {
            return Err(CompileError::Timeout { stage, attempts });
        }
        self.pause(run, self.config.retry.backoff(run.timeouts)).await;
        Ok(())
    }

    /// Back off, never sleeping past the deadline
    async fn pause(&self, run: &Run, delay: Duration) {
        let delay = match run.deadline {
            Some(deadline) => delay.min(deadline.saturating_duration_since(Instant::now())),
            None => delay,
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
