//! Request and result types for the Compiler

use crate::state::CompileState;
use rulewright_domain::TableMetadata;
use rulewright_template::CompiledDocument;
use std::time::{Duration, Instant};

/// A compilation request
#[derive(Debug, Clone, PartialEq)]
pub struct CompileRequest {
    /// Rule texts; all their rules go into one request
    pub rule_texts: Vec<String>,

    /// Table naming and fact types (falls back to the configured defaults)
    pub metadata: Option<TableMetadata>,

    /// Point in time after which no further attempt is started
    pub deadline: Option<Instant>,
}

impl CompileRequest {
    /// Request for a single rule text
    pub fn new(rule_text: impl Into<String>) -> Self {
        Self::batch([rule_text])
    }

    /// Request for several rule texts compiled together
    pub fn batch<I, S>(rule_texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rule_texts: rule_texts.into_iter().map(Into::into).collect(),
            metadata: None,
            deadline: None,
        }
    }

    /// Use explicit table metadata
    pub fn with_metadata(mut self, metadata: TableMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Give up once `deadline` has passed
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Give up once `budget` has elapsed from now
    pub fn with_time_budget(self, budget: Duration) -> Self {
        self.with_deadline(Instant::now() + budget)
    }

    /// Rule texts joined as one text (used for retrieval and recording)
    pub fn joined_text(&self) -> String {
        self.rule_texts
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// What happened while compiling
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationMetadata {
    /// Visited states, oldest first
    pub trace: Vec<CompileState>,

    /// Structured rules extracted
    pub rules: usize,

    /// Extraction calls made
    pub extraction_attempts: u32,

    /// Candidates generated across all tables
    pub generation_attempts: u32,

    /// Exemplars shown to the Slot Filler across all tables
    pub exemplars_used: usize,

    /// The example index failed and generation ran without exemplars
    pub retrieval_degraded: bool,

    /// Exemplars appended to the index after success
    pub exemplars_recorded: usize,

    /// Wall-clock time of the request
    pub elapsed: Duration,
}

/// A successful compilation
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationResult {
    /// Validated documents: one, or one per rule under `TablePerClause`
    pub documents: Vec<CompiledDocument>,

    /// What happened while compiling
    pub metadata: CompilationMetadata,
}

impl CompilationResult {
    /// The first (under `SingleTable`, the only) document
    pub fn document(&self) -> Option<&CompiledDocument> {
        self.documents.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joined_text_skips_blank_texts() {
        let request = CompileRequest::batch(["  if a then b ", "", "if c then d"]);
        assert_eq!(request.joined_text(), "if a then b\nif c then d");
    }

    #[test]
    fn test_time_budget_sets_deadline() {
        let before = Instant::now();
        let request = CompileRequest::new("if a then b").with_time_budget(Duration::from_secs(5));
        assert!(request.deadline.unwrap() >= before + Duration::from_secs(5));
    }
}
