//! Error types for the Compiler

use crate::state::CompileState;
use rulewright_extractor::ExtractionError;
use rulewright_gatekeeper::ValidationCategory;
use std::fmt;
use thiserror::Error;

/// Machine-readable kind of a terminal failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The text could not be mapped to structured rules
    Extraction,
    /// The capability kept timing out
    GenerationTimeout,
    /// Every candidate was rejected by the validator
    Compilation,
    /// The request deadline elapsed
    DeadlineExceeded,
    /// The compiler or a request is misconfigured
    Configuration,
}

impl ErrorKind {
    /// Get the kind as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Extraction => "extraction",
            ErrorKind::GenerationTimeout => "generation_timeout",
            ErrorKind::Compilation => "compilation",
            ErrorKind::DeadlineExceeded => "deadline_exceeded",
            ErrorKind::Configuration => "configuration",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal failure of a compilation request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// Extraction failed for a reason retrying cannot fix
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// Timeouts exhausted the timeout retry budget
    #[error("Timed out during {stage} after {attempts} attempts")]
    Timeout {
        /// Stage that timed out
        stage: CompileState,
        /// Calls made in that stage
        attempts: u32,
    },

    /// Validation rejected every candidate
    #[error("Compilation failed after {attempts} attempts ({category}): {}", .reasons.join("; "))]
    Compilation {
        /// Candidates generated
        attempts: u32,
        /// Category of the last rejection
        category: ValidationCategory,
        /// Reasons of the last rejection
        reasons: Vec<String>,
    },

    /// The request deadline elapsed before the next attempt
    #[error("Deadline exceeded in {state} after {elapsed_ms} ms")]
    DeadlineExceeded {
        /// State the compiler was about to enter
        state: CompileState,
        /// Time spent on the request
        elapsed_ms: u64,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CompileError {
    /// Machine-readable kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::Extraction(_) => ErrorKind::Extraction,
            CompileError::Timeout { .. } => ErrorKind::GenerationTimeout,
            CompileError::Compilation { .. } => ErrorKind::Compilation,
            CompileError::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
            CompileError::Configuration(_) => ErrorKind::Configuration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            CompileError::from(ExtractionError::NoActions(0)).kind().as_str(),
            "extraction"
        );
        let timeout = CompileError::Timeout {
            stage: CompileState::Generating,
            attempts: 3,
        };
        assert_eq!(timeout.kind(), ErrorKind::GenerationTimeout);
        assert_eq!(
            CompileError::Configuration("bad".into()).kind().to_string(),
            "configuration"
        );
    }

    #[test]
    fn test_compilation_error_lists_reasons() {
        let error = CompileError::Compilation {
            attempts: 4,
            category: ValidationCategory::UnresolvedSlots,
            reasons: vec!["slot 'header' unresolved".into(), "slot 'tableName' unresolved".into()],
        };
        let message = error.to_string();
        assert!(message.contains("4 attempts"));
        assert!(message.contains("unresolved_slots"));
        assert!(message.contains("'tableName'"));
    }
}
