//! Rulewright Compiler
//!
//! Orchestrates the rule compilation pipeline:
//!
//! ```text
//! PENDING → EXTRACTING → RETRIEVING → GENERATING → VALIDATING → SUCCEEDED
//!               │                         ↑   │          │
//!               └─ timeout retry ─┘       └───┴─ retry ──┘   (any) → FAILED
//! ```
//!
//! - Extraction failures are terminal (`ExtractionError`), except timeouts
//! - Retrieval always succeeds; an unreachable index means no exemplars
//! - Validation rejections re-enter generation with the reasons as
//!   feedback, up to `max_retries`
//! - Capability timeouts retry up to `max_timeout_retries`
//! - The request deadline is checked before every attempt
//!
//! # Example Usage
//!
//! ```no_run
//! use rulewright_compiler::{CompileRequest, Compiler, CompilerConfig};
//! use rulewright_llm::OllamaProvider;
//! use rulewright_store::{ExemplarIndex, HashingEmbeddingModel};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let compiler = Compiler::new(
//!     OllamaProvider::default_endpoint("llama3"),
//!     ExemplarIndex::new(HashingEmbeddingModel::default()),
//!     CompilerConfig::default(),
//! )?;
//!
//! let result = compiler
//!     .compile(CompileRequest::new("If restaurant size is large then assign 10 employees"))
//!     .await?;
//! println!("{}", result.documents[0]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod compiler;
mod config;
mod error;
mod state;
mod types;

pub use compiler::Compiler;
pub use config::{
    ClausePolicy, CompilerConfig, FactTypeSettings, RetryPolicy, TableDefaults, MAX_RETRIEVAL_K,
};
pub use error::{CompileError, ErrorKind};
pub use state::{CompileState, StateTrace};
pub use types::{CompilationMetadata, CompilationResult, CompileRequest};
