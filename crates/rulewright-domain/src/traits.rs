//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the compilation pipeline and
//! infrastructure. Implementations live in other crates.

use crate::Exemplar;

/// Trait for language-understanding provider operations
///
/// Implemented by the infrastructure layer (rulewright-llm). Calls are
/// blocking and I/O-bound; callers are expected to bound them with a timeout.
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Generate text completion
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Generate output constrained to a JSON schema
    fn generate_structured(&self, prompt: &str, schema: &str) -> Result<String, Self::Error>;
}

/// Trait for the similarity-searchable store of exemplars
///
/// Implemented by the infrastructure layer (rulewright-store). Both
/// operations take `&self`: `query` may run concurrently with other
/// queries and with `add`, and every `add` is atomic.
pub trait ExampleIndex {
    /// Error type for index operations
    type Error;

    /// Return up to `k` exemplars, most similar to `rule_text` first
    ///
    /// An empty index yields an empty sequence, not an error.
    fn query(&self, rule_text: &str, k: usize) -> Result<Vec<Exemplar>, Self::Error>;

    /// Append an exemplar
    fn add(&self, exemplar: Exemplar) -> Result<(), Self::Error>;
}
