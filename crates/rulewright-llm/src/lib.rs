//! Rulewright LLM Provider Layer
//!
//! Implementations of the `LlmProvider` trait from `rulewright-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic scripted provider for testing
//! - `OllamaProvider`: Local Ollama API integration
//!
//! # Examples
//!
//! ```
//! use rulewright_llm::MockProvider;
//! use rulewright_domain::traits::LlmProvider;
//!
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.generate("test prompt").unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! ```

#![warn(missing_docs)]

pub mod ollama;

use rulewright_domain::traits::LlmProvider as LlmProviderTrait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

pub use ollama::OllamaProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The provider did not answer in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// Whether the error is a timeout rather than a hard failure
    pub fn is_timeout(&self) -> bool {
        matches!(self, LlmError::Timeout(_))
    }
}

/// A scripted reply of the mock provider
#[derive(Debug, Clone)]
enum Scripted {
    Text(String),
    Error,
    Delayed(Duration, String),
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
/// Responses are looked up in order:
///
/// 1. an exact match on the whole prompt
/// 2. the first registered fragment contained in the prompt; each fragment
///    owns a queue of replies consumed in order, the last one repeating
/// 3. the default response
///
/// # Examples
///
/// ```
/// use rulewright_llm::MockProvider;
/// use rulewright_domain::traits::LlmProvider;
///
/// let provider = MockProvider::new("fallback");
/// provider.add_response_containing("small", "first");
/// provider.add_response_containing("small", "second");
///
/// assert_eq!(provider.generate("size is small").unwrap(), "first");
/// assert_eq!(provider.generate("size is small").unwrap(), "second");
/// assert_eq!(provider.generate("size is small").unwrap(), "second");
/// assert_eq!(provider.generate("size is large").unwrap(), "fallback");
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, String>>>,
    scripted: Arc<Mutex<Vec<(String, VecDeque<Scripted>)>>>,
    latency: Option<Duration>,
    call_count: Arc<Mutex<usize>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            scripted: Arc::new(Mutex::new(Vec::new())),
            latency: None,
            call_count: Arc::new(Mutex::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Delay every call by `latency` before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Add a specific response for an exact prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        relock(&self.responses).insert(prompt.into(), response.into());
    }

    /// Configure to return an error for an exact prompt
    pub fn add_error(&mut self, prompt: impl Into<String>) {
        relock(&self.responses).insert(prompt.into(), "ERROR".to_string());
    }

    /// Queue a response for prompts containing `fragment`
    pub fn add_response_containing(&self, fragment: impl Into<String>, response: impl Into<String>) {
        self.push_scripted(fragment.into(), Scripted::Text(response.into()));
    }

    /// Queue an error for prompts containing `fragment`
    pub fn add_error_containing(&self, fragment: impl Into<String>) {
        self.push_scripted(fragment.into(), Scripted::Error);
    }

    /// Queue a response delivered only after `delay`
    pub fn add_slow_response_containing(
        &self,
        fragment: impl Into<String>,
        delay: Duration,
        response: impl Into<String>,
    ) {
        self.push_scripted(fragment.into(), Scripted::Delayed(delay, response.into()));
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        *relock(&self.call_count)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *relock(&self.call_count) = 0;
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        relock(&self.prompts).clone()
    }

    fn push_scripted(&self, fragment: String, reply: Scripted) {
        let mut scripted = relock(&self.scripted);
        match scripted.iter_mut().find(|(f, _)| *f == fragment) {
            Some((_, queue)) => queue.push_back(reply),
            None => scripted.push((fragment, VecDeque::from([reply]))),
        }
    }

    fn next_scripted(&self, prompt: &str) -> Option<Scripted> {
        let mut scripted = relock(&self.scripted);
        let (_, queue) = scripted.iter_mut().find(|(f, _)| prompt.contains(f.as_str()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked
fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        *relock(&self.call_count) += 1;
        relock(&self.prompts).push(prompt.to_string());

        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }

        if let Some(response) = relock(&self.responses).get(prompt) {
            if response == "ERROR" {
                return Err(LlmError::Other("Mock error".to_string()));
            }
            return Ok(response.clone());
        }

        match self.next_scripted(prompt) {
            Some(Scripted::Text(response)) => Ok(response),
            Some(Scripted::Error) => Err(LlmError::Communication("Mock error".to_string())),
            Some(Scripted::Delayed(delay, response)) => {
                std::thread::sleep(delay);
                Ok(response)
            }
            None => Ok(self.default_response.clone()),
        }
    }

    fn generate_structured(&self, prompt: &str, _schema: &str) -> Result<String, Self::Error> {
        self.generate(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        assert_eq!(provider.generate("any prompt").unwrap(), "Test response");
    }

    #[test]
    fn test_mock_provider_specific_responses() {
        let mut provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(provider.generate("hello").unwrap(), "world");
        assert_eq!(provider.generate("foo").unwrap(), "bar");
        assert_eq!(provider.generate("unknown").unwrap(), "Default mock response");
    }

    #[test]
    fn test_exact_match_wins_over_fragment() {
        let mut provider = MockProvider::default();
        provider.add_response_containing("hello", "fragment");
        provider.add_response("hello", "exact");

        assert_eq!(provider.generate("hello").unwrap(), "exact");
        assert_eq!(provider.generate("hello there").unwrap(), "fragment");
    }

    #[test]
    fn test_fragment_queue_repeats_last() {
        let provider = MockProvider::default();
        provider.add_response_containing("clause", "one");
        provider.add_response_containing("clause", "two");

        assert_eq!(provider.generate("a clause").unwrap(), "one");
        assert_eq!(provider.generate("a clause").unwrap(), "two");
        assert_eq!(provider.generate("a clause").unwrap(), "two");
    }

    #[test]
    fn test_first_registered_fragment_wins() {
        let provider = MockProvider::default();
        provider.add_response_containing("size", "by size");
        provider.add_response_containing("small", "by small");

        assert_eq!(provider.generate("size is small").unwrap(), "by size");
        assert_eq!(provider.generate("small").unwrap(), "by small");
    }

    #[test]
    fn test_scripted_error_then_success() {
        let provider = MockProvider::default();
        provider.add_error_containing("flaky");
        provider.add_response_containing("flaky", "recovered");

        assert!(matches!(provider.generate("flaky"), Err(LlmError::Communication(_))));
        assert_eq!(provider.generate("flaky").unwrap(), "recovered");
    }

    #[test]
    fn test_mock_provider_call_count_and_prompts() {
        let provider = MockProvider::new("test");
        assert_eq!(provider.call_count(), 0);

        provider.generate("prompt1").unwrap();
        provider.generate("prompt2").unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.prompts(), vec!["prompt1".to_string(), "prompt2".to_string()]);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn test_mock_provider_error() {
        let mut provider = MockProvider::default();
        provider.add_error("bad prompt");
        assert!(matches!(provider.generate("bad prompt"), Err(LlmError::Other(_))));
    }

    #[test]
    fn test_mock_provider_latency() {
        let provider = MockProvider::new("slow").with_latency(Duration::from_millis(20));
        let start = std::time::Instant::now();
        assert_eq!(provider.generate("x").unwrap(), "slow");
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();
        provider2.add_response_containing("shared", "seen by both");

        provider1.generate("shared").unwrap();
        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
        assert_eq!(provider2.generate("shared").unwrap(), "seen by both");
    }

    #[test]
    fn test_timeout_classification() {
        assert!(LlmError::Timeout("slow".into()).is_timeout());
        assert!(!LlmError::Communication("down".into()).is_timeout());
    }
}
