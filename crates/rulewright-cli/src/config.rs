//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use rulewright_compiler::CompilerConfig;
use rulewright_llm::ollama::{DEFAULT_ENDPOINT, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS};
use rulewright_llm::OllamaProvider;
use rulewright_store::embedding::DEFAULT_DIMENSION;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_DIR: &str = ".rulewright";
const CONFIG_FILE: &str = "config.toml";
const JOURNAL_FILE: &str = "exemplars.db";

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Language model endpoint
    pub llm: LlmSettings,

    /// Exemplar storage
    pub store: StoreSettings,

    /// Compiler knobs
    pub compiler: CompilerConfig,
}

/// Ollama connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Ollama API endpoint
    pub endpoint: String,

    /// Model name
    pub model: String,

    /// HTTP timeout per request, in seconds
    pub timeout_secs: u64,

    /// Attempts per HTTP request
    pub max_retries: u32,
}

/// Exemplar storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// SQLite journal path (default: ~/.rulewright/exemplars.db)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal_path: Option<PathBuf>,

    /// Embedding dimension
    pub dimension: usize,

    /// Drop search results scoring below this similarity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_similarity: Option<f32>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: "llama3".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl LlmSettings {
    /// Build the provider these settings describe
    pub fn provider(&self) -> OllamaProvider {
        OllamaProvider::new(&self.endpoint, &self.model)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_max_retries(self.max_retries)
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            journal_path: None,
            dimension: DEFAULT_DIMENSION,
            min_similarity: None,
        }
    }
}

impl Config {
    /// Directory holding the default config file and journal.
    pub fn home() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(CONFIG_DIR))
    }

    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::home()?.join(CONFIG_FILE))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::path()?;
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        if self.llm.model.trim().is_empty() {
            return Err(CliError::Config("llm.model must not be empty".into()));
        }
        if self.llm.timeout_secs == 0 {
            return Err(CliError::Config("llm.timeout_secs must be positive".into()));
        }
        if self.store.dimension == 0 {
            return Err(CliError::Config("store.dimension must be positive".into()));
        }
        if let Some(min) = self.store.min_similarity {
            if !(-1.0..=1.0).contains(&min) {
                return Err(CliError::Config(
                    "store.min_similarity must be between -1.0 and 1.0".into(),
                ));
            }
        }
        self.compiler
            .validate()
            .map_err(|e| CliError::Config(format!("compiler: {}", e)))
    }

    /// Journal location, resolving the default.
    pub fn journal_path(&self) -> Result<PathBuf> {
        match &self.store.journal_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::home()?.join(JOURNAL_FILE)),
        }
    }
}
