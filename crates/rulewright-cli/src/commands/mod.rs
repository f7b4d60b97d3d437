//! Command implementations.

pub mod compile;
pub mod search;
pub mod seed;

pub use self::compile::execute_compile;
pub use self::search::execute_search;
pub use self::seed::execute_seed;

use crate::config::Config;
use crate::error::Result;
use rulewright_store::{ExemplarIndex, HashingEmbeddingModel};
use std::fs;
use tracing::debug;

/// Exemplar index backed by the configured journal.
pub type Index = ExemplarIndex<HashingEmbeddingModel>;

/// Open the configured exemplar journal, creating its directory if needed.
pub fn open_index(config: &Config) -> Result<Index> {
    let path = config.journal_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    debug!("Opening exemplar journal at {}", path.display());

    let model = HashingEmbeddingModel::new(config.store.dimension);
    let index = ExemplarIndex::persistent(model, &path)?;
    Ok(match config.store.min_similarity {
        Some(min) => index.with_min_similarity(min),
        None => index,
    })
}
