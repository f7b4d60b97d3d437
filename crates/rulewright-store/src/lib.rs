//! Rulewright Storage Layer
//!
//! Implements the `ExampleIndex` trait: a similarity-searchable store of
//! previously compiled (rule text, document) pairs.
//!
//! # Architecture
//!
//! - Feature-hashing embedding model for rule text
//! - HNSW vector index for nearest-neighbor search
//! - Optional SQLite journal so exemplars survive restarts
//! - Seed exemplars loaded from JSON files
//!
//! # Examples
//!
//! ```
//! use rulewright_domain::traits::ExampleIndex;
//! use rulewright_domain::Exemplar;
//! use rulewright_store::{ExemplarIndex, HashingEmbeddingModel};
//!
//! let index = ExemplarIndex::new(HashingEmbeddingModel::default());
//! assert!(index.query("if size is large then assign 10", 3).unwrap().is_empty());
//!
//! index.add(Exemplar::new("if size is small then assign 5", "{}")).unwrap();
//! assert_eq!(index.query("if size is large then assign 10", 3).unwrap().len(), 1);
//! ```

#![warn(missing_docs)]

pub mod embedding;
pub mod index;
pub mod journal;
pub mod seed;
pub mod vector_index;

use thiserror::Error;

pub use embedding::{cosine_similarity, EmbeddingError, EmbeddingModel, HashingEmbeddingModel};
pub use index::{ExemplarIndex, MAX_QUERY_K};
pub use journal::ExemplarJournal;
pub use seed::{load_seed_dir, parse_seed};
pub use vector_index::{VectorIndex, VectorIndexError};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Embedding error
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Vector index error
    #[error("Vector index error: {0}")]
    VectorIndex(#[from] VectorIndexError),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The index cannot serve requests
    #[error("Index unavailable: {0}")]
    Unavailable(String),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
