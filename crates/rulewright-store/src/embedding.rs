//! Embedding Model for Text Vectorization
//!
//! Turns rule text into vectors for similarity search. The bundled
//! [`HashingEmbeddingModel`] is a feature-hashing bag-of-words model: it is
//! deterministic, needs no model files, and scores texts that share more
//! vocabulary as more similar under cosine similarity.
//!
//! # Examples
//!
//! ```rust
//! use rulewright_store::embedding::{cosine_similarity, EmbeddingModel, HashingEmbeddingModel};
//!
//! let model = HashingEmbeddingModel::new(256);
//! let small = model.embed("if restaurant size is small then assign 5 employees").unwrap();
//! let large = model.embed("if restaurant size is large then assign 10 employees").unwrap();
//! let other = model.embed("when the oven temperature exceeds 250 degrees raise an alarm").unwrap();
//!
//! assert!(cosine_similarity(&small, &large) > cosine_similarity(&small, &other));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Default embedding dimension
pub const DEFAULT_DIMENSION: usize = 384;

/// Weight of a word pair relative to a single word
const BIGRAM_WEIGHT: f32 = 0.5;

/// Connective words that carry no meaning of their own in a rule
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "if", "then", "is", "are", "be", "to", "of", "and", "when", "it",
];

/// Errors that can occur during embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Invalid input text
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model inference error
    #[error("Model inference failed: {0}")]
    InferenceFailed(String),
}

/// Trait for embedding models
pub trait EmbeddingModel {
    /// Generate an embedding vector for the given text
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Get the dimension of embeddings produced by this model
    fn dimension(&self) -> usize;
}

/// Feature-hashing embedding model
///
/// Lower-cased word unigrams and adjacent word pairs are hashed into
/// `dimension` buckets; the resulting term-frequency vector is normalized to
/// unit length.
#[derive(Debug, Clone)]
pub struct HashingEmbeddingModel {
    dimension: usize,
}

impl HashingEmbeddingModel {
    /// Create a new hashing embedding model
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn bucket(&self, feature: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        feature.hash(&mut hasher);
        (hasher.finish() % self.dimension as u64) as usize
    }
}

impl Default for HashingEmbeddingModel {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

/// Split text into lower-cased alphanumeric words
pub fn tokenize(text: &str) -> Vec<String> {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect();

    let content: Vec<String> = words
        .iter()
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .cloned()
        .collect();

    if content.is_empty() {
        words
    } else {
        content
    }
}

impl EmbeddingModel for HashingEmbeddingModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Text contains no words to embed".to_string(),
            ));
        }

        let mut embedding = vec![0.0f32; self.dimension];
        for token in &tokens {
            embedding[self.bucket(token)] += 1.0;
        }
        for pair in tokens.windows(2) {
            let feature = format!("{} {}", pair[0], pair[1]);
            embedding[self.bucket(&feature)] += BIGRAM_WEIGHT;
        }

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude == 0.0 {
            return Err(EmbeddingError::InferenceFailed(
                "Embedding has zero magnitude".to_string(),
            ));
        }
        for value in &mut embedding {
            *value /= magnitude;
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Calculate cosine similarity between two embedding vectors
///
/// Returns 0.0 when the lengths differ or either vector is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: any text with a word embeds to a unit vector
        #[test]
        fn test_embedding_is_normalized(words in proptest::collection::vec("[a-z]{1,8}", 1..12)) {
            let model = HashingEmbeddingModel::new(64);
            let text = words.join(" ");
            let embedding = model.embed(&text).unwrap();
            let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
            prop_assert!((magnitude - 1.0).abs() < 1e-4);
        }

        /// Property: a text is at least as similar to itself as to anything else
        #[test]
        fn test_self_similarity_is_maximal(a in "[a-z]{1,8}( [a-z]{1,8}){0,6}", b in "[a-z]{1,8}( [a-z]{1,8}){0,6}") {
            let model = HashingEmbeddingModel::new(64);
            let ea = model.embed(&a).unwrap();
            let eb = model.embed(&b).unwrap();
            prop_assert!(cosine_similarity(&ea, &ea) + 1e-5 >= cosine_similarity(&ea, &eb));
        }
    }
}
