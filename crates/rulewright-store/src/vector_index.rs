//! HNSW Vector Index for Exemplar Retrieval
//!
//! Wraps the HNSW algorithm for approximate nearest-neighbor search over
//! exemplar embeddings. The index itself is not synchronized; the owning
//! [`ExemplarIndex`](crate::ExemplarIndex) guards it together with the
//! exemplar records so both change under one lock.
//!
//! # HNSW Parameters
//!
//! - **M**: Number of bi-directional links per node (16)
//! - **efConstruction**: Candidate list size during construction (200)
//! - **efSearch**: Candidate list size during search (caller supplied)

use hnsw_rs::prelude::*;
use rulewright_domain::ExemplarId;
use std::collections::HashMap;
use thiserror::Error;

const DEFAULT_M: usize = 16;
const DEFAULT_EF_CONSTRUCTION: usize = 200;
const DEFAULT_MAX_ELEMENTS: usize = 100_000;

/// Errors that can occur during vector index operations
#[derive(Error, Debug)]
pub enum VectorIndexError {
    /// Invalid embedding dimension
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        actual: usize,
    },
}

/// HNSW index mapping embeddings to exemplar ids
///
/// # Examples
///
/// ```no_run
/// use rulewright_store::vector_index::VectorIndex;
/// use rulewright_domain::ExemplarId;
///
/// let mut index = VectorIndex::new(3);
/// let id = ExemplarId::new();
/// index.add(id, &[1.0, 0.0, 0.0]).unwrap();
///
/// let results = index.search(&[1.0, 0.0, 0.0], 5, 64).unwrap();
/// assert_eq!(results[0].0, id);
/// ```
pub struct VectorIndex {
    dimension: usize,
    hnsw: Hnsw<'static, f32, DistCosine>,
    id_map: HashMap<usize, ExemplarId>,
    next_id: usize,
}

impl VectorIndex {
    /// Create a new vector index with the specified dimension
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            hnsw: new_hnsw(),
            id_map: HashMap::new(),
            next_id: 0,
        }
    }

    /// Embedding dimension accepted by this index
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Add an exemplar embedding to the index
    pub fn add(&mut self, id: ExemplarId, embedding: &[f32]) -> Result<(), VectorIndexError> {
        self.check_dimension(embedding)?;

        let internal_id = self.next_id;
        self.next_id += 1;
        self.hnsw.insert((embedding, internal_id));
        self.id_map.insert(internal_id, id);

        Ok(())
    }

    /// Search for the k nearest neighbors of `query`
    ///
    /// Returns `(ExemplarId, similarity)` pairs, most similar first, where
    /// similarity is `1 - cosine distance`.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        ef_search: usize,
    ) -> Result<Vec<(ExemplarId, f32)>, VectorIndexError> {
        self.check_dimension(query)?;
        if self.id_map.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut results: Vec<(ExemplarId, f32)> = self
            .hnsw
            .search(query, k, ef_search.max(k))
            .into_iter()
            .filter_map(|neighbour| {
                self.id_map
                    .get(&neighbour.d_id)
                    .map(|&id| (id, 1.0 - neighbour.distance))
            })
            .collect();
        results.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        Ok(results)
    }

    /// Get the number of vectors in the index
    pub fn len(&self) -> usize {
        self.id_map.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.id_map.is_empty()
    }

    /// Check that `embedding` can be added or searched with
    pub fn check_dimension(&self, embedding: &[f32]) -> Result<(), VectorIndexError> {
        if embedding.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(())
    }
}

fn new_hnsw() -> Hnsw<'static, f32, DistCosine> {
    let nb_layer = 16.min((DEFAULT_MAX_ELEMENTS as f32).ln().trunc() as usize);
    Hnsw::<'static, f32, DistCosine>::new(
        DEFAULT_M,
        DEFAULT_MAX_ELEMENTS,
        nb_layer,
        DEFAULT_EF_CONSTRUCTION,
        DistCosine {},
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_index_creation() {
        let index = VectorIndex::new(384);
        assert_eq!(index.dimension(), 384);
        assert!(index.is_empty());
    }

    #[test]
    fn test_search_empty_index() {
        let index = VectorIndex::new(3);
        assert!(index.search(&[1.0, 0.0, 0.0], 3, 64).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut index = VectorIndex::new(384);
        let result = index.add(ExemplarId::new(), &[0.1; 128]);
        assert!(matches!(result, Err(VectorIndexError::DimensionMismatch { .. })));
        assert!(index.search(&[0.1; 3], 1, 64).is_err());
    }

    #[test]
    fn test_results_ordered_by_similarity() {
        let mut index = VectorIndex::new(3);

        let x = ExemplarId::from_value(1);
        let y = ExemplarId::from_value(2);
        let diagonal = ExemplarId::from_value(3);
        index.add(x, &[1.0, 0.0, 0.0]).unwrap();
        index.add(y, &[0.0, 1.0, 0.0]).unwrap();
        index.add(diagonal, &[0.7071, 0.7071, 0.0]).unwrap();
        assert_eq!(index.len(), 3);

        let results = index.search(&[1.0, 0.0, 0.0], 3, 64).unwrap();
        assert_eq!(results[0].0, x);
        assert!(results[0].1 > 0.99);
        assert_eq!(results[1].0, diagonal);
        assert!(results[1].1 > 0.5);
        assert_eq!(results[2].0, y);
        assert!(results[2].1 < 0.1);
    }
}
