//! Similarity-searchable exemplar index
//!
//! Every exemplar lives in one in-memory state guarded by a single
//! `RwLock`: the records, their embeddings and the HNSW graph change
//! together, so a reader sees an exemplar either fully or not at all.
//! Embedding happens before the lock is taken.

use crate::embedding::{cosine_similarity, EmbeddingModel};
use crate::journal::ExemplarJournal;
use crate::vector_index::VectorIndex;
use crate::StoreError;
use rulewright_domain::traits::ExampleIndex;
use rulewright_domain::{Exemplar, ExemplarId};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Hard upper bound on exemplars returned by one [`ExampleIndex::query`]
pub const MAX_QUERY_K: usize = 5;

/// Indexes at or below this size are scanned exactly instead of via HNSW
const EXACT_SCAN_LIMIT: usize = 1_024;

/// HNSW candidate list size during search
const EF_SEARCH: usize = 64;

struct IndexState {
    exemplars: HashMap<ExemplarId, Exemplar>,
    embeddings: HashMap<ExemplarId, Vec<f32>>,
    vectors: VectorIndex,
}

/// In-memory exemplar index with an optional SQLite journal
pub struct ExemplarIndex<M> {
    model: M,
    state: RwLock<IndexState>,
    journal: Option<Mutex<ExemplarJournal>>,
    min_similarity: Option<f32>,
}

impl<M: EmbeddingModel> ExemplarIndex<M> {
    /// Create an empty, non-persistent index
    pub fn new(model: M) -> Self {
        let dimension = model.dimension();
        Self {
            model,
            state: RwLock::new(IndexState {
                exemplars: HashMap::new(),
                embeddings: HashMap::new(),
                vectors: VectorIndex::new(dimension),
            }),
            journal: None,
            min_similarity: None,
        }
    }

    /// Open an index backed by the journal at `path`, replaying its contents
    pub fn persistent<P: AsRef<Path>>(model: M, path: P) -> Result<Self, StoreError> {
        let journal = ExemplarJournal::open(path)?;
        let stored = journal.load_all()?;

        let index = Self::new(model);
        for exemplar in stored {
            index.publish(exemplar)?;
        }
        info!("Replayed {} exemplars from journal", index.len());

        Ok(Self {
            journal: Some(Mutex::new(journal)),
            ..index
        })
    }

    /// Drop results scoring below `min_similarity`
    pub fn with_min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = Some(min_similarity);
        self
    }

    /// Append preloaded seed exemplars
    pub fn seed<I>(&self, exemplars: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = Exemplar>,
    {
        let mut count = 0;
        for exemplar in exemplars {
            self.append(exemplar)?;
            count += 1;
        }
        info!("Seeded {} exemplars", count);
        Ok(count)
    }

    /// Append one exemplar, journaling it first when persistent
    ///
    /// Nothing reaches the journal unless the in-memory insert that follows
    /// is known to succeed, so a replay never resurrects a rejected exemplar.
    pub fn append(&self, exemplar: Exemplar) -> Result<(), StoreError> {
        let embedding = self.model.embed(&exemplar.rule_text)?;

        let mut state = self.write_state()?;
        if state.exemplars.contains_key(&exemplar.id) {
            return Err(StoreError::InvalidData(format!(
                "Exemplar {} already stored",
                exemplar.id
            )));
        }
        state.vectors.check_dimension(&embedding)?;
        if let Some(journal) = &self.journal {
            journal
                .lock()
                .map_err(|_| StoreError::Unavailable("journal lock poisoned".to_string()))?
                .append(&exemplar)?;
        }
        Self::insert(&mut state, exemplar, embedding)?;

        debug!("Exemplar appended, index size {}", state.exemplars.len());
        Ok(())
    }

    /// Ranked search returning similarity scores, most similar first
    pub fn search(&self, text: &str, limit: usize) -> Result<Vec<(Exemplar, f32)>, StoreError> {
        let query = self.model.embed(text)?;
        let state = self.read_state()?;

        if state.exemplars.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(ExemplarId, f32)> = if state.exemplars.len() <= EXACT_SCAN_LIMIT {
            state
                .embeddings
                .iter()
                .map(|(id, embedding)| (*id, cosine_similarity(&query, embedding)))
                .collect()
        } else {
            let candidates = state.vectors.search(&query, limit * 4, EF_SEARCH)?;
            candidates
                .into_iter()
                .filter_map(|(id, _)| {
                    state
                        .embeddings
                        .get(&id)
                        .map(|embedding| (id, cosine_similarity(&query, embedding)))
                })
                .collect()
        };

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        Ok(scored
            .into_iter()
            .filter(|(_, score)| self.min_similarity.map_or(true, |min| *score >= min))
            .take(limit)
            .filter_map(|(id, score)| state.exemplars.get(&id).map(|e| (e.clone(), score)))
            .collect())
    }

    /// Look up an exemplar by id
    pub fn get(&self, id: ExemplarId) -> Result<Option<Exemplar>, StoreError> {
        Ok(self.read_state()?.exemplars.get(&id).cloned())
    }

    /// Number of stored exemplars
    pub fn len(&self) -> usize {
        self.state
            .read()
            .map(|state| state.exemplars.len())
            .unwrap_or(0)
    }

    /// Whether the index holds no exemplars
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn publish(&self, exemplar: Exemplar) -> Result<(), StoreError> {
        let embedding = self.model.embed(&exemplar.rule_text)?;
        let mut state = self.write_state()?;
        Self::insert(&mut state, exemplar, embedding)
    }

    fn insert(
        state: &mut IndexState,
        exemplar: Exemplar,
        embedding: Vec<f32>,
    ) -> Result<(), StoreError> {
        state.vectors.add(exemplar.id, &embedding)?;
        state.embeddings.insert(exemplar.id, embedding);
        state.exemplars.insert(exemplar.id, exemplar);
        Ok(())
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, IndexState>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Unavailable("index lock poisoned".to_string()))
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, IndexState>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Unavailable("index lock poisoned".to_string()))
    }
}

impl<M: EmbeddingModel> ExampleIndex for ExemplarIndex<M> {
    type Error = StoreError;

    fn query(&self, rule_text: &str, k: usize) -> Result<Vec<Exemplar>, Self::Error> {
        let hits = self.search(rule_text, k.min(MAX_QUERY_K))?;
        Ok(hits.into_iter().map(|(exemplar, _)| exemplar).collect())
    }

    fn add(&self, exemplar: Exemplar) -> Result<(), Self::Error> {
        self.append(exemplar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbeddingModel;

    fn index() -> ExemplarIndex<HashingEmbeddingModel> {
        ExemplarIndex::new(HashingEmbeddingModel::new(128))
    }

    #[test]
    fn test_query_empty_index_returns_empty() {
        let index = index();
        assert!(index.query("if size is large then assign 10", 3).unwrap().is_empty());
    }

    #[test]
    fn test_query_orders_by_similarity() {
        let index = index();
        index
            .add(Exemplar::new("if order total exceeds 100 then apply discount", "{}"))
            .unwrap();
        index
            .add(Exemplar::new("if restaurant size is small then assign 5 employees", "{}"))
            .unwrap();

        let hits = index
            .query("if restaurant size is large then assign 10 employees", 2)
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].rule_text.contains("restaurant"));
    }

    #[test]
    fn test_query_k_is_capped() {
        let index = index();
        for i in 0..8 {
            index
                .add(Exemplar::new(format!("if size is {} then assign {}", i, i), "{}"))
                .unwrap();
        }
        assert_eq!(index.query("size assign", 50).unwrap().len(), MAX_QUERY_K);
        assert_eq!(index.search("size assign", 50).unwrap().len(), 8);
    }

    #[test]
    fn test_min_similarity_filters() {
        let index = index().with_min_similarity(0.99);
        index.add(Exemplar::new("restaurant size small", "{}")).unwrap();
        assert!(index.query("oven temperature alarm", 3).unwrap().is_empty());
        assert_eq!(index.query("restaurant size small", 3).unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_exemplar_rejected() {
        let index = index();
        let exemplar = Exemplar::new("rule", "{}");
        index.add(exemplar.clone()).unwrap();
        assert!(matches!(index.add(exemplar), Err(StoreError::InvalidData(_))));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_unembeddable_text_is_rejected_without_partial_write() {
        let index = index();
        assert!(index.add(Exemplar::new("!!!", "{}")).is_err());
        assert!(index.is_empty());
    }

    /// Claims one dimension, embeds into another
    struct MisreportingModel;

    impl EmbeddingModel for MisreportingModel {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, crate::embedding::EmbeddingError> {
            Ok(vec![0.5; 4])
        }

        fn dimension(&self) -> usize {
            8
        }
    }

    #[test]
    fn test_rejected_vector_never_reaches_journal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exemplars.db");

        let index = ExemplarIndex::persistent(MisreportingModel, &path).unwrap();
        let result = index.append(Exemplar::new("if size is large then assign 10", "{}"));
        assert!(matches!(result, Err(StoreError::VectorIndex(_))));
        assert!(index.is_empty());
        drop(index);

        assert_eq!(ExemplarJournal::open(&path).unwrap().count().unwrap(), 0);
        let reopened = ExemplarIndex::persistent(HashingEmbeddingModel::new(128), &path).unwrap();
        assert!(reopened.is_empty());
    }

    #[test]
    fn test_get_by_id() {
        let index = index();
        let exemplar = Exemplar::new("rule text", "{\"a\":1}");
        let id = exemplar.id;
        index.add(exemplar.clone()).unwrap();
        assert_eq!(index.get(id).unwrap(), Some(exemplar));
        assert_eq!(index.get(ExemplarId::from_value(7)).unwrap(), None);
    }
}
