//! In-memory vector index implementation.
//!
//! Useful for testing and for running without a hosted index.

use super::{cosine_similarity, IndexSpec, IndexStatus, QueryMatch, VectorIndex};
use crate::error::{RagchatError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory cosine index.
pub struct MemoryVectorIndex {
    indexes: RwLock<HashMap<String, IndexSpec>>,
    vectors: RwLock<HashMap<String, Vec<f32>>>,
}

impl MemoryVectorIndex {
    /// Create a new, empty in-memory index service.
    pub fn new() -> Self {
        Self {
            indexes: RwLock::new(HashMap::new()),
            vectors: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace a vector.
    pub fn upsert(&self, id: impl Into<String>, vector: Vec<f32>) -> Result<()> {
        let mut vectors = self
            .vectors
            .write()
            .map_err(|_| RagchatError::VectorIndex("Index lock poisoned".to_string()))?;
        vectors.insert(id.into(), vector);
        Ok(())
    }

    /// Number of indexes created so far.
    pub fn index_count(&self) -> usize {
        self.indexes.read().map(|i| i.len()).unwrap_or(0)
    }

    /// Number of stored vectors.
    pub fn vector_count(&self) -> usize {
        self.vectors.read().map(|v| v.len()).unwrap_or(0)
    }
}

impl Default for MemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn ensure_index(&self, spec: &IndexSpec) -> Result<IndexStatus> {
        let mut indexes = self
            .indexes
            .write()
            .map_err(|_| RagchatError::VectorIndex("Index lock poisoned".to_string()))?;

        if indexes.contains_key(&spec.name) {
            return Ok(IndexStatus::Existing);
        }
        indexes.insert(spec.name.clone(), spec.clone());
        Ok(IndexStatus::Created)
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>> {
        let vectors = self
            .vectors
            .read()
            .map_err(|_| RagchatError::VectorIndex("Index lock poisoned".to_string()))?;

        let mut matches: Vec<QueryMatch> = vectors
            .iter()
            .map(|(id, stored)| QueryMatch {
                id: id.clone(),
                score: cosine_similarity(vector, stored),
            })
            .collect();

        // Ties broken by id for a stable order
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        matches.truncate(top_k);

        Ok(matches)
    }
}
