//! Vector index abstraction for ragchat.
//!
//! Provides a trait-based interface over the nearest-neighbor service. The
//! index is populated out of band; this crate only ensures it exists and
//! queries it.

mod memory;
mod pinecone;

pub use memory::MemoryVectorIndex;
pub use pinecone::PineconeIndex;

use crate::config::VectorIndexSettings;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Shape of the index the application expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: String,
    pub cloud: String,
    pub region: String,
}

impl IndexSpec {
    pub fn from_settings(settings: &VectorIndexSettings) -> Self {
        Self {
            name: settings.index_name.clone(),
            dimension: settings.dimension as usize,
            metric: settings.metric.clone(),
            cloud: settings.cloud.clone(),
            region: settings.region.clone(),
        }
    }
}

/// Outcome of the create-if-absent bootstrap step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    /// The index was created by this call.
    Created,
    /// The index already existed (possibly created concurrently by another process).
    Existing,
}

/// One nearest-neighbor match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    /// String-encoded corpus position.
    pub id: String,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Trait for vector index implementations.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create the index if it does not exist. Safe to call repeatedly.
    async fn ensure_index(&self, spec: &IndexSpec) -> Result<IndexStatus>;

    /// Return up to `top_k` matches ordered by descending similarity.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
