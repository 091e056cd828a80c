//! Test doubles for the service traits.

use crate::embedding::Embedder;
use crate::error::{RagchatError, Result};
use crate::llm::{Completion, CompletionRequest, LanguageModel};
use crate::vector_index::{IndexSpec, IndexStatus, QueryMatch, VectorIndex};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Returns the same unit-ish vector for every text.
pub struct FixedEmbedder {
    dimensions: usize,
}

impl FixedEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0; self.dimensions])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0; self.dimensions]).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Embedder whose model server is down.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagchatError::Embedding("connection refused".to_string()))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(RagchatError::Embedding("connection refused".to_string()))
    }

    fn dimensions(&self) -> usize {
        3
    }
}

/// Index that answers every query with a fixed list of matches.
pub struct ScriptedIndex {
    matches: Vec<QueryMatch>,
}

impl ScriptedIndex {
    pub fn new(matches: Vec<(&str, f32)>) -> Self {
        Self {
            matches: matches
                .into_iter()
                .map(|(id, score)| QueryMatch {
                    id: id.to_string(),
                    score,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl VectorIndex for ScriptedIndex {
    async fn ensure_index(&self, _spec: &IndexSpec) -> Result<IndexStatus> {
        Ok(IndexStatus::Existing)
    }

    async fn query(&self, _vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>> {
        Ok(self.matches.iter().take(top_k).cloned().collect())
    }
}

/// Index whose queries always fail as if the service were down.
pub struct FailingIndex;

#[async_trait]
impl VectorIndex for FailingIndex {
    async fn ensure_index(&self, _spec: &IndexSpec) -> Result<IndexStatus> {
        Err(RagchatError::VectorIndex("service unreachable".to_string()))
    }

    async fn query(&self, _vector: &[f32], _top_k: usize) -> Result<Vec<QueryMatch>> {
        Err(RagchatError::VectorIndex("service unreachable".to_string()))
    }
}

/// Index that sleeps before answering with no matches.
pub struct SlowIndex(pub Duration);

#[async_trait]
impl VectorIndex for SlowIndex {
    async fn ensure_index(&self, _spec: &IndexSpec) -> Result<IndexStatus> {
        Ok(IndexStatus::Existing)
    }

    async fn query(&self, _vector: &[f32], _top_k: usize) -> Result<Vec<QueryMatch>> {
        tokio::time::sleep(self.0).await;
        Ok(Vec::new())
    }
}

/// Model that returns a canned completion and records the last request.
pub struct ScriptedModel {
    completion: Completion,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn raw(text: &str) -> Self {
        Self {
            completion: Completion::Raw(text.to_string()),
            last_request: Mutex::new(None),
        }
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        *self.last_request.lock().unwrap() = Some(request.clone());
        Ok(self.completion.clone())
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Model that always fails.
pub struct FailingModel;

#[async_trait]
impl LanguageModel for FailingModel {
    async fn complete(&self, _request: &CompletionRequest) -> Result<Completion> {
        Err(RagchatError::Generation("model crashed".to_string()))
    }

    fn model(&self) -> &str {
        "failing"
    }
}

/// Model that sleeps before answering.
pub struct SlowModel(pub Duration);

#[async_trait]
impl LanguageModel for SlowModel {
    async fn complete(&self, _request: &CompletionRequest) -> Result<Completion> {
        tokio::time::sleep(self.0).await;
        Ok(Completion::Raw("late answer".to_string()))
    }

    fn model(&self) -> &str {
        "slow"
    }
}
