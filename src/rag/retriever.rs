//! Query → embedding → nearest neighbors → chunk texts.

use super::ContextChunk;
use crate::corpus::Corpus;
use crate::embedding::Embedder;
use crate::error::{RagchatError, Result};
use crate::vector_index::{QueryMatch, VectorIndex};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default number of context chunks per query.
pub const DEFAULT_TOP_K: usize = 5;

/// Maps a raw query to the most relevant corpus chunks.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    corpus: Arc<Corpus>,
    top_k: usize,
    query_timeout: Duration,
}

impl Retriever {
    /// Create a new retriever.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        corpus: Arc<Corpus>,
    ) -> Self {
        Self {
            embedder,
            index,
            corpus,
            top_k: DEFAULT_TOP_K,
            query_timeout: Duration::from_secs(15),
        }
    }

    /// Set the number of chunks used for each turn.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the deadline for a single index query.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Retrieve up to `k` chunk texts, most similar first.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>> {
        Ok(self
            .retrieve_scored(query, k)
            .await?
            .into_iter()
            .map(|c| c.text)
            .collect())
    }

    /// Retrieve up to `k` chunks with their ids and scores, most similar first.
    ///
    /// Fails as a whole if any step fails; no partial context is returned.
    #[instrument(skip(self, query), fields(k))]
    pub async fn retrieve_scored(&self, query: &str, k: usize) -> Result<Vec<ContextChunk>> {
        if k == 0 {
            return Err(RagchatError::InvalidInput(
                "k must be a positive integer".to_string(),
            ));
        }

        if self.corpus.is_empty() {
            warn!("Corpus is empty, answering without context");
            return Ok(Vec::new());
        }

        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| RagchatError::Retrieval(format!("Query embedding failed: {}", e)))?;

        let matches = tokio::time::timeout(self.query_timeout, self.index.query(&query_embedding, k))
            .await
            .map_err(|_| {
                RagchatError::Retrieval(format!(
                    "Vector index query timed out after {:?}",
                    self.query_timeout
                ))
            })?
            .map_err(|e| RagchatError::Retrieval(format!("Vector index query failed: {}", e)))?;

        debug!("Index returned {} matches", matches.len());
        resolve_matches(&self.corpus, matches)
    }
}

/// Map index matches back to corpus chunks, keeping the index order.
///
/// Any id that is not a valid corpus position means the index and corpus are
/// out of sync and fails the whole lookup.
pub fn resolve_matches(corpus: &Corpus, matches: Vec<QueryMatch>) -> Result<Vec<ContextChunk>> {
    matches
        .into_iter()
        .map(|m| {
            let id: usize = m.id.parse().map_err(|_| {
                RagchatError::Retrieval(format!("Index returned non-numeric id {:?}", m.id))
            })?;
            let chunk = corpus.get(id).ok_or_else(|| {
                RagchatError::Retrieval(format!(
                    "Index returned id {} but the corpus has {} chunks; index and corpus are out of sync",
                    id,
                    corpus.len()
                ))
            })?;
            Ok(ContextChunk {
                id,
                text: chunk.text.clone(),
                score: m.score,
            })
        })
        .collect()
}
