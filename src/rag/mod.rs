//! RAG (Retrieval-Augmented Generation) pipeline.
//!
//! A query is embedded, matched against the vector index, mapped back to
//! corpus chunks, rendered into the prompt template and handed to the local
//! language model.

mod generator;
pub mod prompt;
mod retriever;

pub use generator::{extract_answer, AnswerGenerator};
pub use prompt::{format_context, PromptBuilder, ANSWER_CUE};
pub use retriever::{resolve_matches, Retriever, DEFAULT_TOP_K};

use crate::error::Result;
use serde::Serialize;
use tracing::{info, instrument};

/// A retrieved chunk with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextChunk {
    /// Corpus position.
    pub id: usize,
    /// Chunk text.
    pub text: String,
    /// Similarity score reported by the index.
    pub score: f32,
}

/// A prompt together with the chunks it was built from.
#[derive(Debug, Clone)]
pub struct ContextualPrompt {
    pub prompt: String,
    pub sources: Vec<ContextChunk>,
}

/// Retriever, prompt builder and generator wired together.
pub struct RagPipeline {
    retriever: Retriever,
    prompt_builder: PromptBuilder,
    generator: AnswerGenerator,
}

impl RagPipeline {
    pub fn new(
        retriever: Retriever,
        prompt_builder: PromptBuilder,
        generator: AnswerGenerator,
    ) -> Self {
        Self {
            retriever,
            prompt_builder,
            generator,
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Retrieve context for `query` and render the full prompt.
    #[instrument(skip(self, query))]
    pub async fn contextualize(&self, query: &str) -> Result<ContextualPrompt> {
        let sources = self
            .retriever
            .retrieve_scored(query, self.retriever.top_k())
            .await?;
        let texts: Vec<String> = sources.iter().map(|c| c.text.clone()).collect();
        let prompt = self.prompt_builder.build_prompt(query, &texts);
        info!("Built prompt with {} context items", sources.len());
        Ok(ContextualPrompt { prompt, sources })
    }

    /// Generate an answer for an already rendered prompt.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        self.generator.generate(prompt).await
    }

    /// Run the whole pipeline for one question.
    pub async fn ask(&self, query: &str) -> Result<RagResponse> {
        let contextual = self.contextualize(query).await?;
        let answer = self.generate(&contextual.prompt).await?;
        Ok(RagResponse {
            answer,
            sources: contextual.sources,
        })
    }
}

/// A RAG response with answer and sources.
#[derive(Debug, Clone, Serialize)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Chunks the answer was grounded on, most similar first.
    pub sources: Vec<ContextChunk>,
}
