//! Service wiring for ragchat.
//!
//! Builds every process-wide service once (corpus, embedder, vector index,
//! language model), bootstraps the index and hands out chat sessions that
//! share them.

use crate::config::{IndexProvider, Prompts, Settings};
use crate::corpus::Corpus;
use crate::embedding::{Embedder, LocalEmbedder};
use crate::error::Result;
use crate::llm::{LanguageModel, LocalLlm};
use crate::rag::{AnswerGenerator, PromptBuilder, RagPipeline, Retriever};
use crate::session::ChatSession;
use crate::vector_index::{IndexSpec, IndexStatus, MemoryVectorIndex, PineconeIndex, VectorIndex};
use std::sync::Arc;
use tracing::{info, instrument};

/// Owns the shared, read-only services of the running process.
pub struct Orchestrator {
    settings: Settings,
    corpus: Arc<Corpus>,
    pipeline: Arc<RagPipeline>,
    index_status: IndexStatus,
}

impl Orchestrator {
    /// Build all services from settings and bootstrap the vector index.
    pub async fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;
        let corpus = Arc::new(Corpus::load_or_empty(&settings.corpus_path()));

        let embedder: Arc<dyn Embedder> =
            Arc::new(LocalEmbedder::from_settings(&settings.embedding)?);

        let index: Arc<dyn VectorIndex> = match settings.vector_index.provider {
            IndexProvider::Pinecone => {
                info!("Using Pinecone index {}", settings.vector_index.index_name);
                Arc::new(PineconeIndex::from_settings(&settings.vector_index)?)
            }
            IndexProvider::Memory => {
                info!("Using in-memory index");
                let index = MemoryVectorIndex::new();
                populate_memory_index(&index, embedder.as_ref(), &corpus).await?;
                Arc::new(index)
            }
        };

        let model: Arc<dyn LanguageModel> = Arc::new(LocalLlm::from_settings(&settings.generation)?);

        Self::with_components(settings, prompts, corpus, embedder, index, model).await
    }

    /// Build the pipeline from explicit components.
    pub async fn with_components(
        settings: Settings,
        prompts: Prompts,
        corpus: Arc<Corpus>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        model: Arc<dyn LanguageModel>,
    ) -> Result<Self> {
        let spec = IndexSpec::from_settings(&settings.vector_index);
        let index_status = index.ensure_index(&spec).await?;

        let retriever = Retriever::new(embedder, index, corpus.clone())
            .with_top_k(settings.retrieval.top_k)
            .with_query_timeout(settings.index_timeout());
        let generator = AnswerGenerator::from_settings(model, &settings.generation);
        let pipeline = Arc::new(RagPipeline::new(
            retriever,
            PromptBuilder::new(prompts.rag),
            generator,
        ));

        Ok(Self {
            settings,
            corpus,
            pipeline,
            index_status,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Whether the bootstrap created the index or found it.
    pub fn index_status(&self) -> IndexStatus {
        self.index_status
    }

    pub fn pipeline(&self) -> Arc<RagPipeline> {
        self.pipeline.clone()
    }

    /// Start a new chat session backed by the shared pipeline.
    pub fn new_session(&self) -> ChatSession {
        ChatSession::new(self.pipeline.clone(), &self.settings.general.greeting)
    }
}

/// Embed every corpus chunk into the in-memory index, keyed by position.
#[instrument(skip_all, fields(chunks = corpus.len()))]
async fn populate_memory_index(
    index: &MemoryVectorIndex,
    embedder: &dyn Embedder,
    corpus: &Corpus,
) -> Result<()> {
    if corpus.is_empty() {
        return Ok(());
    }

    let texts: Vec<String> = corpus.chunks().iter().map(|c| c.text.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;

    for (chunk, embedding) in corpus.chunks().iter().zip(embeddings) {
        index.upsert(chunk.id.to_string(), embedding)?;
    }

    info!("Indexed {} chunks in memory", index.vector_count());
    Ok(())
}
