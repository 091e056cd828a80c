//! Pre-flight checks before building services.
//!
//! Validates configuration and credentials up front so a missing key fails
//! with a clear message instead of a network error midway.

use crate::config::{IndexProvider, Settings};
use crate::error::{RagchatError, Result};
use tracing::warn;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Answering questions needs the index, the embedder and the model.
    Answer,
    /// Retrieval alone needs the index and the embedder.
    Search,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    settings.validate()?;

    if settings.vector_index.provider == IndexProvider::Pinecone {
        Settings::pinecone_api_key()?;
    }

    if !settings.corpus_path().exists() {
        warn!(
            "Corpus file {} not found; answers will have no context",
            settings.corpus_path().display()
        );
    }

    check_url("embedding.base_url", &settings.embedding.base_url)?;
    match operation {
        Operation::Answer => check_url("generation.base_url", &settings.generation.base_url)?,
        Operation::Search => {}
    }
    Ok(())
}

/// Check that a configured endpoint is a valid URL.
fn check_url(key: &str, value: &str) -> Result<()> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| RagchatError::Configuration(format!("{} is not a valid URL ({}): {}", key, value, e)))
}
