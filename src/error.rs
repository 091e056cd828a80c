//! Error types for ragchat.

use thiserror::Error;

/// Library-level error type for ragchat operations.
#[derive(Error, Debug)]
pub enum RagchatError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Corpus load failed: {0}")]
    CorpusLoad(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    VectorIndex(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl RagchatError {
    /// Stable label for the error category, used in log fields and API payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            RagchatError::Configuration(_) => "configuration",
            RagchatError::CorpusLoad(_) => "corpus_load",
            RagchatError::Retrieval(_) => "retrieval",
            RagchatError::Generation(_) => "generation",
            RagchatError::Embedding(_) => "embedding",
            RagchatError::VectorIndex(_) => "vector_index",
            RagchatError::InvalidInput(_) => "invalid_input",
            RagchatError::Io(_) => "io",
            RagchatError::Json(_) => "json",
            RagchatError::TomlParse(_) => "toml",
            RagchatError::Http(_) => "http",
        }
    }
}

/// Result type alias for ragchat operations.
pub type Result<T> = std::result::Result<T, RagchatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_labels() {
        assert_eq!(RagchatError::Retrieval("x".into()).kind(), "retrieval");
        assert_eq!(RagchatError::Generation("x".into()).kind(), "generation");
        assert_eq!(
            RagchatError::Configuration("missing key".into()).to_string(),
            "Configuration error: missing key"
        );
    }
}
