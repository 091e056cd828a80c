//! Configuration settings for ragchat.

use crate::error::{RagchatError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the vector index API key.
pub const PINECONE_API_KEY_ENV: &str = "PINECONE_API_KEY";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub embedding: EmbeddingSettings,
    pub vector_index: VectorIndexSettings,
    pub retrieval: RetrievalSettings,
    pub generation: GenerationSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Path to the pre-chunked corpus (JSON array of `sentence_chunk` objects).
    pub corpus_path: String,
    /// Title shown in the chat widget.
    pub title: String,
    /// First assistant message of every session.
    pub greeting: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            corpus_path: "sources_and_chunks.json".to_string(),
            title: "MSE Chatbot".to_string(),
            greeting: "How can I help you?".to_string(),
        }
    }
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Base URL of the OpenAI-compatible embedding endpoint.
    pub base_url: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions produced by the model.
    pub dimensions: u32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            timeout_seconds: 30,
        }
    }
}

/// Vector index provider type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum IndexProvider {
    /// Pinecone serverless index (default).
    #[default]
    Pinecone,
    /// In-process index populated from the corpus at startup.
    Memory,
}

impl std::str::FromStr for IndexProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pinecone" => Ok(IndexProvider::Pinecone),
            "memory" => Ok(IndexProvider::Memory),
            _ => Err(format!("Unknown vector index provider: {}", s)),
        }
    }
}

impl std::fmt::Display for IndexProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexProvider::Pinecone => write!(f, "pinecone"),
            IndexProvider::Memory => write!(f, "memory"),
        }
    }
}

/// Vector index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorIndexSettings {
    /// Vector index provider (pinecone, memory).
    pub provider: IndexProvider,
    /// Index name.
    pub index_name: String,
    /// Vector dimensionality of the index.
    pub dimension: u32,
    /// Similarity metric.
    pub metric: String,
    /// Serverless cloud.
    pub cloud: String,
    /// Serverless region.
    pub region: String,
    /// Control plane URL.
    pub control_url: String,
    /// Value of the `X-Pinecone-API-Version` header.
    pub api_version: String,
    /// Timeout for control plane and query requests, in seconds.
    pub timeout_seconds: u64,
    /// How many times to poll a freshly created index before giving up.
    pub ready_poll_attempts: u32,
    /// Delay between readiness polls, in milliseconds.
    pub ready_poll_interval_ms: u64,
}

impl Default for VectorIndexSettings {
    fn default() -> Self {
        Self {
            provider: IndexProvider::Pinecone,
            index_name: "rag-pipeline-sources".to_string(),
            dimension: 768,
            metric: "cosine".to_string(),
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            control_url: "https://api.pinecone.io".to_string(),
            api_version: "2024-07".to_string(),
            timeout_seconds: 15,
            ready_poll_attempts: 30,
            ready_poll_interval_ms: 2000,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of nearest neighbors fetched per query.
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Base URL of the OpenAI-compatible completion endpoint.
    pub base_url: String,
    /// Local model to use.
    pub model: String,
    /// Maximum number of generated tokens.
    pub max_tokens: u32,
    /// Sequences that stop generation.
    pub stop: Vec<String>,
    /// Generation timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            model: "llama3.2:3b".to_string(),
            max_tokens: 140,
            stop: vec!["\nUser query:".to_string(), "\nQuery:".to_string()],
            timeout_seconds: 120,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory containing a `rag.toml` that overrides the default template.
    pub custom_dir: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else if path.is_some() {
            Err(RagchatError::Configuration(format!(
                "Config file not found: {}",
                config_path.display()
            )))
        } else {
            Ok(Settings::default())
        }
    }

    /// Serialize settings as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| RagchatError::Configuration(e.to_string()))
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ragchat")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded corpus path.
    pub fn corpus_path(&self) -> PathBuf {
        Self::expand_path(&self.general.corpus_path)
    }

    /// Read the vector index API key from the environment.
    ///
    /// Fails with a configuration error when the key is absent or empty.
    pub fn pinecone_api_key() -> Result<String> {
        match std::env::var(PINECONE_API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            Ok(_) => Err(RagchatError::Configuration(format!(
                "{} is empty. Set it in the environment or a .env file.",
                PINECONE_API_KEY_ENV
            ))),
            Err(_) => Err(RagchatError::Configuration(format!(
                "{} not set. Set it in the environment or a .env file.",
                PINECONE_API_KEY_ENV
            ))),
        }
    }

    /// Check settings for values that would only fail later at runtime.
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(RagchatError::Configuration(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }
        if self.embedding.dimensions != self.vector_index.dimension {
            return Err(RagchatError::Configuration(format!(
                "embedding.dimensions ({}) does not match vector_index.dimension ({})",
                self.embedding.dimensions, self.vector_index.dimension
            )));
        }
        if self.generation.max_tokens == 0 {
            return Err(RagchatError::Configuration(
                "generation.max_tokens must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn index_timeout(&self) -> Duration {
        Duration::from_secs(self.vector_index.timeout_seconds)
    }
}
