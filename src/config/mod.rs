//! Configuration module for ragchat.
//!
//! Handles loading application settings and the prompt template.

mod prompts;
mod settings;

pub use prompts::{FewShotExample, Prompts, RagPrompts};
pub use settings::{
    EmbeddingSettings, GeneralSettings, GenerationSettings, IndexProvider, PromptSettings,
    RetrievalSettings, ServerSettings, Settings, VectorIndexSettings, PINECONE_API_KEY_ENV,
};
