//! Language model boundary.

mod local;

pub use local::LocalLlm;

use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// A single generation request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub stop: Vec<String>,
}

/// What the model returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The model produced a labeled answer field.
    Structured { answer: String },
    /// Free text, possibly echoing the prompt.
    Raw(String),
}

#[derive(Deserialize)]
struct StructuredAnswer {
    #[serde(alias = "response")]
    answer: String,
}

impl Completion {
    /// Classify model output: a JSON object with an `answer` (or `response`)
    /// string is structured, anything else is raw text.
    pub fn from_text(text: String) -> Self {
        let trimmed = text.trim_start();
        if trimmed.starts_with('{') {
            if let Ok(parsed) = serde_json::from_str::<StructuredAnswer>(trimmed) {
                return Completion::Structured {
                    answer: parsed.answer,
                };
            }
        }
        Completion::Raw(text)
    }
}

/// Trait for text generation backends.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for a fully rendered prompt.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;

    /// Model identifier, for logs.
    fn model(&self) -> &str;
}
