//! Locally hosted model behind an OpenAI-compatible `/completions` endpoint.

use super::{Completion, CompletionRequest, LanguageModel};
use crate::config::GenerationSettings;
use crate::error::{RagchatError, Result};
use crate::openai::create_client;
use async_openai::types::{CreateCompletionRequestArgs, Stop};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Text-completion client for a local model server (e.g. Ollama).
pub struct LocalLlm {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl LocalLlm {
    /// Create a client from settings.
    pub fn from_settings(settings: &GenerationSettings) -> Result<Self> {
        Self::with_config(
            &settings.base_url,
            &settings.model,
            Duration::from_secs(settings.timeout_seconds),
        )
    }

    pub fn with_config(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client(base_url, timeout)?,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl LanguageModel for LocalLlm {
    #[instrument(skip(self, request), fields(model = %self.model, max_tokens = request.max_tokens))]
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let mut args = CreateCompletionRequestArgs::default();
        args.model(&self.model)
            .prompt(request.prompt.as_str())
            .max_tokens(request.max_tokens);
        if !request.stop.is_empty() {
            args.stop(Stop::StringArray(request.stop.clone()));
        }
        let api_request = args
            .build()
            .map_err(|e| RagchatError::Generation(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .completions()
            .create(api_request)
            .await
            .map_err(|e| RagchatError::Generation(format!("Completion API error: {}", e)))?;

        let text = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| RagchatError::Generation("Empty response from model".to_string()))?;

        debug!("Model returned {} characters", text.len());
        Ok(Completion::from_text(text))
    }

    fn model(&self) -> &str {
        &self.model
    }
}
