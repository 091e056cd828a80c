//! Answer generation from a rendered prompt.

use super::prompt::ANSWER_CUE;
use crate::config::GenerationSettings;
use crate::error::{RagchatError, Result};
use crate::llm::{Completion, CompletionRequest, LanguageModel};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Wraps a language model with a token budget, stop sequences and a deadline.
pub struct AnswerGenerator {
    model: Arc<dyn LanguageModel>,
    max_tokens: u32,
    stop: Vec<String>,
    timeout: Duration,
}

impl AnswerGenerator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        let defaults = GenerationSettings::default();
        Self {
            model,
            max_tokens: defaults.max_tokens,
            stop: defaults.stop,
            timeout: Duration::from_secs(defaults.timeout_seconds),
        }
    }

    pub fn from_settings(model: Arc<dyn LanguageModel>, settings: &GenerationSettings) -> Self {
        Self {
            model,
            max_tokens: settings.max_tokens,
            stop: settings.stop.clone(),
            timeout: Duration::from_secs(settings.timeout_seconds),
        }
    }

    /// Override the deadline for one completion.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Generate an answer for a fully rendered prompt.
    #[instrument(skip(self, prompt), fields(model = %self.model.model(), prompt_len = prompt.len()))]
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let request = CompletionRequest {
            prompt: prompt.to_string(),
            max_tokens: self.max_tokens,
            stop: self.stop.clone(),
        };

        let completion = tokio::time::timeout(self.timeout, self.model.complete(&request))
            .await
            .map_err(|_| {
                RagchatError::Generation(format!("Model timed out after {:?}", self.timeout))
            })?
            .map_err(|e| match e {
                RagchatError::Generation(_) => e,
                other => RagchatError::Generation(other.to_string()),
            })?;

        let answer = extract_answer(completion);
        if answer.is_empty() {
            return Err(RagchatError::Generation(
                "Model returned an empty answer".to_string(),
            ));
        }

        debug!("Generated answer with {} characters", answer.len());
        Ok(answer)
    }
}

/// Pull the answer text out of a completion.
///
/// Structured output is used as-is. Raw text is normally bounded by the stop
/// sequences already; if the model echoed the prompt, the text after the last
/// `Answer:` cue is taken instead.
pub fn extract_answer(completion: Completion) -> String {
    match completion {
        Completion::Structured { answer } => answer.trim().to_string(),
        Completion::Raw(text) => match text.rfind(ANSWER_CUE) {
            Some(pos) => text[pos + ANSWER_CUE.len()..].trim().to_string(),
            None => text.trim().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingModel, ScriptedModel, SlowModel};

    #[test]
    fn test_extract_structured() {
        let completion = Completion::Structured {
            answer: "  Wear PPE. ".to_string(),
        };
        assert_eq!(extract_answer(completion), "Wear PPE.");
    }

    #[test]
    fn test_extract_echoed_prompt() {
        let raw = "Example 1:\nAnswer: not this\nUser query: q\nAnswer:  Water boils at 100C.\n";
        assert_eq!(
            extract_answer(Completion::Raw(raw.to_string())),
            "Water boils at 100C."
        );
    }

    #[test]
    fn test_extract_plain_continuation() {
        assert_eq!(
            extract_answer(Completion::Raw(" It boils at 100C. ".to_string())),
            "It boils at 100C."
        );
    }

    #[tokio::test]
    async fn test_generate_sends_budget_and_stop_sequences() {
        let model = Arc::new(ScriptedModel::raw(" The answer."));
        let generator = AnswerGenerator::new(model.clone());

        assert_eq!(generator.generate("prompt\nAnswer:").await.unwrap(), "The answer.");

        let request = model.last_request().unwrap();
        assert_eq!(request.max_tokens, 140);
        assert_eq!(request.prompt, "prompt\nAnswer:");
        assert!(request.stop.contains(&"\nUser query:".to_string()));
    }

    #[tokio::test]
    async fn test_empty_answer_is_error() {
        let generator = AnswerGenerator::new(Arc::new(ScriptedModel::raw("Answer:   ")));
        let err = generator.generate("p").await.unwrap_err();
        assert_eq!(err.kind(), "generation");
    }

    #[tokio::test]
    async fn test_model_failure_is_generation_error() {
        let generator = AnswerGenerator::new(Arc::new(FailingModel));
        let err = generator.generate("p").await.unwrap_err();
        assert_eq!(err.kind(), "generation");
    }

    #[tokio::test]
    async fn test_slow_model_times_out() {
        let generator = AnswerGenerator::new(Arc::new(SlowModel(Duration::from_secs(5))))
            .with_timeout(Duration::from_millis(20));
        let err = generator.generate("p").await.unwrap_err();
        assert_eq!(err.kind(), "generation");
        assert!(err.to_string().contains("timed out"));
    }
}
