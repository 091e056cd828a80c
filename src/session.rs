//! Chat session: conversation history and per-turn pipeline driving.
//!
//! Each submission runs one full turn (retrieve, render, generate) before the
//! next one is accepted. A failed turn is shown as an error entry and never
//! ends the session.

use crate::error::{RagchatError, Result};
use crate::rag::RagPipeline;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry of the model-facing history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl ConversationTurn {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            at: Utc::now(),
        }
    }
}

/// One entry of the user-facing message log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayEntry {
    Message { role: Role, content: String },
    Error { message: String },
}

/// Where the session is within a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    AwaitingInput,
    Processing,
}

/// A single conversation, owned by whoever hosts the chat surface.
pub struct ChatSession {
    pipeline: Arc<RagPipeline>,
    greeting: String,
    history: Vec<ConversationTurn>,
    display: Vec<DisplayEntry>,
    state: TurnState,
}

impl ChatSession {
    /// Start a session that opens with `greeting` from the assistant.
    pub fn new(pipeline: Arc<RagPipeline>, greeting: &str) -> Self {
        let mut session = Self {
            pipeline,
            greeting: greeting.to_string(),
            history: Vec::new(),
            display: Vec::new(),
            state: TurnState::AwaitingInput,
        };
        session.reset();
        session
    }

    fn reset(&mut self) {
        self.history.clear();
        self.display.clear();
        if !self.greeting.is_empty() {
            self.history
                .push(ConversationTurn::new(Role::Assistant, self.greeting.clone()));
            self.display.push(DisplayEntry::Message {
                role: Role::Assistant,
                content: self.greeting.clone(),
            });
        }
    }

    /// Drop the conversation and start over from the greeting.
    pub fn clear(&mut self) {
        self.reset();
        self.state = TurnState::AwaitingInput;
    }

    /// Run one turn for the raw user text and return the assistant reply.
    ///
    /// On failure the error is recorded in the message log and returned; the
    /// history is not rolled back. If retrieval fails no user turn is stored
    /// (the prompt could not be built); if generation fails the
    /// context-expanded user turn stays without an assistant reply. Dropping
    /// the future mid-turn records a cancellation error the same way.
    pub async fn submit(&mut self, input: &str) -> Result<String> {
        let input = input.trim();
        if input.is_empty() {
            return Err(RagchatError::InvalidInput("Message is empty".to_string()));
        }

        self.state = TurnState::Processing;
        self.display.push(DisplayEntry::Message {
            role: Role::User,
            content: input.to_string(),
        });

        let mut turn = TurnGuard {
            session: self,
            finished: false,
        };
        let result = turn.session.run_turn(input).await;
        turn.finished = true;
        let session = &mut *turn.session;
        session.state = TurnState::AwaitingInput;

        match result {
            Ok(answer) => {
                info!("Turn completed ({} turns in history)", session.history.len());
                Ok(answer)
            }
            Err(e) => {
                error!(error.kind = e.kind(), "Turn failed: {}", e);
                session.display.push(DisplayEntry::Error {
                    message: format!("An error occurred: {}", e),
                });
                Err(e)
            }
        }
    }

    async fn run_turn(&mut self, input: &str) -> Result<String> {
        let contextual = self.pipeline.contextualize(input).await?;
        self.history
            .push(ConversationTurn::new(Role::User, contextual.prompt.clone()));

        let answer = self.pipeline.generate(&contextual.prompt).await?;
        self.history
            .push(ConversationTurn::new(Role::Assistant, answer.clone()));
        self.display.push(DisplayEntry::Message {
            role: Role::Assistant,
            content: answer.clone(),
        });

        Ok(answer)
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn display(&self) -> &[DisplayEntry] {
        &self.display
    }

    pub fn state(&self) -> TurnState {
        self.state
    }
}

/// Closes a turn whose future was dropped before it finished.
struct TurnGuard<'a> {
    session: &'a mut ChatSession,
    finished: bool,
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!("Turn cancelled before it finished");
        self.session.state = TurnState::AwaitingInput;
        self.session.display.push(DisplayEntry::Error {
            message: "An error occurred: the request was cancelled before an answer was generated"
                .to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Corpus;
    use crate::llm::LanguageModel;
    use crate::rag::{AnswerGenerator, PromptBuilder, Retriever};
    use crate::testing::{
        FailingIndex, FailingModel, FixedEmbedder, ScriptedIndex, ScriptedModel, SlowModel,
    };
    use std::time::Duration;
    use crate::vector_index::VectorIndex;

    fn session(index: Arc<dyn VectorIndex>, model: Arc<dyn LanguageModel>) -> ChatSession {
        let corpus = Arc::new(Corpus::from_texts(["Water boils at 100C at sea level."]));
        let retriever = Retriever::new(Arc::new(FixedEmbedder::new(4)), index, corpus);
        let pipeline = RagPipeline::new(
            retriever,
            PromptBuilder::default(),
            AnswerGenerator::new(model),
        );
        ChatSession::new(Arc::new(pipeline), "How can I help you?")
    }

    fn assistant_turns(session: &ChatSession) -> usize {
        session
            .history()
            .iter()
            .filter(|t| t.role == Role::Assistant)
            .count()
    }

    #[tokio::test]
    async fn test_successful_turn_appends_pair() {
        let mut session = session(
            Arc::new(ScriptedIndex::new(vec![("0", 0.95)])),
            Arc::new(ScriptedModel::raw("100 degrees Celsius.")),
        );

        let reply = session.submit("What temperature does water boil?").await.unwrap();
        assert_eq!(reply, "100 degrees Celsius.");

        let history = session.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[1].role, Role::User);
        // History keeps the context-expanded prompt, not the raw text
        assert!(history[1].content.contains("- Water boils at 100C at sea level."));
        assert_eq!(history[2].content, "100 degrees Celsius.");

        assert_eq!(
            session.display()[1],
            DisplayEntry::Message {
                role: Role::User,
                content: "What temperature does water boil?".to_string()
            }
        );
        assert_eq!(session.state(), TurnState::AwaitingInput);
    }

    #[tokio::test]
    async fn test_index_failure_records_error_and_keeps_session() {
        let mut session = session(
            Arc::new(FailingIndex),
            Arc::new(ScriptedModel::raw("unused")),
        );
        let before = assistant_turns(&session);

        let err = session.submit("What temperature does water boil?").await.unwrap_err();
        assert_eq!(err.kind(), "retrieval");
        assert_eq!(assistant_turns(&session), before);
        assert_eq!(session.history().len(), 1);
        assert!(matches!(
            session.display().last(),
            Some(DisplayEntry::Error { message }) if message.starts_with("An error occurred")
        ));

        // The session keeps accepting input
        assert_eq!(session.state(), TurnState::AwaitingInput);
        assert!(session.submit("again").await.is_err());
    }

    #[tokio::test]
    async fn test_generation_failure_leaves_unpaired_user_turn() {
        let mut session = session(
            Arc::new(ScriptedIndex::new(vec![("0", 0.95)])),
            Arc::new(FailingModel),
        );

        let err = session.submit("question").await.unwrap_err();
        assert_eq!(err.kind(), "generation");
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[1].role, Role::User);
        assert_eq!(assistant_turns(&session), 1);
    }

    #[tokio::test]
    async fn test_cancelled_turn_returns_to_awaiting_input() {
        let mut session = session(
            Arc::new(ScriptedIndex::new(vec![("0", 0.95)])),
            Arc::new(SlowModel(Duration::from_secs(5))),
        );

        let outcome = tokio::time::timeout(Duration::from_millis(100), session.submit("q")).await;
        assert!(outcome.is_err());

        assert_eq!(session.state(), TurnState::AwaitingInput);
        assert!(matches!(
            session.display().last(),
            Some(DisplayEntry::Error { message }) if message.contains("cancelled")
        ));
        // The expanded user turn stays unpaired, as with any generation failure
        assert_eq!(session.history().len(), 2);
        assert_eq!(assistant_turns(&session), 1);
    }

    #[tokio::test]
    async fn test_clear_restores_greeting() {
        let mut session = session(
            Arc::new(ScriptedIndex::new(vec![("0", 0.95)])),
            Arc::new(ScriptedModel::raw("ok")),
        );
        session.submit("hi").await.unwrap();
        session.clear();

        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].content, "How can I help you?");
        assert_eq!(session.display().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let mut session = session(
            Arc::new(ScriptedIndex::new(vec![])),
            Arc::new(ScriptedModel::raw("ok")),
        );
        assert!(session.submit("   ").await.is_err());
        assert_eq!(session.display().len(), 1);
    }
}
