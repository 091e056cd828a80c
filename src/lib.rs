//! ragchat - Retrieval-Augmented Chat
//!
//! A small chat assistant that answers questions from a pre-chunked text
//! corpus. Each user message is embedded, matched against a vector index,
//! mapped back to corpus chunks, stitched into a few-shot prompt and answered
//! by a locally hosted language model.
//!
//! # Architecture
//!
//! - `config` - Settings and the prompt template
//! - `corpus` - Loading the chunk corpus (id → text)
//! - `embedding` - Embedding generation
//! - `vector_index` - Vector index bootstrap and nearest-neighbor queries
//! - `llm` - Local language model boundary
//! - `rag` - Retriever, prompt builder and answer generator
//! - `session` - Chat session history and turn handling
//! - `orchestrator` - Service construction
//! - `cli` - Command line and web chat surface
//!
//! # Example
//!
//! ```rust,no_run
//! use ragchat::config::Settings;
//! use ragchat::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings).await?;
//!
//!     let mut session = orchestrator.new_session();
//!     let reply = session.submit("What are the safety guidelines for Machine 23?").await?;
//!     println!("{}", reply);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod session;
pub mod vector_index;

#[cfg(test)]
mod testing;

pub use error::{RagchatError, Result};
