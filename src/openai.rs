//! Client construction for the OpenAI-compatible local model server.

use crate::error::{RagchatError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// API key sent to local servers that ignore authentication.
const PLACEHOLDER_API_KEY: &str = "local";

/// Create a client for an OpenAI-compatible endpoint with the given request timeout.
///
/// `OPENAI_API_KEY` is used when set, so the same code can talk to a hosted
/// endpoint; local servers such as Ollama accept any key.
pub fn create_client(api_base: &str, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RagchatError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

    let api_key = std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| PLACEHOLDER_API_KEY.to_string());

    let config = OpenAIConfig::new()
        .with_api_base(api_base.trim_end_matches('/'))
        .with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}
