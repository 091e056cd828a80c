//! Search command implementation.

use super::start;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, top_k: Option<usize>, settings: Settings) -> Result<()> {
    let k = top_k.unwrap_or(settings.retrieval.top_k);
    let orchestrator = start(Operation::Search, settings).await?;

    let spinner = Output::spinner("Searching...");
    let results = orchestrator
        .pipeline()
        .retriever()
        .retrieve_scored(query, k)
        .await;
    spinner.finish_and_clear();

    match results {
        Ok(chunks) => {
            if chunks.is_empty() {
                Output::warning("No context found for your query.");
            } else {
                Output::success(&format!("Found {} chunks", chunks.len()));

                for (rank, chunk) in chunks.iter().enumerate() {
                    Output::search_result(rank + 1, chunk.id, chunk.score, &chunk.text);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
