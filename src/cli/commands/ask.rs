//! Ask command implementation.

use super::start;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, top_k: Option<usize>, mut settings: Settings) -> Result<()> {
    if let Some(k) = top_k {
        settings.retrieval.top_k = k;
    }

    let orchestrator = start(Operation::Answer, settings).await?;
    let pipeline = orchestrator.pipeline();

    let spinner = Output::spinner("Generating response...");
    let result = pipeline.ask(question).await;
    spinner.finish_and_clear();

    match result {
        Ok(response) => {
            println!("\n{}\n", response.answer);

            if !response.sources.is_empty() {
                Output::header("Sources");
                for (rank, source) in response.sources.iter().enumerate() {
                    Output::search_result(rank + 1, source.id, source.score, &source.text);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
