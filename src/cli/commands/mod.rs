//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod search;
mod serve;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use search::run_search;
pub use serve::{router, run_serve, AppState};

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;

/// Run pre-flight checks and build the shared services.
async fn start(operation: Operation, settings: Settings) -> crate::error::Result<Orchestrator> {
    if let Err(e) = preflight::check(operation, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'ragchat doctor' for detailed diagnostics.");
        return Err(e);
    }

    let spinner = Output::spinner("Connecting to vector index...");
    let orchestrator = Orchestrator::new(settings).await;
    spinner.finish_and_clear();
    orchestrator
}
