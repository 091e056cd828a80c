//! Interactive terminal chat.

use super::start;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(settings: Settings) -> Result<()> {
    let title = settings.general.title.clone();
    let orchestrator = start(Operation::Answer, settings).await?;
    let mut session = orchestrator.new_session();

    println!("\n{}", style(&title).bold().cyan());
    println!(
        "{}\n",
        style("Type your questions, or 'exit' to quit. Use 'clear' to reset the conversation.").dim()
    );
    println!("{} {}\n", style("Assistant:").cyan().bold(), orchestrator.settings().general.greeting);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            session.clear();
            Output::info("Conversation history cleared.");
            continue;
        }

        let spinner = Output::spinner("Generating response...");
        let result = session.submit(input).await;
        spinner.finish_and_clear();

        match result {
            Ok(response) => {
                println!("\n{} {}\n", style("Assistant:").cyan().bold(), response);
            }
            Err(e) => {
                Output::error(&format!("An error occurred: {}", e));
            }
        }
    }

    Ok(())
}
