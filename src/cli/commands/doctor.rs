//! Doctor command - verify configuration and service reachability.

use crate::cli::Output;
use crate::config::{IndexProvider, Settings, PINECONE_API_KEY_ENV};
use crate::corpus::Corpus;
use console::style;
use std::path::PathBuf;
use std::time::Duration;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(config_path: Option<&PathBuf>, settings: &Settings) -> anyhow::Result<()> {
    Output::header("ragchat Doctor");
    println!();
    println!("Checking configuration and services...\n");

    let mut checks = Vec::new();

    println!("{}", style("Configuration").bold());
    let section = vec![check_config_file(config_path), check_settings(settings)];
    print_all(&section);
    checks.extend(section);
    println!();

    println!("{}", style("Vector Index").bold());
    let section = vec![check_api_key(settings)];
    print_all(&section);
    checks.extend(section);
    println!();

    println!("{}", style("Corpus").bold());
    let section = vec![check_corpus(settings)];
    print_all(&section);
    checks.extend(section);
    println!();

    println!("{}", style("Model Server").bold());
    let section = vec![
        check_endpoint("Embedding endpoint", &settings.embedding.base_url, &settings.embedding.model).await,
        check_endpoint("Generation endpoint", &settings.generation.base_url, &settings.generation.model).await,
    ];
    print_all(&section);
    checks.extend(section);
    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using ragchat.",
            errors
        ));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! ragchat is ready to use.");
    }

    Ok(())
}

fn print_all(checks: &[CheckResult]) {
    for check in checks {
        check.print();
    }
}

fn check_config_file(config_path: Option<&PathBuf>) -> CheckResult {
    let path = config_path
        .cloned()
        .unwrap_or_else(Settings::default_config_path);
    if path.exists() {
        CheckResult::ok("Config file", &format!("{}", path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            &format!("Create {} to override settings", path.display()),
        )
    }
}

fn check_settings(settings: &Settings) -> CheckResult {
    match settings.validate() {
        Ok(()) => CheckResult::ok("Settings", "valid"),
        Err(e) => CheckResult::error("Settings", &e.to_string(), "Fix the value in your config file"),
    }
}

fn check_api_key(settings: &Settings) -> CheckResult {
    if settings.vector_index.provider == IndexProvider::Memory {
        return CheckResult::ok("Provider", "memory (no API key needed)");
    }

    match Settings::pinecone_api_key() {
        Ok(key) => CheckResult::ok(PINECONE_API_KEY_ENV, &format!("configured ({})", mask(&key))),
        Err(e) => CheckResult::error(
            PINECONE_API_KEY_ENV,
            &e.to_string(),
            &format!("Set with: export {}='...' or add it to .env", PINECONE_API_KEY_ENV),
        ),
    }
}

fn check_corpus(settings: &Settings) -> CheckResult {
    let path = settings.corpus_path();
    match Corpus::load(&path) {
        Ok(corpus) if corpus.is_empty() => CheckResult::warning(
            "Corpus",
            &format!("{} is empty", path.display()),
            "Answers will have no context",
        ),
        Ok(corpus) => CheckResult::ok(
            "Corpus",
            &format!("{} ({} chunks)", path.display(), corpus.len()),
        ),
        Err(e) => CheckResult::warning(
            "Corpus",
            &e.to_string(),
            "The app will start with an empty corpus",
        ),
    }
}

/// Query the `/models` listing of an OpenAI-compatible server.
async fn check_endpoint(name: &str, base_url: &str, model: &str) -> CheckResult {
    let client = match reqwest::Client::builder().timeout(Duration::from_secs(5)).build() {
        Ok(c) => c,
        Err(e) => return CheckResult::error(name, &e.to_string(), "Check TLS setup"),
    };
    let url = format!("{}/models", base_url.trim_end_matches('/'));

    match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => {
            let body = response.text().await.unwrap_or_default();
            if body.contains(model) {
                CheckResult::ok(name, &format!("{} serves {}", base_url, model))
            } else {
                CheckResult::warning(
                    name,
                    &format!("{} is up but does not list {}", base_url, model),
                    &format!("Pull the model, e.g. ollama pull {}", model),
                )
            }
        }
        Ok(response) => CheckResult::warning(
            name,
            &format!("{} answered {}", base_url, response.status()),
            "The server may not expose /models",
        ),
        Err(e) => CheckResult::error(
            name,
            &format!("{} unreachable: {}", base_url, e),
            "Start the local model server (e.g. ollama serve)",
        ),
    }
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
