use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod app;
mod client;
mod config;
mod events;
mod ui;

use client::AnswerClient;
use config::Config;

#[derive(Parser)]
#[command(name = "immogpt")]
#[command(version = "0.1.0")]
#[command(about = "Terminal chat client for the ImmoGPT real-estate answer service", long_about = None)]
struct Cli {
    /// Override the answer service endpoint, e.g. http://127.0.0.1:8000
    #[arg(long)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        /// Your question
        question: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }

    init_logging(&config)?;

    match cli.command {
        Some(Commands::Ask { question }) => {
            let client = AnswerClient::new(&config.endpoint);
            let payload = client.ask(&question).await?;
            println!("{}", client::payload_text(&payload));
            Ok(())
        }
        None => app::run(config).await,
    }
}

/// Route tracing output to a log file so nothing draws over the TUI
fn init_logging(config: &Config) -> Result<()> {
    let path = config.immogpt_home.join("immogpt.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file at {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("immogpt=info")),
        )
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}
