//! RAG API service
//!
//! Main entry point for the `rag-api` binary. Serves the HTTP API and
//! provides offline seeding and one-shot questions from the command line.

mod commands;
mod http;

use clap::{Parser, Subcommand};
use commands::{AskCommand, SeedCommand, ServeCommand};
use rag_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Answer questions from a small knowledge base, falling back to the model
#[derive(Parser, Debug)]
#[command(name = "rag-api")]
#[command(about = "Retrieval-augmented question answering service", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file (default: ./rag.yaml if present)
    #[arg(short, long, global = true, env = "RAG_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the document store
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Completion provider (openai, ollama)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Completion model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve(ServeCommand),

    /// Store a text file as the seed document
    Seed(SeedCommand),

    /// Answer one question and exit
    Ask(AskCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?.with_overrides(
        cli.data_dir,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("rag-api starting");
    tracing::debug!("Config file: {:?}", config.config_file);
    tracing::debug!("Data dir: {:?}", config.data_dir);
    tracing::debug!("Provider: {} / model: {}", config.provider, config.model);

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Seed(_) => "seed",
        Commands::Ask(_) => "ask",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Serve(cmd) => cmd.execute(&config).await,
        Commands::Seed(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
    };

    if let Err(e) = &result {
        tracing::error!("Command failed: {}", e);
    }

    result
}
