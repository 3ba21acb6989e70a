//! Notebook CLI
//!
//! Main entry point for the notebook command-line tool.
//! Ingests local documents and answers questions over them with cited,
//! optionally web-enriched responses.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{
    AnalyzeCommand, AskCommand, IngestCommand, RemoveCommand, StatusCommand, WebCommand,
};
use notebook_core::{config::AppConfig, logging};
use std::path::PathBuf;

/// Notebook - question answering over your own documents
#[derive(Parser, Debug)]
#[command(name = "notebook")]
#[command(about = "Local document question answering with citations", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "NOTEBOOK_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "NOTEBOOK_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Model and embedding backend (ollama, mock)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Generation model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index documents (files or directories)
    Ingest(IngestCommand),

    /// Remove a document's chunks from the index
    Remove(RemoveCommand),

    /// Ask a question about the indexed documents
    Ask(AskCommand),

    /// Generate an FAQ, key topics or a mind map for one document
    Analyze(AnalyzeCommand),

    /// Run a raw web search
    Web(WebCommand),

    /// Show index and service status
    Status(StatusCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load_with(cli.workspace, cli.config)
        .context("Failed to load configuration")?
        .with_overrides(
            cli.provider,
            cli.model,
            cli.log_level,
            cli.verbose,
            cli.no_color,
            cli.log_json,
        );

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json)?;

    tracing::info!("Notebook CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.validate()?;
    config.ensure_notebook_dir()?;

    let command_name = match &cli.command {
        Commands::Ingest(_) => "ingest",
        Commands::Remove(_) => "remove",
        Commands::Ask(_) => "ask",
        Commands::Analyze(_) => "analyze",
        Commands::Web(_) => "web",
        Commands::Status(_) => "status",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Remove(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Analyze(cmd) => cmd.execute(&config).await,
        Commands::Web(cmd) => cmd.execute(&config).await,
        Commands::Status(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {:#}", e),
    }

    result
}
