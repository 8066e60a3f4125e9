//! Cropwise CLI
//!
//! Educational question answering about crop growth stages and post-harvest
//! processes, grounded in a curated knowledge base.

mod chat_log;
mod commands;
mod output;
mod runtime;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, IndexCommand, SearchCommand};
use cropwise_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Cropwise - agricultural education assistant
#[derive(Parser, Debug)]
#[command(name = "cropwise")]
#[command(about = "Explain crop processes from a curated knowledge base", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "CROPWISE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "CROPWISE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Completion provider (openrouter, openai, ollama)
    #[arg(short, long, global = true, env = "CROPWISE_PROVIDER")]
    provider: Option<String>,

    /// Completion model identifier
    #[arg(short, long, global = true, env = "CROPWISE_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question about a crop process
    Ask(AskCommand),

    /// Show the passages most similar to a query
    Search(SearchCommand),

    /// Build or inspect the index snapshot
    Index(IndexCommand),

    /// Interactive question loop
    Chat(ChatCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(cli.workspace, cli.config)?.with_overrides(
        None,
        None,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Cropwise starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}, model: {}", config.provider, config.model);

    config.ensure_cropwise_dir()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Search(_) => "search",
        Commands::Index(_) => "index",
        Commands::Chat(_) => "chat",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Index(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
