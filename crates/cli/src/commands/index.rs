//! Index command handler: build and inspect the snapshot.

use crate::output::print_json;
use clap::{Args, Subcommand};
use cropwise_core::{config::AppConfig, AppResult};
use cropwise_knowledge::{
    create_provider, read_snapshot_info, rebuild_snapshot, EmbeddingConfig, IndexOptions,
};
use std::path::PathBuf;

/// Build or inspect the index snapshot
#[derive(Args, Debug)]
pub struct IndexCommand {
    #[command(subcommand)]
    pub action: IndexAction,
}

#[derive(Subcommand, Debug)]
pub enum IndexAction {
    /// Embed the corpus and write a fresh snapshot
    Build(IndexBuildCommand),
    /// Show snapshot metadata
    Info(IndexInfoCommand),
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            IndexAction::Build(cmd) => cmd.execute(config).await,
            IndexAction::Info(cmd) => cmd.execute(config),
        }
    }
}

/// Embed the corpus and write a fresh snapshot
#[derive(Args, Debug)]
pub struct IndexBuildCommand {
    /// Corpus file (JSON or YAML) instead of the configured one
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexBuildCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing index build command");

        let mut options = IndexOptions::from_config(config);
        if let Some(corpus) = &self.corpus {
            options.corpus_path = Some(corpus.clone());
        }

        let embedder = create_provider(&EmbeddingConfig::from(&config.embedding)).await?;
        let (_, info) = rebuild_snapshot(&options, embedder.as_ref()).await?;

        if self.json {
            print_json(&serde_json::json!({
                "snapshot": options.snapshot_path,
                "info": info,
            }))?;
        } else {
            println!(
                "Indexed {} documents with {} into {}",
                info.entry_count,
                info.embedder,
                options.snapshot_path.display()
            );
        }

        Ok(())
    }
}

/// Show snapshot metadata
#[derive(Args, Debug)]
pub struct IndexInfoCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexInfoCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let path = config.snapshot_path();
        let info = read_snapshot_info(&path)?;

        if self.json {
            print_json(&info)?;
        } else {
            println!("Snapshot:  {}", path.display());
            println!("Format:    v{}", info.format_version);
            println!("Embedder:  {}", info.embedder);
            println!("Documents: {}", info.entry_count);
            println!("Corpus:    {}", &info.corpus_fingerprint);
            println!("Created:   {}", info.created_at.to_rfc3339());
        }

        Ok(())
    }
}
