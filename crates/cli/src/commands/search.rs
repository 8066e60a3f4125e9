//! Search command handler: retrieval without completion.

use crate::output::{format_results, print_json};
use crate::runtime::Runtime;
use clap::Args;
use cropwise_core::{config::AppConfig, AppResult};
use cropwise_knowledge::source_refs;

/// Show the passages most similar to a query
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Query text
    pub query: String,

    /// Number of passages to return (default: retrieval.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");

        let runtime = Runtime::open(config).await?;
        let k = self.top_k.unwrap_or(config.retrieval.top_k);
        let result = runtime.retrieval().retrieve(&self.query, k).await?;

        if self.json {
            print_json(&serde_json::json!({
                "query": self.query,
                "origin": runtime.index().origin().map(|o| o.as_str()),
                "results": source_refs(&result),
            }))?;
        } else if result.is_empty() {
            println!("No passages found.");
        } else {
            println!("{}", format_results(&result));
        }

        Ok(())
    }
}
