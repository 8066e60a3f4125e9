//! Ask command handler.

use crate::output::{format_outcome, outcome_json};
use crate::runtime::Runtime;
use clap::Args;
use cropwise_core::{config::AppConfig, AppError, AppResult};
use cropwise_knowledge::{screen, AskMode, DenylistPolicy};

/// Ask a question about a crop process
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Number of passages to retrieve (default: retrieval.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Ask the model directly, without retrieval
    #[arg(long)]
    pub direct: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    ///
    /// A failed completion is reported alongside the retrieved sources and
    /// does not fail the command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        println!("{}", self.render(config).await?);
        Ok(())
    }

    async fn render(&self, config: &AppConfig) -> AppResult<String> {
        let question = self.question.trim();
        if question.is_empty() {
            return Err(AppError::Config("No question provided".to_string()));
        }

        let mode = if self.direct {
            AskMode::Direct
        } else {
            AskMode::Retrieval
        };

        // Restricted questions never reach the embedder, index or model
        let policy = DenylistPolicy::from_config(&config.policy);
        let outcome = match screen(&policy, question) {
            Some(restricted) => restricted,
            None => {
                let runtime = match mode {
                    AskMode::Retrieval => Runtime::open(config).await?,
                    AskMode::Direct => Runtime::without_index(config).await?,
                };
                let assistant = runtime.assistant(config)?;
                let k = self.top_k.unwrap_or(assistant.settings().top_k);
                assistant.ask_with_k(question, k, mode).await?
            }
        };

        if self.json {
            Ok(serde_json::to_string_pretty(&outcome_json(
                question, mode, &outcome,
            )?)?)
        } else {
            Ok(format_outcome(&outcome))
        }
    }
}
