//! Interactive chat loop.

use crate::chat_log::{read_log, ChatLog, Role};
use crate::output::format_outcome;
use crate::runtime::Runtime;
use clap::Args;
use cropwise_core::{config::AppConfig, AppResult};
use cropwise_knowledge::{screen, AskMode, AskOutcome, Assistant, DenylistPolicy};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const CHAT_LOG_FILE: &str = "chat.jsonl";

/// Interactive question loop
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Answer without retrieval
    #[arg(long)]
    pub direct: bool,

    /// Keep the conversation in memory only
    #[arg(long)]
    pub no_log: bool,

    /// Print the saved conversation and exit
    #[arg(long, conflicts_with = "no_log")]
    pub history: bool,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let log_path = config.cropwise_dir().join(CHAT_LOG_FILE);

        if self.history {
            if log_path.exists() {
                for entry in read_log(&log_path)? {
                    let who = match entry.role {
                        Role::User => "you",
                        Role::Assistant => "cropwise",
                    };
                    println!("[{}] {}: {}", entry.at.format("%Y-%m-%d %H:%M"), who, entry.content);
                }
            }
            return Ok(());
        }

        let mode = if self.direct {
            AskMode::Direct
        } else {
            AskMode::Retrieval
        };
        let policy = DenylistPolicy::from_config(&config.policy);

        let mut log = if self.no_log {
            ChatLog::in_memory()
        } else {
            ChatLog::with_file(&log_path)?
        };

        // Opened on the first question that passes the policy
        let mut assistant: Option<Assistant> = None;

        println!("Ask about crop growth stages or post-harvest processes. Empty line or Ctrl-D quits.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        loop {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let question = line.trim();
            if question.is_empty() {
                break;
            }

            log.append(Role::User, question)?;

            let reply = match screen(&policy, question) {
                Some(restricted) => format_outcome(&restricted),
                None => {
                    if assistant.is_none() {
                        assistant = Some(open_assistant(config, mode).await?);
                    }
                    match assistant.as_ref() {
                        Some(assistant) => answer(assistant, question, mode).await,
                        None => continue,
                    }
                }
            };

            println!("{}\n", reply);
            log.append(Role::Assistant, reply)?;
        }

        tracing::info!("Chat ended after {} entries", log.entries().len());
        Ok(())
    }
}

async fn open_assistant(config: &AppConfig, mode: AskMode) -> AppResult<Assistant> {
    let runtime = match mode {
        AskMode::Retrieval => Runtime::open(config).await?,
        AskMode::Direct => Runtime::without_index(config).await?,
    };
    if let Some(origin) = runtime.index().origin() {
        tracing::info!("Chat session using {} index", origin.as_str());
    }
    runtime.assistant(config)
}

async fn answer(assistant: &Assistant, question: &str, mode: AskMode) -> String {
    match assistant.ask(question, mode).await {
        Ok(outcome) => {
            if let AskOutcome::Answered { answer: Err(e), .. } = &outcome {
                tracing::warn!("Answer unavailable: {}", e);
            }
            format_outcome(&outcome)
        }
        Err(e) => {
            tracing::error!("Question failed: {}", e);
            e.user_message()
        }
    }
}
