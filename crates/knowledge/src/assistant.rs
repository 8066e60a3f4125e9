//! Question answering: policy gate, retrieval, prompt, completion.

use crate::policy::{Classification, QueryPolicy};
use crate::retrieval::{build_context, RetrievalService};
use crate::types::QueryResult;
use cropwise_core::{AppConfig, AppError, AppResult};
use cropwise_llm::{LlmClient, LlmRequest};
use cropwise_prompt::{build_prompt, BuiltPrompt, PromptDefinition};
use std::sync::Arc;
use std::time::Duration;

/// Base delay between completion retries
const RETRY_BACKOFF_MS: u64 = 500;

/// How a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AskMode {
    /// Retrieve passages and ground the answer in them
    #[default]
    Retrieval,
    /// Send the question to the model without retrieval
    Direct,
}

/// Result of one question-answer exchange.
#[derive(Debug)]
pub enum AskOutcome {
    /// The policy refused the question; nothing else ran.
    Restricted { message: String },

    /// Retrieval ran; the completion may still have failed.
    Answered {
        documents: QueryResult,
        answer: Result<String, AppError>,
    },
}

/// Apply the policy gate alone.
///
/// Returns the restricted outcome for a refused question and `None` when the
/// question may proceed. Needs no embedder, index or completion client.
pub fn screen(policy: &dyn QueryPolicy, question: &str) -> Option<AskOutcome> {
    if policy.classify(question) == Classification::Restricted {
        tracing::info!("Question restricted by policy");
        return Some(AskOutcome::Restricted {
            message: policy.advisory_message().to_string(),
        });
    }
    None
}

/// Completion settings for the assistant.
#[derive(Debug, Clone)]
pub struct AssistantSettings {
    pub model: String,
    pub top_k: usize,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub completion_timeout_secs: u64,

    /// Extra attempts after a recoverable completion failure
    pub max_retries: u32,
}

impl AssistantSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            top_k: config.retrieval.top_k,
            temperature: config.temperature(),
            max_tokens: None,
            completion_timeout_secs: config.retrieval.completion_timeout_secs,
            max_retries: config.retrieval.max_retries,
        }
    }
}

/// Answers questions about crop processes.
pub struct Assistant {
    policy: Arc<dyn QueryPolicy>,
    retrieval: RetrievalService,
    llm: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    settings: AssistantSettings,
}

impl Assistant {
    pub fn new(
        policy: Arc<dyn QueryPolicy>,
        retrieval: RetrievalService,
        llm: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        settings: AssistantSettings,
    ) -> Self {
        Self {
            policy,
            retrieval,
            llm,
            prompt,
            settings,
        }
    }

    pub fn settings(&self) -> &AssistantSettings {
        &self.settings
    }

    /// Answer with the configured `top_k`.
    pub async fn ask(&self, question: &str, mode: AskMode) -> AppResult<AskOutcome> {
        self.ask_with_k(question, self.settings.top_k, mode).await
    }

    /// Answer a question.
    ///
    /// Restricted questions return the advisory message without embedding,
    /// retrieval or completion. Retrieval failures are returned as `Err`;
    /// prompt and completion failures are carried inside
    /// `AskOutcome::Answered` so the retrieved documents remain usable.
    pub async fn ask_with_k(
        &self,
        question: &str,
        k: usize,
        mode: AskMode,
    ) -> AppResult<AskOutcome> {
        if let Some(restricted) = screen(self.policy.as_ref(), question) {
            return Ok(restricted);
        }

        let documents = match mode {
            AskMode::Retrieval => self.retrieval.retrieve(question, k).await?,
            AskMode::Direct => Vec::new(),
        };

        let context = build_context(&documents);
        let answer = match build_prompt(&self.prompt, question, Some(&context)) {
            Ok(built) => self.complete(&built).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &answer {
            tracing::warn!("Answer generation failed: {}", e);
        }

        Ok(AskOutcome::Answered { documents, answer })
    }

    fn request(&self, built: &BuiltPrompt) -> LlmRequest {
        let temperature = self
            .prompt
            .behavior
            .temperature
            .unwrap_or(self.settings.temperature);

        let mut request = LlmRequest::new(built.user.clone(), self.settings.model.clone())
            .with_temperature(temperature);

        if let Some(system) = &built.system {
            request = request.with_system(system.clone());
        }
        if let Some(max_tokens) = self.prompt.behavior.max_tokens.or(self.settings.max_tokens) {
            request = request.with_max_tokens(max_tokens);
        }
        request
    }

    async fn complete(&self, built: &BuiltPrompt) -> Result<String, AppError> {
        let request = self.request(built);
        let secs = self.settings.completion_timeout_secs;
        let mut attempt = 0u32;

        loop {
            tracing::debug!(
                "Completion attempt {} via {} ({} prompt bytes)",
                attempt + 1,
                self.llm.provider_name(),
                request.prompt.len()
            );

            let result =
                match tokio::time::timeout(Duration::from_secs(secs), self.llm.complete(&request))
                    .await
                {
                    Ok(result) => result.map(|response| response.content),
                    Err(_) => Err(AppError::LlmTimeout { secs }),
                };

            match result {
                Err(e) if e.is_recoverable() && attempt < self.settings.max_retries => {
                    attempt += 1;
                    let backoff = RETRY_BACKOFF_MS * 2_u64.pow(attempt - 1);
                    tracing::warn!(
                        "Completion failed ({}); retry {}/{} in {}ms",
                        e,
                        attempt,
                        self.settings.max_retries,
                        backoff
                    );
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                other => return other,
            }
        }
    }
}
