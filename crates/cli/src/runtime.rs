//! Wiring from configuration to the knowledge services.

use cropwise_core::{config::AppConfig, AppResult};
use cropwise_knowledge::{
    create_provider, open_index, Assistant, AssistantSettings, DenylistPolicy, EmbeddingConfig,
    EmbeddingProvider, IndexOptions, RetrievalService, SharedIndex,
};
use cropwise_llm::create_client;
use cropwise_prompt::{load_prompt, ANSWER_PROMPT_ID};
use std::sync::Arc;

/// Embedder plus the published index.
pub struct Runtime {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<SharedIndex>,
}

impl Runtime {
    /// Create the embedder and open the index snapshot.
    pub async fn open(config: &AppConfig) -> AppResult<Self> {
        let embedder = create_embedder(config).await?;
        let (index, origin) =
            open_index(&IndexOptions::from_config(config), embedder.as_ref()).await?;

        Ok(Self {
            embedder,
            index: Arc::new(SharedIndex::with_index(Arc::new(index), origin)),
        })
    }

    /// Create the embedder only; retrieval will fail until an index is published.
    pub async fn without_index(config: &AppConfig) -> AppResult<Self> {
        Ok(Self {
            embedder: create_embedder(config).await?,
            index: Arc::new(SharedIndex::new()),
        })
    }

    pub fn index(&self) -> &Arc<SharedIndex> {
        &self.index
    }

    pub fn retrieval(&self) -> RetrievalService {
        RetrievalService::new(Arc::clone(&self.embedder), Arc::clone(&self.index))
    }

    /// Build the assistant with the configured policy, prompt and completion client.
    pub fn assistant(&self, config: &AppConfig) -> AppResult<Assistant> {
        config.validate()?;

        let api_key = config.resolve_api_key(&config.provider);
        let endpoint = config.provider_endpoint();
        let llm = create_client(
            &config.provider,
            endpoint.as_deref(),
            api_key.as_deref(),
            config.retrieval.completion_timeout_secs,
        )?;

        let prompt = load_prompt(&config.workspace, ANSWER_PROMPT_ID)?;
        tracing::debug!("Loaded prompt definition: {}", prompt.id);

        Ok(Assistant::new(
            Arc::new(DenylistPolicy::from_config(&config.policy)),
            self.retrieval(),
            llm,
            prompt,
            AssistantSettings::from_config(config),
        ))
    }
}

async fn create_embedder(config: &AppConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    create_provider(&EmbeddingConfig::from(&config.embedding)).await
}
