//! Test doubles shared across modules.

use crate::bootstrap::build_index;
use crate::corpus::KnowledgeBase;
use crate::embeddings::providers::TrigramProvider;
use crate::embeddings::EmbeddingProvider;
use crate::shared::SharedIndex;
use crate::types::IndexOrigin;
use cropwise_core::{AppError, AppResult};
use cropwise_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Build `kb` with `embedder` and publish it.
pub(crate) async fn build_shared(
    kb: &KnowledgeBase,
    embedder: &dyn EmbeddingProvider,
) -> Arc<SharedIndex> {
    let index = build_index(kb, embedder).await.unwrap();
    Arc::new(SharedIndex::with_index(Arc::new(index), IndexOrigin::Built))
}

/// Trigram embedder that counts calls.
#[derive(Debug)]
pub(crate) struct CountingEmbedder {
    inner: TrigramProvider,
    calls: AtomicUsize,
}

impl CountingEmbedder {
    pub(crate) fn new() -> Self {
        Self {
            inner: TrigramProvider::new(384, 8192),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for CountingEmbedder {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(texts.len(), Ordering::SeqCst);
        self.inner.embed_batch(texts).await
    }
}

type ErrorFactory = Box<dyn Fn() -> AppError + Send + Sync>;

/// Completion client with scripted behaviour.
pub(crate) struct ScriptedLlm {
    answer: String,
    fail_first: usize,
    error: ErrorFactory,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_request: Mutex<Option<LlmRequest>>,
}

impl ScriptedLlm {
    pub(crate) fn answering(answer: &str) -> Self {
        Self::failing_then_answering(0, answer)
    }

    /// Fails every call with the given error.
    pub(crate) fn failing(error: impl Fn() -> AppError + Send + Sync + 'static) -> Self {
        Self {
            fail_first: usize::MAX,
            error: Box::new(error),
            ..Self::answering("")
        }
    }

    /// Fails the first `n` calls with a remote error, then answers.
    pub(crate) fn failing_then_answering(n: usize, answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            fail_first: n,
            error: Box::new(|| AppError::LlmRemote("503 Service Unavailable".to_string())),
            delay: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> Option<LlmRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if call < self.fail_first {
            return Err((self.error)());
        }

        Ok(LlmResponse {
            content: self.answer.clone(),
            model: request.model.clone(),
            usage: LlmUsage::new(10, 5),
        })
    }
}
