//! Query-time retrieval over the shared index.

use crate::embeddings::{ensure_compatible, EmbeddingProvider};
use crate::shared::SharedIndex;
use crate::types::{QueryResult, ScoredDocument};
use cropwise_core::AppResult;
use std::sync::Arc;

/// Separator between passages in a completion context.
pub const CONTEXT_DELIMITER: &str = "\n\n";

/// Embeds questions and queries the active index.
///
/// Read-only: any number of `retrieve` calls may run concurrently.
#[derive(Debug, Clone)]
pub struct RetrievalService {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<SharedIndex>,
}

impl RetrievalService {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<SharedIndex>) -> Self {
        Self { embedder, index }
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    pub fn index(&self) -> &Arc<SharedIndex> {
        &self.index
    }

    /// Return the `k` passages most similar to `query`.
    ///
    /// Fails with `IncompatibleIndex` when the active index was built by a
    /// different embedder than the one this service uses.
    pub async fn retrieve(&self, query: &str, k: usize) -> AppResult<QueryResult> {
        let index = self.index.current()?;
        ensure_compatible(index.embedder(), &self.embedder.fingerprint())?;

        let vector = self.embedder.embed(query).await?;
        let result = index.query(&vector, k)?;

        tracing::info!(
            "Retrieved {} passages for query ({} chars){}",
            result.len(),
            query.chars().count(),
            result
                .first()
                .map(|top| format!(", top score {:.3}", top.score))
                .unwrap_or_default()
        );

        Ok(result)
    }
}

/// Join passage contents in result order.
pub fn build_context(result: &[ScoredDocument]) -> String {
    result
        .iter()
        .map(|scored| scored.document.content.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_DELIMITER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::KnowledgeBase;
    use crate::embeddings::providers::TrigramProvider;
    use crate::flat_index::FlatIndex;
    use crate::types::{Document, DocumentMetadata, EmbedderFingerprint, IndexOrigin};
    use crate::vector_index::VectorIndex;
    use cropwise_core::AppError;

    fn scored(content: &str, score: f32) -> ScoredDocument {
        ScoredDocument {
            document: Arc::new(Document {
                id: content.to_string(),
                content: content.to_string(),
                metadata: DocumentMetadata {
                    topic: String::new(),
                    source: String::new(),
                    url: String::new(),
                },
            }),
            score,
        }
    }

    #[test]
    fn test_build_context_joins_in_order() {
        let context = build_context(&[scored("first", 0.9), scored("second", 0.5)]);
        assert_eq!(context, "first\n\nsecond");
        assert_eq!(build_context(&[]), "");
    }

    #[tokio::test]
    async fn test_retrieve_before_publish() {
        let service = RetrievalService::new(
            Arc::new(TrigramProvider::new(64, 8192)),
            Arc::new(SharedIndex::new()),
        );
        assert!(matches!(
            service.retrieve("sowing", 3).await,
            Err(AppError::EmptyIndex)
        ));
    }

    #[tokio::test]
    async fn test_retrieve_rejects_foreign_index() {
        let kb = KnowledgeBase::fallback();
        let mut index = FlatIndex::new(EmbedderFingerprint {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 64,
        });
        index
            .build(
                kb.documents()
                    .iter()
                    .map(|doc| crate::types::IndexEntry {
                        embedding: vec![1.0; 64],
                        document: Arc::clone(doc),
                    })
                    .collect(),
            )
            .unwrap();

        let service = RetrievalService::new(
            Arc::new(TrigramProvider::new(64, 8192)),
            Arc::new(SharedIndex::with_index(Arc::new(index), IndexOrigin::Snapshot)),
        );

        let err = service.retrieve("irrigation", 2).await.unwrap_err();
        assert!(matches!(err, AppError::IncompatibleIndex(_)));
    }
}
