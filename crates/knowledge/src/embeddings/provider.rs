//! Embedding provider trait and factory.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::providers::{OllamaProvider, TrigramProvider};
use crate::types::EmbedderFingerprint;
use cropwise_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
///
/// `embed` is deterministic for a given provider and model, and `embed_batch`
/// is equivalent to calling `embed` on each text in order. Inputs over the
/// configured length limit are rejected, never truncated.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "trigram", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Identity recorded in indexes built with this provider.
    fn fingerprint(&self) -> EmbedderFingerprint {
        EmbedderFingerprint {
            provider: self.provider_name().to_string(),
            model: self.model_name().to_string(),
            dimensions: self.dimensions(),
        }
    }

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
///
/// Network providers are probed once so a missing backend fails at startup.
pub async fn create_provider(config: &EmbeddingConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    config.validate()?;

    tracing::debug!(
        "Creating embedding provider: provider={}, model={}, dimensions={}",
        config.provider,
        config.model,
        config.dimensions
    );

    match config.provider.as_str() {
        "trigram" => Ok(Arc::new(TrigramProvider::new(
            config.dimensions,
            config.max_input_chars,
        ))),

        "ollama" => {
            let provider = OllamaProvider::new(config)?;
            provider.verify_connection().await?;
            Ok(Arc::new(provider))
        }

        other => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'",
            other
        ))),
    }
}

/// Fail with `IncompatibleIndex` unless an index was built by the same embedder.
pub fn ensure_compatible(
    index: &EmbedderFingerprint,
    embedder: &EmbedderFingerprint,
) -> AppResult<()> {
    if index.provider != embedder.provider {
        return Err(AppError::IncompatibleIndex(format!(
            "Provider mismatch: index built with '{}', embedder is '{}'",
            index.provider, embedder.provider
        )));
    }

    if index.model != embedder.model {
        return Err(AppError::IncompatibleIndex(format!(
            "Model mismatch: index built with '{}', embedder is '{}'",
            index.model, embedder.model
        )));
    }

    if index.dimensions != embedder.dimensions {
        return Err(AppError::IncompatibleIndex(format!(
            "Dimension mismatch: index has {}, embedder produces {}",
            index.dimensions, embedder.dimensions
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_trigram_provider() {
        let config = EmbeddingConfig::default();

        let provider = create_provider(&config).await.unwrap();
        assert_eq!(provider.provider_name(), "trigram");
        assert_eq!(provider.model_name(), "trigram-v1");
        assert_eq!(provider.dimensions(), 384);
        assert_eq!(provider.fingerprint(), config.fingerprint());
    }

    #[tokio::test]
    async fn test_create_unknown_provider() {
        let config = EmbeddingConfig {
            provider: "unknown".to_string(),
            ..Default::default()
        };

        let result = create_provider(&config).await;
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown embedding provider"));
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let provider = create_provider(&EmbeddingConfig::default()).await.unwrap();

        let embedding = provider.embed("Seeds need moisture").await.unwrap();
        assert_eq!(embedding.len(), 384);
    }

    #[test]
    fn test_ensure_compatible() {
        let base = EmbeddingConfig::default().fingerprint();
        assert!(ensure_compatible(&base, &base.clone()).is_ok());

        let other_model = EmbedderFingerprint {
            model: "trigram-v2".to_string(),
            ..base.clone()
        };
        let err = ensure_compatible(&base, &other_model).unwrap_err();
        assert!(matches!(err, AppError::IncompatibleIndex(_)));
        assert!(err.to_string().contains("Model mismatch"));

        let other_dims = EmbedderFingerprint {
            dimensions: 768,
            ..base.clone()
        };
        let err = ensure_compatible(&base, &other_dims).unwrap_err();
        assert!(err.to_string().contains("Dimension mismatch"));
    }
}
