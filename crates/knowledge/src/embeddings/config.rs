//! Embedding configuration types.

use crate::types::EmbedderFingerprint;
use cropwise_core::config::EmbeddingSettings;
use cropwise_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Supported embedding providers.
pub const EMBEDDING_PROVIDERS: [&str; 2] = ["trigram", "ollama"];

/// Embedding configuration resolved from application settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Inputs longer than this many characters are rejected
    pub max_input_chars: usize,

    /// Base URL for network providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Per-request timeout for network providers
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            max_input_chars: 8192,
            endpoint: None,
            timeout_secs: 30,
        }
    }
}

impl From<&EmbeddingSettings> for EmbeddingConfig {
    fn from(settings: &EmbeddingSettings) -> Self {
        Self {
            provider: settings.provider.clone(),
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            max_input_chars: settings.max_input_chars,
            endpoint: settings.endpoint.clone(),
            ..Default::default()
        }
    }
}

impl EmbeddingConfig {
    /// Reject configurations no provider can honour.
    pub fn validate(&self) -> AppResult<()> {
        if !EMBEDDING_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: '{}'. Supported providers: {}",
                self.provider,
                EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        if self.max_input_chars == 0 {
            return Err(AppError::Config(
                "Embedding maxInputChars must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Identity the resulting provider will report.
    pub fn fingerprint(&self) -> EmbedderFingerprint {
        EmbedderFingerprint {
            provider: self.provider.clone(),
            model: self.model.clone(),
            dimensions: self.dimensions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, "trigram");
        assert_eq!(config.model, "trigram-v1");
        assert_eq!(config.dimensions, 384);
        assert_eq!(config.max_input_chars, 8192);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_settings() {
        let settings = EmbeddingSettings {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            max_input_chars: 2000,
            endpoint: Some("http://gpu-box:11434".to_string()),
        };

        let config = EmbeddingConfig::from(&settings);
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.dimensions, 768);
        assert_eq!(config.endpoint.as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_validate_rejects_unknown_provider() {
        let config = EmbeddingConfig {
            provider: "word2vec".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }

    #[test]
    fn test_validate_rejects_zero_dimensions() {
        let config = EmbeddingConfig {
            dimensions: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fingerprint() {
        let fp = EmbeddingConfig::default().fingerprint();
        assert_eq!(fp.provider, "trigram");
        assert_eq!(fp.dimensions, 384);
    }
}
