//! Error types for Cropwise.
//!
//! One enum covers every failure category: configuration, I/O, embedding,
//! index construction and loading, prompt rendering, and the remote
//! completion call.

use thiserror::Error;

/// Unified error type for Cropwise.
///
/// Index errors (`EmptyIndex`, `DimensionMismatch`, `IncompatibleIndex`) are
/// startup errors and abort index readiness. Completion errors (`LlmTimeout`,
/// `LlmRemote`, `LlmMalformedResponse`) are per-request and recoverable.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Knowledge base and corpus errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Embedding backend unavailable or input rejected
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Query against an index with zero entries
    #[error("Index is empty")]
    EmptyIndex,

    /// Vector dimension does not match the index dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Snapshot or embedder cannot be used with this index
    #[error("Incompatible index: {0}")]
    IncompatibleIndex(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Completion call exceeded its deadline
    #[error("LLM request timed out after {secs}s")]
    LlmTimeout { secs: u64 },

    /// Completion provider returned an error or was unreachable
    #[error("LLM error: {0}")]
    LlmRemote(String),

    /// Completion provider answered with an unexpected payload
    #[error("Malformed LLM response: {0}")]
    LlmMalformedResponse(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether the error is a per-request completion failure the user may retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::LlmTimeout { .. }
                | AppError::LlmRemote(_)
                | AppError::LlmMalformedResponse(_)
        )
    }

    /// Short message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::LlmTimeout { .. } => "Request timed out. Please try again.".to_string(),
            AppError::LlmRemote(msg) => format!("API error: {}", msg),
            AppError::LlmMalformedResponse(msg) => format!("Unexpected API response: {}", msg),
            other => format!("System error: {}", other),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_errors_are_recoverable() {
        assert!(AppError::LlmTimeout { secs: 30 }.is_recoverable());
        assert!(AppError::LlmRemote("503".to_string()).is_recoverable());
        assert!(AppError::LlmMalformedResponse("no choices".to_string()).is_recoverable());
    }

    #[test]
    fn test_index_errors_are_not_recoverable() {
        assert!(!AppError::EmptyIndex.is_recoverable());
        assert!(!AppError::DimensionMismatch {
            expected: 384,
            actual: 3
        }
        .is_recoverable());
        assert!(!AppError::IncompatibleIndex("format".to_string()).is_recoverable());
    }

    #[test]
    fn test_user_message_for_timeout() {
        let msg = AppError::LlmTimeout { secs: 30 }.user_message();
        assert!(msg.contains("timed out"));
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let err = AppError::DimensionMismatch {
            expected: 384,
            actual: 768,
        };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 384, got 768");
    }
}
