//! Embedding engine: maps text to fixed-length vectors.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, ensure_compatible, EmbeddingProvider};
