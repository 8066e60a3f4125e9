//! Retrieval-augmented question answering over a curated crop-process corpus.
//!
//! The pieces, bottom-up:
//! - [`corpus::KnowledgeBase`]: the curated passages with citation metadata
//! - [`embeddings`]: text-to-vector providers (deterministic trigram, Ollama)
//! - [`flat_index::FlatIndex`]: cosine-similarity index, persisted as a SQLite snapshot
//! - [`shared::SharedIndex`]: the published index read by concurrent queries
//! - [`retrieval::RetrievalService`] and [`policy::DenylistPolicy`]
//! - [`assistant::Assistant`]: policy gate, retrieval, prompt and completion

pub mod assistant;
pub mod bootstrap;
pub mod corpus;
pub mod embeddings;
pub mod flat_index;
pub mod policy;
pub mod retrieval;
pub mod shared;
pub mod snapshot;
pub mod sources;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

pub use assistant::{screen, AskMode, AskOutcome, Assistant, AssistantSettings};
pub use bootstrap::{build_index, load_corpus, open_index, rebuild_snapshot, IndexOptions};
pub use corpus::KnowledgeBase;
pub use embeddings::{create_provider, ensure_compatible, EmbeddingConfig, EmbeddingProvider};
pub use flat_index::FlatIndex;
pub use policy::{Classification, DenylistPolicy, QueryPolicy};
pub use retrieval::{build_context, RetrievalService, CONTEXT_DELIMITER};
pub use shared::SharedIndex;
pub use snapshot::read_snapshot_info;
pub use sources::{source_refs, SourceRef};
pub use types::{
    CorpusRecord, Document, DocumentMetadata, EmbedderFingerprint, IndexEntry, IndexOrigin,
    QueryResult, ScoredDocument, SnapshotInfo,
};
pub use vector_index::VectorIndex;
