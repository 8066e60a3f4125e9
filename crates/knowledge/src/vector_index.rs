//! Vector index abstraction.
//!
//! Callers depend only on this trait, so the brute-force [`FlatIndex`] can be
//! replaced by an approximate structure without touching retrieval code.
//!
//! [`FlatIndex`]: crate::flat_index::FlatIndex

use crate::types::{EmbedderFingerprint, IndexEntry, QueryResult};
use cropwise_core::AppResult;
use std::path::Path;

/// Trait for vector index backends.
///
/// Implementations must guarantee:
/// - every stored vector has the index's declared dimension
/// - a failed `build` leaves the previous contents untouched
/// - `query` results are sorted by descending cosine similarity, ties in
///   insertion order
pub trait VectorIndex: Send + Sync + std::fmt::Debug {
    /// Replace the index contents with `entries`.
    ///
    /// Fails with `DimensionMismatch` if any vector's length differs from
    /// the declared dimension.
    fn build(&mut self, entries: Vec<IndexEntry>) -> AppResult<()>;

    /// Return the `k` entries most similar to `vector`.
    ///
    /// Fails with `EmptyIndex` when nothing has been built and with
    /// `DimensionMismatch` when `vector` has the wrong length.
    fn query(&self, vector: &[f32], k: usize) -> AppResult<QueryResult>;

    /// Write a snapshot that a later load reproduces exactly.
    fn persist(&self, path: &Path) -> AppResult<()>;

    /// Declared vector dimension.
    fn dimensions(&self) -> usize;

    /// Number of entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Embedder the stored vectors were produced with.
    fn embedder(&self) -> &EmbedderFingerprint;

    /// Fingerprint of the corpus the index was built from, when known.
    fn corpus_fingerprint(&self) -> Option<&str>;
}
