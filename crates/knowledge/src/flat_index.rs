//! Brute-force cosine similarity index.

use crate::snapshot;
use crate::types::{EmbedderFingerprint, IndexEntry, QueryResult, ScoredDocument, SnapshotInfo};
use crate::vector_index::VectorIndex;
use cropwise_core::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;

/// Linear-scan index over L2-normalised vectors.
///
/// Vectors are normalised on build and queries are normalised on entry, so
/// the dot product is the cosine similarity.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    embedder: EmbedderFingerprint,
    corpus_fingerprint: Option<String>,
    entries: Vec<IndexEntry>,
}

impl FlatIndex {
    /// Create an empty index for vectors produced by `embedder`.
    pub fn new(embedder: EmbedderFingerprint) -> Self {
        Self {
            embedder,
            corpus_fingerprint: None,
            entries: Vec::new(),
        }
    }

    pub fn with_corpus_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.corpus_fingerprint = Some(fingerprint.into());
        self
    }

    /// Load a snapshot written by [`VectorIndex::persist`].
    pub fn load(path: &Path) -> AppResult<Self> {
        let (info, entries) = snapshot::read_snapshot(path)?;

        tracing::info!(
            "Loaded index snapshot from {:?}: {} entries, embedder {}",
            path,
            entries.len(),
            info.embedder
        );

        Ok(Self {
            embedder: info.embedder,
            corpus_fingerprint: Some(info.corpus_fingerprint).filter(|fp| !fp.is_empty()),
            entries,
        })
    }

    /// Persist and return the header that was written.
    pub fn persist_with_info(&self, path: &Path) -> AppResult<SnapshotInfo> {
        snapshot::write_snapshot(
            path,
            &self.embedder,
            self.corpus_fingerprint.as_deref().unwrap_or_default(),
            &self.entries,
        )
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }
}

impl VectorIndex for FlatIndex {
    fn build(&mut self, entries: Vec<IndexEntry>) -> AppResult<()> {
        let expected = self.embedder.dimensions;
        let mut normalised = Vec::with_capacity(entries.len());

        for entry in entries {
            if entry.embedding.len() != expected {
                return Err(AppError::DimensionMismatch {
                    expected,
                    actual: entry.embedding.len(),
                });
            }
            if !entry.embedding.iter().all(|x| x.is_finite()) {
                return Err(AppError::Embedding(format!(
                    "Embedding for '{}' has non-finite components",
                    entry.document.id
                )));
            }
            normalised.push(IndexEntry {
                embedding: l2_normalize(entry.embedding),
                document: entry.document,
            });
        }

        self.entries = normalised;
        tracing::debug!("Built flat index with {} entries", self.entries.len());
        Ok(())
    }

    fn query(&self, vector: &[f32], k: usize) -> AppResult<QueryResult> {
        if self.entries.is_empty() {
            return Err(AppError::EmptyIndex);
        }

        if vector.len() != self.embedder.dimensions {
            return Err(AppError::DimensionMismatch {
                expected: self.embedder.dimensions,
                actual: vector.len(),
            });
        }

        if !vector.iter().all(|x| x.is_finite()) {
            return Err(AppError::Embedding(
                "Query embedding has non-finite components".to_string(),
            ));
        }

        let query = l2_normalize(vector.to_vec());

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, dot(&query, &entry.embedding)))
            .collect();

        // Stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        tracing::debug!(
            "Query returned {} of {} entries (top-{}), scores: {:?}",
            scored.len(),
            self.entries.len(),
            k,
            scored.iter().map(|(_, s)| *s).collect::<Vec<_>>()
        );

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredDocument {
                document: Arc::clone(&self.entries[i].document),
                score,
            })
            .collect())
    }

    fn persist(&self, path: &Path) -> AppResult<()> {
        self.persist_with_info(path).map(|_| ())
    }

    fn dimensions(&self) -> usize {
        self.embedder.dimensions
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn embedder(&self) -> &EmbedderFingerprint {
        &self.embedder
    }

    fn corpus_fingerprint(&self) -> Option<&str> {
        self.corpus_fingerprint.as_deref()
    }
}

fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
