//! Index lifecycle: build from a corpus, persist, and open at startup.

use crate::corpus::KnowledgeBase;
use crate::embeddings::{ensure_compatible, EmbeddingProvider};
use crate::flat_index::FlatIndex;
use crate::types::{IndexEntry, IndexOrigin, SnapshotInfo};
use crate::vector_index::VectorIndex;
use cropwise_core::{AppConfig, AppError, AppResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Where the index lives and what to build it from.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub snapshot_path: PathBuf,

    /// Corpus file; the built-in corpus when `None`
    pub corpus_path: Option<PathBuf>,

    /// Use the four-passage fallback corpus when no snapshot exists
    pub allow_fallback_corpus: bool,
}

impl IndexOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            snapshot_path: config.snapshot_path(),
            corpus_path: config.corpus_path(),
            allow_fallback_corpus: config.retrieval.allow_fallback_corpus,
        }
    }
}

/// Load the configured corpus file, or the built-in corpus.
pub fn load_corpus(corpus_path: Option<&Path>) -> AppResult<KnowledgeBase> {
    match corpus_path {
        Some(path) => KnowledgeBase::load_file(path),
        None => Ok(KnowledgeBase::builtin()),
    }
}

/// Embed every document and build a fresh index.
pub async fn build_index(
    kb: &KnowledgeBase,
    embedder: &dyn EmbeddingProvider,
) -> AppResult<FlatIndex> {
    if kb.is_empty() {
        return Err(AppError::EmptyIndex);
    }

    let start = Instant::now();
    let texts: Vec<String> = kb.documents().iter().map(|d| d.content.clone()).collect();
    let vectors = embedder.embed_batch(&texts).await?;

    if vectors.len() != texts.len() {
        return Err(AppError::Embedding(format!(
            "Embedder returned {} vectors for {} documents",
            vectors.len(),
            texts.len()
        )));
    }

    let entries = vectors
        .into_iter()
        .zip(kb.documents())
        .map(|(embedding, document)| IndexEntry {
            embedding,
            document: Arc::clone(document),
        })
        .collect();

    let mut index = FlatIndex::new(embedder.fingerprint()).with_corpus_fingerprint(kb.fingerprint());
    index.build(entries)?;

    tracing::info!(
        "Built index over {} documents with {} in {:.2}s",
        index.len(),
        embedder.fingerprint(),
        start.elapsed().as_secs_f64()
    );

    Ok(index)
}

/// Rebuild from the configured corpus and replace the snapshot on disk.
pub async fn rebuild_snapshot(
    options: &IndexOptions,
    embedder: &dyn EmbeddingProvider,
) -> AppResult<(FlatIndex, SnapshotInfo)> {
    let kb = load_corpus(options.corpus_path.as_deref())?;
    let index = build_index(&kb, embedder).await?;
    let info = index.persist_with_info(&options.snapshot_path)?;

    tracing::info!(
        "Persisted index snapshot to {:?} ({} entries)",
        options.snapshot_path,
        info.entry_count
    );

    Ok((index, info))
}

/// Open the index for serving.
///
/// Loads the snapshot when present and checks it against the embedder. When
/// it is absent, builds the fallback corpus if allowed, and fails otherwise.
pub async fn open_index(
    options: &IndexOptions,
    embedder: &dyn EmbeddingProvider,
) -> AppResult<(FlatIndex, IndexOrigin)> {
    if options.snapshot_path.exists() {
        let index = FlatIndex::load(&options.snapshot_path)?;
        ensure_compatible(index.embedder(), &embedder.fingerprint())?;
        warn_if_stale(&index, options);
        return Ok((index, IndexOrigin::Snapshot));
    }

    if options.allow_fallback_corpus {
        tracing::warn!(
            "No index snapshot at {:?}; answering from the 4-passage fallback corpus. Run 'cropwise index build' for the full knowledge base.",
            options.snapshot_path
        );
        let index = build_index(&KnowledgeBase::fallback(), embedder).await?;
        return Ok((index, IndexOrigin::Fallback));
    }

    Err(AppError::Knowledge(format!(
        "No index snapshot at {:?}. Run 'cropwise index build' first.",
        options.snapshot_path
    )))
}

fn warn_if_stale(index: &FlatIndex, options: &IndexOptions) {
    let Some(indexed) = index.corpus_fingerprint() else {
        return;
    };

    match load_corpus(options.corpus_path.as_deref()) {
        Ok(kb) if kb.fingerprint() != indexed => tracing::warn!(
            "Index snapshot {:?} was built from a different corpus; run 'cropwise index build' to refresh it",
            options.snapshot_path
        ),
        Ok(_) => {}
        Err(e) => tracing::debug!("Skipping corpus staleness check: {}", e),
    }
}
