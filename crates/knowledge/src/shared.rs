//! Atomically published index handle.

use crate::types::IndexOrigin;
use crate::vector_index::VectorIndex;
use cropwise_core::{AppError, AppResult};
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone)]
struct Published {
    index: Arc<dyn VectorIndex>,
    origin: IndexOrigin,
}

/// Holds the active index.
///
/// Readers clone the inner `Arc` and query without holding the lock, so a
/// rebuild never blocks in-flight queries and a query never sees a
/// partially built index: a new index becomes visible only through
/// [`SharedIndex::publish`], after it is complete.
#[derive(Debug, Default)]
pub struct SharedIndex {
    current: RwLock<Option<Published>>,
}

impl SharedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(index: Arc<dyn VectorIndex>, origin: IndexOrigin) -> Self {
        let shared = Self::new();
        shared.publish(index, origin);
        shared
    }

    /// Replace the active index.
    pub fn publish(&self, index: Arc<dyn VectorIndex>, origin: IndexOrigin) {
        tracing::info!(
            "Publishing index: {} entries, origin {}",
            index.len(),
            origin.as_str()
        );
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Published { index, origin });
    }

    /// The active index, or `EmptyIndex` before the first publish.
    pub fn current(&self) -> AppResult<Arc<dyn VectorIndex>> {
        self.snapshot().map(|p| p.index).ok_or(AppError::EmptyIndex)
    }

    /// Where the active index came from.
    pub fn origin(&self) -> Option<IndexOrigin> {
        self.snapshot().map(|p| p.origin)
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot().is_some()
    }

    fn snapshot(&self) -> Option<Published> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flat_index::FlatIndex;
    use crate::types::{Document, DocumentMetadata, EmbedderFingerprint, IndexEntry};

    fn index_with(ids: &[&str]) -> Arc<dyn VectorIndex> {
        let mut index = FlatIndex::new(EmbedderFingerprint {
            provider: "test".to_string(),
            model: "fixed".to_string(),
            dimensions: 2,
        });
        let entries = ids
            .iter()
            .map(|id| IndexEntry {
                embedding: vec![1.0, 0.0],
                document: Arc::new(Document {
                    id: id.to_string(),
                    content: String::new(),
                    metadata: DocumentMetadata {
                        topic: String::new(),
                        source: String::new(),
                        url: String::new(),
                    },
                }),
            })
            .collect();
        index.build(entries).unwrap();
        Arc::new(index)
    }

    #[test]
    fn test_unpublished_is_empty() {
        let shared = SharedIndex::new();
        assert!(!shared.is_ready());
        assert!(shared.origin().is_none());
        assert!(matches!(shared.current(), Err(AppError::EmptyIndex)));
    }

    #[test]
    fn test_publish_swaps_without_affecting_readers() {
        let shared = SharedIndex::with_index(index_with(&["old"]), IndexOrigin::Snapshot);
        let held = shared.current().unwrap();

        shared.publish(index_with(&["new1", "new2"]), IndexOrigin::Built);

        // A reader holding the old Arc keeps a consistent view
        assert_eq!(held.len(), 1);
        assert_eq!(held.query(&[1.0, 0.0], 1).unwrap()[0].document.id, "old");

        assert_eq!(shared.current().unwrap().len(), 2);
        assert_eq!(shared.origin(), Some(IndexOrigin::Built));
    }
}
