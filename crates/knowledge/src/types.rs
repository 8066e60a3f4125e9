//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Citation metadata attached to every document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Crop process the passage explains (e.g. "drying")
    pub topic: String,

    /// Publishing organisation
    pub source: String,

    /// Reference link
    pub url: String,
}

/// A curated passage. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
}

/// One record of a corpus file.
///
/// `id` is assigned from the record's position when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub text: String,

    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub topic: String,
}

/// An embedding paired with the document it was computed from.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub embedding: Vec<f32>,
    pub document: Arc<Document>,
}

/// A document together with its cosine similarity to a query.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument {
    pub document: Arc<Document>,
    pub score: f32,
}

/// Ordered by descending score, at most `k` long.
pub type QueryResult = Vec<ScoredDocument>;

/// Embedder identity recorded in an index and checked before every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedderFingerprint {
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
}

impl std::fmt::Display for EmbedderFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} ({} dims)", self.provider, self.model, self.dimensions)
    }
}

/// Header of an on-disk index snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub format_version: u32,
    pub embedder: EmbedderFingerprint,
    pub corpus_fingerprint: String,
    pub entry_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Where the active index came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexOrigin {
    /// Loaded from an existing snapshot
    Snapshot,
    /// Built from the configured or built-in corpus
    Built,
    /// Built from the four-passage fallback corpus
    Fallback,
}

impl IndexOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexOrigin::Snapshot => "snapshot",
            IndexOrigin::Built => "built",
            IndexOrigin::Fallback => "fallback",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_record_defaults() {
        let record: CorpusRecord = serde_json::from_str(r#"{"text": "Seeds sprout."}"#).unwrap();
        assert!(record.id.is_none());
        assert_eq!(record.text, "Seeds sprout.");
        assert!(record.source.is_empty());
    }

    #[test]
    fn test_fingerprint_display() {
        let fp = EmbedderFingerprint {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
        };
        assert_eq!(fp.to_string(), "trigram/trigram-v1 (384 dims)");
    }

    #[test]
    fn test_index_origin_serialization() {
        let json = serde_json::to_string(&IndexOrigin::Fallback).unwrap();
        assert_eq!(json, "\"fallback\"");
        assert_eq!(IndexOrigin::Snapshot.as_str(), "snapshot");
    }
}
