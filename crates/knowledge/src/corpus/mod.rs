//! The knowledge base: a static, read-only collection of curated documents.

mod builtin;

use crate::types::{CorpusRecord, Document, DocumentMetadata};
use cropwise_core::{AppError, AppResult};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;

/// Read-only document collection. Documents are shared with index entries.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    documents: Vec<Arc<Document>>,
}

impl KnowledgeBase {
    /// The sixteen curated crop-process passages.
    pub fn builtin() -> Self {
        let records = builtin::BUILTIN_PASSAGES
            .iter()
            .map(|(topic, source, url, text)| CorpusRecord {
                id: None,
                text: text.to_string(),
                source: source.to_string(),
                url: url.to_string(),
                topic: topic.to_string(),
            })
            .collect();
        Self::from_records(records)
    }

    /// The minimal four-passage corpus used when fallback is allowed.
    pub fn fallback() -> Self {
        let records = builtin::FALLBACK_PASSAGES
            .iter()
            .map(|text| CorpusRecord {
                id: None,
                text: text.to_string(),
                source: "Cropwise fallback corpus".to_string(),
                url: String::new(),
                topic: "general".to_string(),
            })
            .collect();
        Self::from_records(records)
    }

    /// Build a knowledge base from records, assigning positional ids where missing.
    pub fn from_records(records: Vec<CorpusRecord>) -> Self {
        let mut kb = Self {
            documents: Vec::with_capacity(records.len()),
        };
        for record in records {
            kb.push(record);
        }
        kb
    }

    /// Load records from a `.json`, `.yaml` or `.yml` file.
    pub fn load_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Knowledge(format!("Failed to read corpus file {:?}: {}", path, e))
        })?;

        let records: Vec<CorpusRecord> = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            other => {
                return Err(AppError::Knowledge(format!(
                    "Unsupported corpus format {:?} for {:?}; expected .json, .yaml or .yml",
                    other.unwrap_or(""),
                    path
                )))
            }
        };

        if records.iter().any(|r| r.text.trim().is_empty()) {
            return Err(AppError::Knowledge(format!(
                "Corpus file {:?} contains a record with empty text",
                path
            )));
        }

        tracing::info!("Loaded {} corpus records from {:?}", records.len(), path);
        Ok(Self::from_records(records))
    }

    /// Append a document. The index must be rebuilt to see it.
    pub fn push(&mut self, record: CorpusRecord) {
        let id = record
            .id
            .unwrap_or_else(|| self.documents.len().to_string());
        self.documents.push(Arc::new(Document {
            id,
            content: record.text,
            metadata: DocumentMetadata {
                topic: record.topic,
                source: record.source,
                url: record.url,
            },
        }));
    }

    pub fn documents(&self) -> &[Arc<Document>] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Stable SHA-256 over ids, contents and metadata, in order.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for doc in &self.documents {
            for field in [
                &doc.id,
                &doc.content,
                &doc.metadata.topic,
                &doc.metadata.source,
                &doc.metadata.url,
            ] {
                hasher.update((field.len() as u64).to_le_bytes());
                hasher.update(field.as_bytes());
            }
        }
        format!("{:x}", hasher.finalize())
    }
}
