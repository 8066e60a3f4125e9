//! Citation references for retrieved passages.

use crate::types::ScoredDocument;
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

/// Snippet length shown alongside a citation, in graphemes.
pub const SNIPPET_LEN: usize = 120;

/// A retrieved passage reduced to what a reader needs to cite it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRef {
    pub id: String,
    pub topic: String,
    pub source: String,
    pub url: String,
    pub score: f32,
    pub snippet: String,
}

impl From<&ScoredDocument> for SourceRef {
    fn from(scored: &ScoredDocument) -> Self {
        let doc = &scored.document;
        Self {
            id: doc.id.clone(),
            topic: doc.metadata.topic.clone(),
            source: doc.metadata.source.clone(),
            url: doc.metadata.url.clone(),
            score: scored.score,
            snippet: truncate_snippet(&doc.content, SNIPPET_LEN),
        }
    }
}

/// Map results to citations, keeping rank order.
pub fn source_refs(result: &[ScoredDocument]) -> Vec<SourceRef> {
    result.iter().map(SourceRef::from).collect()
}

/// Shorten `text` to at most `max_len` graphemes, breaking at a word boundary.
pub fn truncate_snippet(text: &str, max_len: usize) -> String {
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    if graphemes.len() <= max_len {
        return text.to_string();
    }

    let truncated = graphemes[..max_len].concat();
    match truncated.rfind(char::is_whitespace) {
        Some(last_space) if last_space > 0 => format!("{}...", truncated[..last_space].trim_end()),
        _ => format!("{}...", truncated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Document, DocumentMetadata};
    use std::sync::Arc;

    #[test]
    fn test_short_text_unchanged() {
        assert_eq!(truncate_snippet("Threshing separates grain.", 120), "Threshing separates grain.");
    }

    #[test]
    fn test_truncates_at_word_boundary() {
        assert_eq!(
            truncate_snippet("Drying reduces moisture content", 12),
            "Drying..."
        );
    }

    #[test]
    fn test_multibyte_text_is_safe() {
        let text = "Sowing — the placement of seeds — matters";
        let snippet = truncate_snippet(text, 8);
        assert_eq!(snippet, "Sowing...");

        let no_space = "ññññññññññ";
        assert_eq!(truncate_snippet(no_space, 3), "ñññ...");
    }

    #[test]
    fn test_source_refs_keep_order() {
        let result: Vec<ScoredDocument> = [("a", 0.9), ("b", 0.4)]
            .iter()
            .map(|(id, score)| ScoredDocument {
                document: Arc::new(Document {
                    id: id.to_string(),
                    content: format!("passage {}", id),
                    metadata: DocumentMetadata {
                        topic: "harvesting".to_string(),
                        source: "FAO".to_string(),
                        url: "https://www.fao.org".to_string(),
                    },
                }),
                score: *score,
            })
            .collect();

        let refs = source_refs(&result);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].id, "a");
        assert_eq!(refs[0].source, "FAO");
        assert_eq!(refs[1].score, 0.4);
        assert_eq!(refs[1].snippet, "passage b");
    }
}
