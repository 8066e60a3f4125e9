//! Trigram embedding provider: offline, deterministic, content-aware vectors.

use crate::embeddings::provider::EmbeddingProvider;
use cropwise_core::{AppError, AppResult};
use std::collections::BTreeMap;
use unicode_segmentation::UnicodeSegmentation;

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "how", "why", "does", "do", "can",
];

/// Trigram-based embedding provider for local, offline operation.
///
/// Each word contributes its hashed character trigrams plus a whole-word
/// feature; the result is L2-normalised. Not semantically accurate, but
/// stable across runs and platforms.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
    max_input_chars: usize,
}

impl TrigramProvider {
    pub fn new(dimensions: usize, max_input_chars: usize) -> Self {
        Self {
            dimensions,
            max_input_chars,
        }
    }

    fn bucket(&self, feature: &str, multiplier: u64) -> usize {
        let hash = feature
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(b as u64));
        (hash % self.dimensions as u64) as usize
    }

    fn embed_one(&self, text: &str) -> AppResult<Vec<f32>> {
        let length = text.chars().count();
        if length > self.max_input_chars {
            return Err(AppError::Embedding(format!(
                "Input of {} characters exceeds the limit of {}",
                length, self.max_input_chars
            )));
        }

        let lower = text.to_lowercase();
        let mut word_freq: BTreeMap<&str, u32> = BTreeMap::new();
        for word in lower.unicode_words() {
            if word.chars().count() > 2 && !STOP_WORDS.contains(&word) {
                *word_freq.entry(word).or_insert(0) += 1;
            }
        }

        let mut embedding = vec![0.0f32; self.dimensions];

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                embedding[self.bucket(&trigram, 37)] += (*freq as f32).sqrt();
            }

            embedding[self.bucket(word, 31)] += *freq as f32;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        Ok(embedding)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed_one(text)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> TrigramProvider {
        TrigramProvider::new(384, 8192)
    }

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[tokio::test]
    async fn test_trigram_provider_embed_single() {
        let embedding = provider().embed("Threshing separates grain").await.unwrap();

        assert_eq!(embedding.len(), 384);
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_batch_matches_individual_calls() {
        let provider = provider();
        let texts = vec![
            "Drip irrigation saves water".to_string(),
            "Winnowing removes chaff".to_string(),
            "Transplanting rice seedlings".to_string(),
        ];

        let batch = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(batch.len(), 3);
        for (text, embedding) in texts.iter().zip(&batch) {
            assert_eq!(&provider.embed(text).await.unwrap(), embedding);
        }
    }

    #[tokio::test]
    async fn test_trigram_provider_deterministic() {
        let a = TrigramProvider::new(384, 8192).embed("grain filling").await.unwrap();
        let b = TrigramProvider::new(384, 8192).embed("grain filling").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_punctuation_and_case_ignored() {
        let provider = provider();
        let a = provider.embed("Grain filling stage?").await.unwrap();
        let b = provider.embed("grain filling stage").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_different_texts_differ() {
        let provider = provider();
        let a = provider.embed("crop rotation").await.unwrap();
        let b = provider.embed("grain storage").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let embedding = provider().embed("").await.unwrap();
        assert_eq!(embedding.len(), 384);
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_over_length_input_rejected() {
        let provider = TrigramProvider::new(64, 10);
        let err = provider.embed("this input is far too long").await.unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));

        let texts = vec!["short".to_string(), "this one is too long".to_string()];
        assert!(provider.embed_batch(&texts).await.is_err());
    }

    #[tokio::test]
    async fn test_limit_counts_characters_not_bytes() {
        let provider = TrigramProvider::new(64, 6);
        assert!(provider.embed("épicé").await.is_ok());
    }
}
