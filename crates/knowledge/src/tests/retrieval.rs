use super::support::{build_shared, CountingEmbedder};
use crate::bootstrap::{open_index, rebuild_snapshot, IndexOptions};
use crate::corpus::KnowledgeBase;
use crate::embeddings::providers::TrigramProvider;
use crate::retrieval::{build_context, RetrievalService};
use crate::types::IndexOrigin;
use crate::vector_index::VectorIndex;
use std::sync::Arc;
use tempfile::TempDir;

async fn builtin_service() -> RetrievalService {
    let embedder = Arc::new(TrigramProvider::new(384, 8192));
    let index = build_shared(&KnowledgeBase::builtin(), embedder.as_ref()).await;
    RetrievalService::new(embedder, index)
}

#[tokio::test]
async fn test_every_passage_retrieves_itself() {
    let service = builtin_service().await;
    let kb = KnowledgeBase::builtin();

    for doc in kb.documents() {
        let result = service.retrieve(&doc.content, 1).await.unwrap();
        assert_eq!(result[0].document.id, doc.id);
        assert!((result[0].score - 1.0).abs() < 1e-5);
    }
}

#[tokio::test]
async fn test_result_sorted_and_bounded() {
    let service = builtin_service().await;

    for k in [0, 1, 3, 16, 40] {
        let result = service
            .retrieve("How do farmers prepare land before sowing?", k)
            .await
            .unwrap();
        assert_eq!(result.len(), k.min(16));
        assert!(result.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[tokio::test]
async fn test_drying_question_finds_drying_passage() {
    let service = builtin_service().await;

    let result = service
        .retrieve("Why is drying grain important after harvest?", 3)
        .await
        .unwrap();

    assert_eq!(result.len(), 3);
    assert!(result.iter().any(|r| r.document.metadata.topic == "drying"));

    let context = build_context(&result);
    assert!(!context.is_empty());
    assert!(context.starts_with(&result[0].document.content));
}

#[tokio::test]
async fn test_snapshot_round_trip_preserves_scores() {
    let temp = TempDir::new().unwrap();
    let options = IndexOptions {
        snapshot_path: temp.path().join("index.sqlite"),
        corpus_path: None,
        allow_fallback_corpus: false,
    };
    let embedder = TrigramProvider::new(384, 8192);

    let (built, _) = rebuild_snapshot(&options, &embedder).await.unwrap();
    let (loaded, origin) = open_index(&options, &embedder).await.unwrap();
    assert_eq!(origin, IndexOrigin::Snapshot);

    let query = crate::embeddings::EmbeddingProvider::embed(&embedder, "threshing and winnowing")
        .await
        .unwrap();
    let before = built.query(&query, 16).unwrap();
    let after = loaded.query(&query, 16).unwrap();

    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(&after) {
        assert_eq!(b.document.id, a.document.id);
        assert_eq!(b.document.metadata, a.document.metadata);
        assert!((b.score - a.score).abs() < 1e-6);
    }
}

#[tokio::test]
async fn test_concurrent_retrieves_match_sequential() {
    let service = builtin_service().await;
    let questions = [
        "What happens during flowering?",
        "How is grain stored safely?",
        "What is seed germination?",
        "How does irrigation help crops?",
    ];

    let mut sequential = Vec::new();
    for q in &questions {
        sequential.push(service.retrieve(q, 3).await.unwrap());
    }

    let concurrent = futures::future::join_all(questions.iter().map(|q| {
        let service = service.clone();
        async move { service.retrieve(q, 3).await.unwrap() }
    }))
    .await;

    for (s, c) in sequential.iter().zip(&concurrent) {
        let s_ids: Vec<_> = s.iter().map(|r| r.document.id.as_str()).collect();
        let c_ids: Vec<_> = c.iter().map(|r| r.document.id.as_str()).collect();
        assert_eq!(s_ids, c_ids);
    }
}

#[tokio::test]
async fn test_reads_continue_across_publish() {
    let embedder = Arc::new(CountingEmbedder::new());
    let shared = build_shared(&KnowledgeBase::fallback(), embedder.as_ref()).await;
    let service = RetrievalService::new(embedder.clone(), Arc::clone(&shared));

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.retrieve("harvest timing", 2).await })
        })
        .collect();

    let full = crate::bootstrap::build_index(&KnowledgeBase::builtin(), embedder.as_ref())
        .await
        .unwrap();
    shared.publish(Arc::new(full), IndexOrigin::Built);

    for reader in readers {
        let result = reader.await.unwrap().unwrap();
        assert_eq!(result.len(), 2);
    }
    assert_eq!(shared.current().unwrap().len(), 16);
    assert_eq!(embedder.calls(), 4 + 8 + 16);
}
