mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use tutor_core::levels::YearLevel;
use tutor_core::traits::Embedder;
use tutor_core::types::ReconciliationPolicy;
use tutor_embed::FakeEmbedder;
use tutor_hybrid::{filter, HybridRetriever, RetrievalError};

fn year(n: u8) -> YearLevel {
    YearLevel::year(n).unwrap()
}

fn ids(excerpts: &[tutor_core::types::Excerpt]) -> Vec<&str> {
    excerpts.iter().map(|e| e.chunk_id.as_str()).collect()
}

#[tokio::test]
async fn empty_filter_skips_embedding_and_search() {
    let corpus = corpus();
    let embedder = Arc::new(CountingEmbedder::new());
    let index = Arc::new(CountingIndex::over(&corpus));

    let per_call = HybridRetriever::new(Arc::clone(&corpus), embedder.clone());
    let global = HybridRetriever::new(Arc::clone(&corpus), embedder.clone()).with_global_index(index.clone(), 1);

    for (area, level) in [("Mathematics", year(9)), ("History", year(2)), ("English", YearLevel::FOUNDATION)] {
        assert!(filter(&corpus, area, level).is_empty());
        assert!(per_call.try_retrieve("plants", area, level, 3).await.unwrap().is_empty());
        assert!(global.try_retrieve("plants", area, level, 3).await.unwrap().is_empty());
    }
    assert_eq!(embedder.calls(), 0);
    assert_eq!(index.searches(), 0);
}

#[tokio::test]
async fn result_never_exceeds_top_k_or_view() {
    let corpus = corpus();
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(DIM));
    let index = Arc::new(CountingIndex::over(&corpus));
    let retrievers = [
        HybridRetriever::new(Arc::clone(&corpus), Arc::clone(&embedder)),
        HybridRetriever::new(Arc::clone(&corpus), Arc::clone(&embedder)).with_global_index(index.clone(), 1),
        HybridRetriever::new(Arc::clone(&corpus), Arc::clone(&embedder)).with_global_index(index, 4),
    ];

    for retriever in &retrievers {
        for area in corpus.learning_areas() {
            for level in YearLevel::all() {
                let view = filter(&corpus, &area, level).len();
                for top_k in 0..6 {
                    let out = retriever.try_retrieve("water for plants", &area, level, top_k).await.unwrap();
                    assert!(out.len() <= top_k.min(view), "{area} {level} k={top_k}: {} > min({top_k}, {view})", out.len());
                }
            }
        }
    }
}

#[tokio::test]
async fn per_call_index_returns_the_whole_small_view() {
    let corpus = corpus();
    let retriever = HybridRetriever::new(Arc::clone(&corpus), Arc::new(FakeEmbedder::new(DIM)));
    // Science at Year 2: two Level 2 chunks, one spanning Level 1-2, one Unknown.
    let out = retriever.try_retrieve("Plants need water and sunlight to grow", "Science", year(2), 10).await.unwrap();
    assert_eq!(out.len(), 4);
    assert_eq!(out[0].chunk_id, "sci-2-plants");
}

#[tokio::test]
async fn one_item_view_with_top_k_three() {
    let corpus = corpus();
    let retriever = HybridRetriever::new(Arc::clone(&corpus), Arc::new(FakeEmbedder::new(DIM)));
    assert_eq!(filter(&corpus, "English", year(2)).len(), 1);

    let out = retriever.try_retrieve("tell me a story", "English", year(2), 3).await.unwrap();
    assert_eq!(ids(&out), vec!["eng-2-story"]);
}

#[tokio::test]
async fn results_are_nearest_first_under_both_policies() {
    let corpus = corpus();
    let fake = FakeEmbedder::new(DIM);
    let query = "water and rain for plants";
    let q = fake.embed_one(query).unwrap();
    let distance_of = |id: &str| {
        let chunk = corpus.chunks().iter().find(|c| c.id == id).unwrap();
        squared_l2(&q, &fake.embed_one(&chunk.text).unwrap())
    };

    let per_call = HybridRetriever::new(Arc::clone(&corpus), Arc::new(FakeEmbedder::new(DIM)));
    let global = HybridRetriever::new(Arc::clone(&corpus), Arc::new(FakeEmbedder::new(DIM)))
        .with_global_index(Arc::new(CountingIndex::over(&corpus)), 8);

    for retriever in [&per_call, &global] {
        let out = retriever.try_retrieve(query, "Science", year(2), 4).await.unwrap();
        assert!(!out.is_empty());
        let distances: Vec<f32> = out.iter().map(|e| distance_of(&e.chunk_id)).collect();
        for w in distances.windows(2) {
            assert!(w[0] <= w[1] + 1e-6, "{:?} not ascending", distances);
        }
    }
}

#[tokio::test]
async fn global_post_filter_only_returns_view_members() {
    let corpus = corpus();
    let index = Arc::new(CountingIndex::over(&corpus));
    let retriever = HybridRetriever::new(Arc::clone(&corpus), Arc::new(FakeEmbedder::new(DIM))).with_global_index(index.clone(), 8);
    assert_eq!(retriever.policy(), ReconciliationPolicy::GlobalPostFilter);

    let out = retriever.try_retrieve("addition and counting", "Science", year(2), 3).await.unwrap();
    let view_ids: Vec<&str> = filter(&corpus, "Science", year(2)).entries().iter().map(|(_, c)| c.id.as_str()).collect();
    assert!(ids(&out).iter().all(|id| view_ids.contains(id)), "{:?}", ids(&out));
    assert!(!ids(&out).contains(&"mat-2-add"));
    assert_eq!(index.searches(), 1);
}

#[tokio::test]
async fn global_post_filter_with_full_fetch_matches_per_call_index() {
    let corpus = corpus();
    let per_call = HybridRetriever::new(Arc::clone(&corpus), Arc::new(FakeEmbedder::new(DIM)));
    let global = HybridRetriever::new(Arc::clone(&corpus), Arc::new(FakeEmbedder::new(DIM)))
        .with_global_index(Arc::new(CountingIndex::over(&corpus)), corpus.len());

    for query in ["animals and shelter", "light and shadows", "rain"] {
        let a = per_call.try_retrieve(query, "Science", year(2), 2).await.unwrap();
        let b = global.try_retrieve(query, "Science", year(2), 2).await.unwrap();
        assert_eq!(a, b, "{query}");
    }
}

#[tokio::test]
async fn global_post_filter_loses_recall_without_over_fetch() {
    let corpus = corpus();
    let index = Arc::new(CountingIndex::over(&corpus));
    let retriever = HybridRetriever::new(Arc::clone(&corpus), Arc::new(FakeEmbedder::new(DIM))).with_global_index(index, 1);

    // The single nearest chunk overall is a maths chunk, so nothing survives the filter.
    let out = retriever.try_retrieve("Addition basics with counting objects", "Science", year(2), 1).await.unwrap();
    assert!(out.is_empty());
}

#[tokio::test]
async fn missing_embedder_is_a_configuration_failure() {
    let corpus = corpus();
    let retriever = HybridRetriever::without_embedder(Arc::clone(&corpus), "no model directory");

    let err = retriever.try_retrieve("plants", "Science", year(2), 3).await.unwrap_err();
    assert!(matches!(err, RetrievalError::ConfigurationUnavailable(_)));

    let retrieval = retriever.retrieve("plants", "Science", year(2), 3).await;
    assert!(retrieval.excerpts.is_empty());
    let message = retrieval.diagnostic.expect("diagnostic").to_string();
    assert!(message.contains("no model directory"), "{message}");

    // Nothing to search is still not an error.
    assert!(retriever.try_retrieve("plants", "History", year(2), 3).await.unwrap().is_empty());
}

#[tokio::test]
async fn embedding_failure_becomes_a_diagnostic() {
    let retriever = HybridRetriever::new(corpus(), Arc::new(FailingEmbedder));
    let retrieval = retriever.retrieve("plants", "Science", year(2), 3).await;
    assert!(retrieval.excerpts.is_empty());
    assert!(matches!(retrieval.diagnostic, Some(RetrievalError::Embedding(_))));
}

#[tokio::test]
async fn index_failure_becomes_a_diagnostic() {
    let corpus = corpus();
    let retriever = HybridRetriever::new(Arc::clone(&corpus), Arc::new(FakeEmbedder::new(DIM)))
        .with_global_index(Arc::new(FailingIndex { len: corpus.len() }), 1);
    let retrieval = retriever.retrieve("plants", "Science", year(2), 3).await;
    assert!(retrieval.excerpts.is_empty());
    assert!(matches!(retrieval.diagnostic, Some(RetrievalError::IndexSearch(_))));
}

#[tokio::test]
async fn slow_search_times_out() {
    let corpus = corpus();
    let retriever = HybridRetriever::new(Arc::clone(&corpus), Arc::new(FakeEmbedder::new(DIM)))
        .with_global_index(Arc::new(SlowIndex { len: corpus.len(), delay: Duration::from_secs(5) }), 1)
        .with_timeout(Duration::from_millis(50));
    let err = retriever.try_retrieve("plants", "Science", year(2), 3).await.unwrap_err();
    assert!(matches!(err, RetrievalError::Timeout { stage: "vector search", .. }), "{err}");
}

#[tokio::test]
async fn slow_embedding_times_out() {
    let retriever = HybridRetriever::new(corpus(), Arc::new(SlowEmbedder(Duration::from_millis(500))))
        .with_timeout(Duration::from_millis(20));
    let err = retriever.try_retrieve("plants", "Science", year(2), 3).await.unwrap_err();
    assert!(matches!(err, RetrievalError::Timeout { stage: "query embedding", .. }), "{err}");
}
