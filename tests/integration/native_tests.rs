use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use portfolio_search::search::similarity::l2_norm;
use portfolio_search::search::{
    DEFAULT_ALPHA, FileSource, SemanticHasher, VectorStore, hash_ngrams,
};
use portfolio_search::test_utils::fixtures::{
    BINDGEN_HASH_WAT, BINDGEN_SHORT_OUTPUT_WAT, FailingSource, MISSING_EXPORTS_WAT,
    NGRAM_HASH_WAT, StaticSource, sample_documents,
};
use portfolio_search::test_utils::init_test_tracing;

fn assert_close(a: &[f32], b: &[f32]) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert!((x - y).abs() < 1e-6, "{x} != {y}");
    }
}

#[tokio::test]
async fn concurrent_loads_share_one_fetch() {
    init_test_tracing();
    let source = StaticSource::new(NGRAM_HASH_WAT).with_delay(Duration::from_millis(50));
    let fetches = source.fetch_counter();
    let hasher = Arc::new(SemanticHasher::new(Box::new(source)));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let hasher = Arc::clone(&hasher);
            tokio::spawn(async move { hasher.load_native().await })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap());
    }

    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert!(hasher.has_native());
    let text = "nanoparticle delivery system";
    assert_close(&hasher.semantic_vector(text), &hash_ngrams(text));
}

#[tokio::test]
async fn failed_load_is_cached_and_falls_back() {
    init_test_tracing();
    let source = FailingSource::default();
    let fetches = source.fetch_counter();
    let hasher = SemanticHasher::new(Box::new(source));

    assert!(!hasher.load_native().await);
    assert!(!hasher.load_native().await);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert!(hasher.load_settled());
    assert!(!hasher.has_native());

    let embedding = hasher.semantic_vector("protein stability optimization");
    assert!((l2_norm(&embedding) - 1.0).abs() < 1e-4);
}

#[tokio::test]
async fn module_without_required_exports_is_rejected() {
    let hasher = SemanticHasher::new(Box::new(StaticSource::new(MISSING_EXPORTS_WAT)));
    assert!(!hasher.load_native().await);
    assert_eq!(hasher.semantic_vector("liver"), hash_ngrams("liver"));
}

#[tokio::test]
async fn bindgen_build_loads_and_hashes() {
    init_test_tracing();
    let hasher = SemanticHasher::new(Box::new(StaticSource::new(BINDGEN_HASH_WAT)));
    assert!(hasher.load_native().await);
    assert!(hasher.has_native());
    let text = "capsid engineering for liver";
    assert_close(&hasher.semantic_vector(text), &hash_ngrams(text));
}

#[tokio::test]
async fn bindgen_result_of_wrong_length_falls_back_per_call() {
    let hasher = SemanticHasher::new(Box::new(StaticSource::new(BINDGEN_SHORT_OUTPUT_WAT)));
    assert!(hasher.load_native().await);
    assert_eq!(hasher.semantic_vector("liver"), hash_ngrams("liver"));
}

#[tokio::test]
async fn bounded_wait_does_not_cancel_the_load() {
    let source = StaticSource::new(NGRAM_HASH_WAT).with_delay(Duration::from_millis(300));
    let fetches = source.fetch_counter();
    let hasher = Arc::new(SemanticHasher::new(Box::new(source)));

    assert!(!hasher.load_native_within(Duration::from_millis(5)).await);
    assert!(!hasher.has_native());

    // the timed-out load is still in flight and is joined here
    assert!(hasher.load_native().await);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn preload_settles_in_the_background() {
    let hasher = Arc::new(SemanticHasher::new(Box::new(StaticSource::new(NGRAM_HASH_WAT))));
    hasher.preload();
    hasher.preload();
    for _ in 0..200 {
        if hasher.load_settled() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(hasher.has_native());
}

#[tokio::test]
async fn module_loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("perf_tools_bg.wat");
    std::fs::write(&path, NGRAM_HASH_WAT).unwrap();
    let hasher = SemanticHasher::new(Box::new(FileSource(path)));
    assert!(hasher.load_native().await);
}

#[tokio::test]
async fn native_and_pure_hashers_rank_identically() {
    let pure = VectorStore::default();
    let native_hasher = Arc::new(SemanticHasher::new(Box::new(StaticSource::new(NGRAM_HASH_WAT))));
    let mut native = VectorStore::new(native_hasher);

    let mut pure = pure;
    pure.add_documents(sample_documents());
    native.add_documents(sample_documents());

    let query = "capsid engineering for liver";
    let expected = pure.hybrid_search(query, 6, DEFAULT_ALPHA);
    let actual = native
        .hybrid_search_ready(query, 6, DEFAULT_ALPHA, Duration::from_secs(5))
        .await;

    assert!(native.hasher().has_native());
    assert_eq!(expected.len(), actual.len());
    for (e, a) in expected.iter().zip(&actual) {
        assert_eq!(e.id, a.id);
        assert!((e.score - a.score).abs() < 1e-5);
    }
}
