mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use docqa_core::config::IndexingConfig;
use docqa_core::traits::VectorStore;
use docqa_core::types::Chunk;
use docqa_rag::Indexer;

use common::{hash_embedder, FlakyStore, PickyEmbedder};

fn chunk(source: &str, seq: usize, text: &str) -> Chunk {
    Chunk { source_id: source.into(), text: text.into(), sequence_index: seq, char_offset: 0 }
}

fn config(batch_size: usize) -> IndexingConfig {
    IndexingConfig { workers: 3, batch_size }
}

#[tokio::test]
async fn every_chunk_is_indexed_in_batches() {
    let store = Arc::new(FlakyStore::default());
    let chunks: Vec<Chunk> = (0..10).map(|i| chunk("doc", i, &format!("passage number {i}"))).collect();
    let report = Indexer::new(hash_embedder(32), store.clone(), config(4)).build_index(&chunks).await.unwrap();

    assert_eq!(report.dimension, 32);
    assert_eq!(report.indexed, 10);
    assert_eq!(report.embedding_failures, 0);
    assert_eq!(store.batches.load(Ordering::SeqCst), 3);
    assert_eq!(store.inner.len().await, 10);
}

#[tokio::test]
async fn failed_embeddings_are_skipped() {
    let store = Arc::new(FlakyStore::default());
    let embedder = Arc::new(PickyEmbedder::new(16, "garbled"));
    let chunks = vec![chunk("a", 0, "customs rules"), chunk("a", 1, "garbled bytes"), chunk("b", 0, "duty free")];
    let report = Indexer::new(embedder.clone(), store.clone(), config(256)).build_index(&chunks).await.unwrap();

    assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
    assert_eq!(report.indexed, 2);
    assert_eq!(report.embedding_failures, 1);
    assert_eq!(store.inner.len().await, 2);
}

#[tokio::test]
async fn all_embeddings_failing_leaves_the_live_index_alone() {
    let store = Arc::new(FlakyStore::default());
    let seed = Indexer::new(hash_embedder(16), store.clone(), config(256));
    seed.build_index(&[chunk("old", 0, "previous corpus")]).await.unwrap();

    let embedder = Arc::new(PickyEmbedder::new(16, "x"));
    let err = Indexer::new(embedder, store.clone(), config(256))
        .build_index(&[chunk("a", 0, "x1"), chunk("a", 1, "x2")])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "embedding_failure");
    assert_eq!(store.recreated.load(Ordering::SeqCst), 1);
    assert_eq!(store.inner.len().await, 1);
}

#[tokio::test]
async fn rebuilding_replaces_contents_and_follows_the_new_dimension() {
    let store = Arc::new(FlakyStore::default());
    Indexer::new(hash_embedder(8), store.clone(), config(256))
        .build_index(&[chunk("a", 0, "one"), chunk("a", 1, "two")])
        .await
        .unwrap();
    assert_eq!(store.declared_dimension().await.unwrap(), Some(8));

    let report = Indexer::new(hash_embedder(24), store.clone(), config(256))
        .build_index(&[chunk("b", 0, "three")])
        .await
        .unwrap();
    assert_eq!(report.dimension, 24);
    assert_eq!(store.declared_dimension().await.unwrap(), Some(24));
    assert_eq!(store.inner.len().await, 1);
}

#[tokio::test]
async fn empty_input_still_recreates_an_empty_index() {
    let store = Arc::new(FlakyStore::default());
    let report = Indexer::new(hash_embedder(12), store.clone(), config(256)).build_index(&[]).await.unwrap();
    assert_eq!(report.indexed, 0);
    assert_eq!(store.declared_dimension().await.unwrap(), Some(12));
}

#[tokio::test]
async fn rejected_batch_falls_back_to_single_records() {
    let store = Arc::new(FlakyStore { reject_marker: Some("conflict"), ..FlakyStore::default() });
    let chunks = vec![chunk("a", 0, "fine one"), chunk("a", 1, "conflict here"), chunk("a", 2, "fine two")];
    let report = Indexer::new(hash_embedder(16), store.clone(), config(256)).build_index(&chunks).await.unwrap();

    assert_eq!(report.indexed, 2);
    assert_eq!(report.write_failures, 1);
    // one rejected batch, then three single-record writes
    assert_eq!(store.batches.load(Ordering::SeqCst), 4);
    assert_eq!(store.inner.len().await, 2);
}

#[tokio::test]
async fn lost_connection_aborts_the_run() {
    let store = Arc::new(FlakyStore::default());
    store.connection_lost.store(true, Ordering::SeqCst);
    let err = Indexer::new(hash_embedder(16), store, config(1))
        .build_index(&[chunk("a", 0, "one"), chunk("a", 1, "two")])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "indexing_failure");
}

#[tokio::test]
async fn index_creation_failure_stops_before_any_write() {
    let store = Arc::new(FlakyStore::default());
    store.fail_create.store(true, Ordering::SeqCst);
    let err = Indexer::new(hash_embedder(16), store.clone(), config(256))
        .build_index(&[chunk("a", 0, "one"), chunk("a", 1, "two")])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "index_creation_failure");
    assert_eq!(store.recreated.load(Ordering::SeqCst), 1);
    assert_eq!(store.batches.load(Ordering::SeqCst), 0);
    assert_eq!(store.inner.len().await, 0);
}
