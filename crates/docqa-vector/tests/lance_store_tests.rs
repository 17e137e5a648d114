use docqa_core::traits::VectorStore;
use docqa_core::types::{Chunk, IndexedChunk};
use docqa_vector::LanceVectorStore;

fn record(source: &str, seq: usize, embedding: Vec<f32>) -> IndexedChunk {
    IndexedChunk {
        chunk: Chunk { source_id: source.into(), text: format!("text of {source}"), sequence_index: seq, char_offset: seq * 10 },
        embedding,
    }
}

#[tokio::test]
async fn missing_table_reads_as_empty_index() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = LanceVectorStore::open(&tmp.path().to_string_lossy(), "customs-docs-v1").await?;
    assert_eq!(store.declared_dimension().await?, None);
    assert!(store.search(&[1.0, 0.0, 0.0], 3, 10).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn write_then_search_round_trips_chunk_fields() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = LanceVectorStore::open(&tmp.path().to_string_lossy(), "docs").await?;
    store.recreate_index(3).await?;
    assert!(store.search(&[1.0, 0.0, 0.0], 3, 10).await?.is_empty());
    store
        .write_batch(&[
            record("doc1", 0, vec![1.0, 0.0, 0.0]),
            record("doc2", 1, vec![0.0, 1.0, 0.0]),
            record("doc3", 2, vec![0.7, 0.7, 0.0]),
        ])
        .await?;

    let hits = store.search(&[1.0, 0.0, 0.0], 2, 10).await?;
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].chunk, record("doc1", 0, vec![]).chunk);
    assert!((hits[0].score - 1.0).abs() < 1e-4, "score {}", hits[0].score);
    assert_eq!(hits[1].chunk.source_id, "doc3");
    Ok(())
}

#[tokio::test]
async fn equal_scores_keep_insertion_order_across_batches() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = LanceVectorStore::open(&tmp.path().to_string_lossy(), "docs").await?;
    store.recreate_index(2).await?;
    store.write_batch(&[record("a", 0, vec![0.6, 0.8]), record("b", 1, vec![0.6, 0.8])]).await?;
    store.write_batch(&[record("c", 2, vec![0.6, 0.8])]).await?;
    let hits = store.search(&[0.6, 0.8], 3, 10).await?;
    let ids: Vec<&str> = hits.iter().map(|h| h.chunk.source_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    Ok(())
}

#[tokio::test]
async fn recreate_with_new_dimension_drops_old_rows() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let uri = tmp.path().to_string_lossy().to_string();
    let store = LanceVectorStore::open(&uri, "docs").await?;
    store.recreate_index(2).await?;
    store.write_batch(&[record("old", 0, vec![1.0, 0.0])]).await?;

    store.recreate_index(4).await?;
    assert_eq!(store.declared_dimension().await?, Some(4));
    assert!(store.search(&[1.0, 0.0, 0.0, 0.0], 3, 10).await?.is_empty());

    store.write_batch(&[record("new", 0, vec![0.0, 0.0, 1.0, 0.0])]).await?;
    let reopened = LanceVectorStore::open(&uri, "docs").await?;
    assert_eq!(reopened.declared_dimension().await?, Some(4));
    let hits = reopened.search(&[0.0, 0.0, 1.0, 0.0], 3, 10).await?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk.source_id, "new");
    Ok(())
}

#[tokio::test]
async fn mismatched_record_width_is_rejected_before_writing() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = LanceVectorStore::open(&tmp.path().to_string_lossy(), "docs").await?;
    let err = store.write_batch(&[record("x", 0, vec![1.0, 0.0])]).await.unwrap_err();
    assert_eq!(err.kind(), "indexing_failure");

    store.recreate_index(2).await?;
    let err = store.write_batch(&[record("x", 0, vec![1.0, 0.0, 0.0])]).await.unwrap_err();
    assert_eq!(err.kind(), "index_write_failure");
    Ok(())
}

#[tokio::test]
async fn out_of_range_sequence_index_is_a_write_failure() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = LanceVectorStore::open(&tmp.path().to_string_lossy(), "docs").await?;
    store.recreate_index(2).await?;
    let mut oversized = record("big", 0, vec![1.0, 0.0]);
    oversized.chunk.sequence_index = i32::MAX as usize + 1;

    let err = store.write_batch(&[record("ok", 0, vec![0.0, 1.0]), oversized]).await.unwrap_err();
    assert_eq!(err.kind(), "index_write_failure");
    assert!(store.search(&[1.0, 0.0], 5, 10).await?.is_empty());

    store.write_batch(&[record("ok", 0, vec![0.0, 1.0])]).await?;
    assert_eq!(store.search(&[0.0, 1.0], 5, 10).await?.len(), 1);
    Ok(())
}
