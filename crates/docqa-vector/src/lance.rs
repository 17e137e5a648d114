//! LanceDB-backed index.
//!
//! One table per index name. Recreating the index overwrites the table in a
//! single create call, so readers see either the old table or the new empty
//! one. Every row carries an insertion `ordinal` used to break score ties.

use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::types::{Float32Type, Int32Type, Int64Type};
use arrow_array::{Array, FixedSizeListArray, Int32Array, Int64Array, RecordBatch, RecordBatchIterator, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::database::CreateTableMode;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, DistanceType};
use tokio::sync::Mutex;
use tracing::{debug, info};

use docqa_core::error::{Error, Result};
use docqa_core::traits::VectorStore;
use docqa_core::types::{Chunk, IndexedChunk, RetrievalHit};

use crate::rank;
use crate::schema::{self, chunk_schema, embedding_dim};

#[derive(Debug, Default)]
struct WriteState {
    dim: Option<usize>,
    next_ordinal: i64,
}

pub struct LanceVectorStore {
    db: Connection,
    index_name: String,
    state: Mutex<WriteState>,
}

impl LanceVectorStore {
    /// Connects to the database at `uri` and picks up an existing index.
    pub async fn open(uri: &str, index_name: &str) -> Result<Self> {
        let db = connect(uri).execute().await.map_err(|e| Error::StoreUnavailable(format!("{}: {}", uri, e)))?;
        let store = Self { db, index_name: index_name.to_string(), state: Mutex::new(WriteState::default()) };
        if store.table_exists().await.map_err(|e| Error::StoreUnavailable(e.to_string()))? {
            let table = store.open_table().await.map_err(|e| Error::StoreUnavailable(e.to_string()))?;
            let rows = table.count_rows(None).await.map_err(|e| Error::StoreUnavailable(e.to_string()))?;
            let table_schema = table.schema().await.map_err(|e| Error::StoreUnavailable(e.to_string()))?;
            let mut state = store.state.lock().await;
            state.dim = embedding_dim(&table_schema);
            state.next_ordinal = i64::try_from(rows).unwrap_or(i64::MAX);
            info!(index = %store.index_name, rows, dim = ?state.dim, "opened existing index");
        }
        Ok(store)
    }

    async fn table_exists(&self) -> lancedb::Result<bool> {
        Ok(self.db.table_names().execute().await?.contains(&self.index_name))
    }

    async fn open_table(&self) -> lancedb::Result<lancedb::Table> {
        self.db.open_table(&self.index_name).execute().await
    }

    fn to_record_batch(records: &[IndexedChunk], first_ordinal: i64, dim: usize) -> Result<RecordBatch> {
        let write_error = |reason: String| Error::IndexWrite { count: records.len(), reason };
        let width = i32::try_from(dim).map_err(|_| write_error(format!("dimension {} does not fit the schema", dim)))?;
        let mut ordinals = Vec::with_capacity(records.len());
        let mut source_ids = Vec::with_capacity(records.len());
        let mut texts = Vec::with_capacity(records.len());
        let mut sequence_indices = Vec::with_capacity(records.len());
        let mut char_offsets = Vec::with_capacity(records.len());
        let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(records.len());
        for (i, r) in records.iter().enumerate() {
            let ordinal = i64::try_from(i)
                .ok()
                .and_then(|i| first_ordinal.checked_add(i))
                .ok_or_else(|| write_error("ordinal overflow".into()))?;
            let sequence_index = i32::try_from(r.chunk.sequence_index).map_err(|_| {
                write_error(format!("sequence_index {} of '{}' out of range", r.chunk.sequence_index, r.chunk.source_id))
            })?;
            let char_offset = i64::try_from(r.chunk.char_offset).map_err(|_| {
                write_error(format!("char_offset {} of '{}' out of range", r.chunk.char_offset, r.chunk.source_id))
            })?;
            ordinals.push(ordinal);
            source_ids.push(r.chunk.source_id.as_str());
            texts.push(r.chunk.text.as_str());
            sequence_indices.push(sequence_index);
            char_offsets.push(char_offset);
            vectors.push(Some(r.embedding.iter().map(|&x| Some(x)).collect()));
        }
        RecordBatch::try_new(
            chunk_schema(width),
            vec![
                Arc::new(Int64Array::from(ordinals)),
                Arc::new(StringArray::from(source_ids)),
                Arc::new(StringArray::from(texts)),
                Arc::new(Int32Array::from(sequence_indices)),
                Arc::new(Int64Array::from(char_offsets)),
                Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors.into_iter(), width)),
            ],
        )
        .map_err(|e| write_error(e.to_string()))
    }
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Arc<dyn Array>> {
    batch.column_by_name(name).ok_or_else(|| Error::Retrieval(format!("result is missing column '{}'", name)))
}

fn hits_from_batch(batch: &RecordBatch, out: &mut Vec<(i64, RetrievalHit)>) -> Result<()> {
    let ordinals = column(batch, schema::ORDINAL)?.as_primitive_opt::<Int64Type>();
    let source_ids = column(batch, schema::SOURCE_ID)?.as_string_opt::<i32>();
    let texts = column(batch, schema::TEXT)?.as_string_opt::<i32>();
    let sequence_indices = column(batch, schema::SEQUENCE_INDEX)?.as_primitive_opt::<Int32Type>();
    let char_offsets = column(batch, schema::CHAR_OFFSET)?.as_primitive_opt::<Int64Type>();
    let distances = column(batch, "_distance")?.as_primitive_opt::<Float32Type>();
    let (Some(ordinals), Some(source_ids), Some(texts), Some(sequence_indices), Some(char_offsets), Some(distances)) =
        (ordinals, source_ids, texts, sequence_indices, char_offsets, distances)
    else {
        return Err(Error::Retrieval("unexpected column types in search result".into()));
    };
    for i in 0..batch.num_rows() {
        let chunk = Chunk {
            source_id: source_ids.value(i).to_string(),
            text: texts.value(i).to_string(),
            sequence_index: usize::try_from(sequence_indices.value(i)).unwrap_or(0),
            char_offset: usize::try_from(char_offsets.value(i)).unwrap_or(0),
        };
        // cosine distance is 1 - similarity
        let distance = distances.value(i);
        let score = if distance.is_nan() { 0.0 } else { 1.0 - distance };
        out.push((ordinals.value(i), RetrievalHit { chunk, score }));
    }
    Ok(())
}

#[async_trait]
impl VectorStore for LanceVectorStore {
    async fn declared_dimension(&self) -> Result<Option<usize>> {
        if !self.table_exists().await.map_err(|e| Error::StoreUnavailable(e.to_string()))? {
            return Ok(None);
        }
        let table = self.open_table().await.map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        let table_schema = table.schema().await.map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        Ok(embedding_dim(&table_schema))
    }

    async fn recreate_index(&self, dim: usize) -> Result<()> {
        let creation_error = |reason: String| Error::IndexCreation { index: self.index_name.clone(), reason };
        let width = i32::try_from(dim).map_err(|_| creation_error(format!("dimension {} out of range", dim)))?;
        let mut state = self.state.lock().await;
        self.db
            .create_empty_table(&self.index_name, chunk_schema(width))
            .mode(CreateTableMode::Overwrite)
            .execute()
            .await
            .map_err(|e| creation_error(e.to_string()))?;
        *state = WriteState { dim: Some(dim), next_ordinal: 0 };
        info!(index = %self.index_name, dim, "index recreated");
        Ok(())
    }

    async fn write_batch(&self, records: &[IndexedChunk]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let mut state = self.state.lock().await;
        let dim = state.dim.ok_or_else(|| Error::Indexing(format!("index '{}' does not exist", self.index_name)))?;
        if let Some(bad) = records.iter().find(|r| r.embedding.len() != dim) {
            return Err(Error::IndexWrite {
                count: records.len(),
                reason: format!("embedding has {} dims, index expects {}", bad.embedding.len(), dim),
            });
        }
        let table = self.open_table().await.map_err(|e| Error::Indexing(e.to_string()))?;
        let batch = Self::to_record_batch(records, state.next_ordinal, dim)?;
        let next_ordinal = i64::try_from(batch.num_rows())
            .ok()
            .and_then(|n| state.next_ordinal.checked_add(n))
            .ok_or_else(|| Error::IndexWrite { count: records.len(), reason: "ordinal overflow".into() })?;
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| Error::IndexWrite { count: records.len(), reason: e.to_string() })?;
        state.next_ordinal = next_ordinal;
        debug!(index = %self.index_name, written = records.len(), "batch written");
        Ok(())
    }

    async fn search(&self, query: &[f32], top_k: usize, num_candidates: usize) -> Result<Vec<RetrievalHit>> {
        if !self.table_exists().await.map_err(|e| Error::Retrieval(e.to_string()))? {
            return Ok(Vec::new());
        }
        let table = self.open_table().await.map_err(|e| Error::Retrieval(e.to_string()))?;
        if table.count_rows(None).await.map_err(|e| Error::Retrieval(e.to_string()))? == 0 {
            return Ok(Vec::new());
        }
        let mut stream = table
            .vector_search(query.to_vec())
            .map_err(|e| Error::Retrieval(e.to_string()))?
            .column(schema::EMBEDDING)
            .distance_type(DistanceType::Cosine)
            .limit(num_candidates.max(top_k))
            .execute()
            .await
            .map_err(|e| Error::Retrieval(e.to_string()))?;
        let mut candidates = Vec::new();
        while let Some(batch) = stream.try_next().await.map_err(|e| Error::Retrieval(e.to_string()))? {
            hits_from_batch(&batch, &mut candidates)?;
        }
        Ok(rank(candidates, top_k))
    }
}
