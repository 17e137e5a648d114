use async_trait::async_trait;
use tokio::sync::RwLock;

use docqa_core::error::{Error, Result};
use docqa_core::traits::VectorStore;
use docqa_core::types::{IndexedChunk, RetrievalHit};

use crate::rank;

#[derive(Default)]
struct MemIndex {
    dim: usize,
    records: Vec<IndexedChunk>,
}

/// Exact cosine search over records held in memory.
#[derive(Default)]
pub struct InMemoryVectorStore {
    index: RwLock<Option<MemIndex>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.index.read().await.as_ref().map_or(0, |i| i.records.len())
    }
}

pub(crate) fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn declared_dimension(&self) -> Result<Option<usize>> {
        Ok(self.index.read().await.as_ref().map(|i| i.dim))
    }

    async fn recreate_index(&self, dim: usize) -> Result<()> {
        *self.index.write().await = Some(MemIndex { dim, records: Vec::new() });
        Ok(())
    }

    async fn write_batch(&self, records: &[IndexedChunk]) -> Result<()> {
        let mut guard = self.index.write().await;
        let index = guard.as_mut().ok_or_else(|| Error::Indexing("index does not exist".into()))?;
        if let Some(bad) = records.iter().find(|r| r.embedding.len() != index.dim) {
            return Err(Error::IndexWrite {
                count: records.len(),
                reason: format!("embedding has {} dims, index expects {}", bad.embedding.len(), index.dim),
            });
        }
        index.records.extend_from_slice(records);
        Ok(())
    }

    // exact search: every record is a candidate
    async fn search(&self, query: &[f32], top_k: usize, _num_candidates: usize) -> Result<Vec<RetrievalHit>> {
        let guard = self.index.read().await;
        let Some(index) = guard.as_ref() else { return Ok(Vec::new()) };
        if query.len() != index.dim {
            return Err(Error::Retrieval(format!("query has {} dims, index expects {}", query.len(), index.dim)));
        }
        let scored = index
            .records
            .iter()
            .enumerate()
            .map(|(ordinal, r)| (ordinal as i64, RetrievalHit { chunk: r.chunk.clone(), score: cosine(query, &r.embedding) }))
            .collect::<Vec<_>>();
        Ok(rank(scored, top_k))
    }
}
