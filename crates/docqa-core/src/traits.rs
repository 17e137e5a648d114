use async_trait::async_trait;

use crate::error::Result;
use crate::types::{GenerationRequest, IndexedChunk, RetrievalHit};

/// Maps text to a fixed-length vector. Implementations are CPU or
/// blocking-IO bound and are called from the blocking pool at index time.
pub trait Embedder: Send + Sync {
    /// Output dimensionality `D`, identical for every call.
    fn dim(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Persists indexed chunks and serves whole-index k-NN search.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Dimension of the live index, `None` when no index exists.
    async fn declared_dimension(&self) -> Result<Option<usize>>;

    /// Drops any existing index and creates an empty one of dimension `dim`
    /// in a single step.
    async fn recreate_index(&self, dim: usize) -> Result<()>;

    /// Appends records in the given order.
    async fn write_batch(&self, records: &[IndexedChunk]) -> Result<()>;

    /// Up to `top_k` hits by descending score, ties in insertion order.
    async fn search(&self, query: &[f32], top_k: usize, num_candidates: usize) -> Result<Vec<RetrievalHit>>;
}

/// Free-text generation service.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}
