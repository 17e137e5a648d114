#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docqa_core::error::{Error, Result};
use docqa_core::traits::{Embedder, Generator, VectorStore};
use docqa_core::types::{GenerationRequest, IndexedChunk, RetrievalHit};
use docqa_embed::HashEmbedder;
use docqa_vector::InMemoryVectorStore;

/// Hash embedder that fails for any text containing `poison`.
pub struct PickyEmbedder {
    inner: HashEmbedder,
    poison: &'static str,
    pub calls: AtomicUsize,
}

impl PickyEmbedder {
    pub fn new(dim: usize, poison: &'static str) -> Self {
        Self { inner: HashEmbedder::new(dim).unwrap(), poison, calls: AtomicUsize::new(0) }
    }
}

impl Embedder for PickyEmbedder {
    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.contains(self.poison) {
            return Err(Error::Embedding(format!("cannot embed '{}'", text)));
        }
        self.inner.embed(text)
    }
}

/// In-memory store that can refuse to create the index, reject batches, lose
/// its connection or go down for queries.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryVectorStore,
    pub reject_marker: Option<&'static str>,
    pub fail_create: AtomicBool,
    pub connection_lost: AtomicBool,
    pub search_down: AtomicBool,
    pub batches: AtomicUsize,
    pub recreated: AtomicUsize,
}

#[async_trait]
impl VectorStore for FlakyStore {
    async fn declared_dimension(&self) -> Result<Option<usize>> {
        self.inner.declared_dimension().await
    }

    async fn recreate_index(&self, dim: usize) -> Result<()> {
        self.recreated.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Error::IndexCreation { index: "flaky".into(), reason: "disk full".into() });
        }
        self.inner.recreate_index(dim).await
    }

    async fn write_batch(&self, records: &[IndexedChunk]) -> Result<()> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        if self.connection_lost.load(Ordering::SeqCst) {
            return Err(Error::Indexing("connection reset".into()));
        }
        if let Some(marker) = self.reject_marker {
            if records.iter().any(|r| r.chunk.text.contains(marker)) {
                return Err(Error::IndexWrite { count: records.len(), reason: "mapping conflict".into() });
            }
        }
        self.inner.write_batch(records).await
    }

    async fn search(&self, query: &[f32], top_k: usize, num_candidates: usize) -> Result<Vec<RetrievalHit>> {
        if self.search_down.load(Ordering::SeqCst) {
            return Err(Error::StoreUnavailable("connection refused".into()));
        }
        self.inner.search(query, top_k, num_candidates).await
    }
}

/// Returns the user turn it was given, so answers contain the context.
#[derive(Default)]
pub struct EchoGenerator {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Generator for EchoGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(request.user_message())
    }
}

pub struct SlowGenerator(pub Duration);

#[async_trait]
impl Generator for SlowGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        tokio::time::sleep(self.0).await;
        Ok("too late".into())
    }
}

pub struct FailingGenerator(pub fn() -> Error);

#[async_trait]
impl Generator for FailingGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        Err((self.0)())
    }
}

pub fn hash_embedder(dim: usize) -> Arc<dyn Embedder> {
    Arc::new(HashEmbedder::new(dim).unwrap())
}
