use std::sync::Arc;

use tracing::debug;

use docqa_core::config::RetrievalConfig;
use docqa_core::error::{Error, Result};
use docqa_core::traits::{Embedder, VectorStore};
use docqa_core::types::RetrievalHit;

/// Embeds a query and runs k-NN over the whole index.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>, config: RetrievalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { embedder, store, config })
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievalHit>> {
        self.retrieve_with(query, self.config.top_k, self.config.num_candidates).await
    }

    /// Up to `top_k` hits by descending score. A blank query yields none
    /// and never reaches the embedder or the store.
    pub async fn retrieve_with(&self, query: &str, top_k: usize, num_candidates: usize) -> Result<Vec<RetrievalHit>> {
        RetrievalConfig { top_k, num_candidates }.validate()?;
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let embedder = Arc::clone(&self.embedder);
        let text = query.to_string();
        let vector = tokio::task::spawn_blocking(move || embedder.embed(&text))
            .await
            .map_err(|e| Error::Embedding(format!("query embedding task failed: {}", e)))??;
        let hits = self.store.search(&vector, top_k, num_candidates).await.map_err(|e| match e {
            Error::Retrieval(_) => e,
            other => Error::Retrieval(other.to_string()),
        })?;
        debug!(hits = hits.len(), top_k, num_candidates, "retrieved");
        Ok(hits)
    }
}
