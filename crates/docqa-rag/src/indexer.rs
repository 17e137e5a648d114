//! Index build: embed every chunk, recreate the index, bulk-write.
//!
//! Embedding runs on the blocking pool with at most `workers` calls in
//! flight; results keep chunk order. The live index is only touched once at
//! least one chunk has a usable vector.

use std::slice;
use std::sync::Arc;

use futures::{stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use docqa_core::config::IndexingConfig;
use docqa_core::error::{Error, Result};
use docqa_core::traits::{Embedder, VectorStore};
use docqa_core::types::{Chunk, IndexReport, IndexedChunk};

pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    config: IndexingConfig,
    show_progress: bool,
}

impl Indexer {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>, config: IndexingConfig) -> Self {
        Self { embedder, store, config, show_progress: false }
    }

    /// Draw a progress bar on stderr while embedding.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub async fn build_index(&self, chunks: &[Chunk]) -> Result<IndexReport> {
        let dim = self.embedder.dim();
        let mut report = IndexReport { dimension: dim, ..IndexReport::default() };

        let vectors = self.embed_all(chunks).await;
        let mut records = Vec::with_capacity(chunks.len());
        for (chunk, vector) in chunks.iter().zip(vectors) {
            match vector {
                Ok(embedding) => records.push(IndexedChunk { chunk: chunk.clone(), embedding }),
                Err(e) => {
                    warn!(kind = e.kind(), source_id = %chunk.source_id, sequence_index = chunk.sequence_index, error = %e, "skipping chunk");
                    report.embedding_failures += 1;
                }
            }
        }
        if !chunks.is_empty() && records.is_empty() {
            return Err(Error::Embedding(format!("all {} chunks failed to embed", chunks.len())));
        }

        match self.store.declared_dimension().await? {
            Some(previous) if previous != dim => info!(previous, dim, "index dimension changed"),
            _ => {}
        }
        self.store.recreate_index(dim).await?;

        for batch in records.chunks(self.config.batch_size.max(1)) {
            match self.store.write_batch(batch).await {
                Ok(()) => report.indexed += batch.len(),
                Err(e @ Error::IndexWrite { .. }) => {
                    warn!(kind = e.kind(), error = %e, "batch rejected, retrying record by record");
                    self.write_one_by_one(batch, &mut report).await?;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            dim,
            indexed = report.indexed,
            embedding_failures = report.embedding_failures,
            write_failures = report.write_failures,
            "index build finished"
        );
        Ok(report)
    }

    async fn write_one_by_one(&self, batch: &[IndexedChunk], report: &mut IndexReport) -> Result<()> {
        for record in batch {
            match self.store.write_batch(slice::from_ref(record)).await {
                Ok(()) => report.indexed += 1,
                Err(e @ Error::IndexWrite { .. }) => {
                    warn!(kind = e.kind(), source_id = %record.chunk.source_id, sequence_index = record.chunk.sequence_index, error = %e, "record rejected");
                    report.write_failures += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn embed_all(&self, chunks: &[Chunk]) -> Vec<Result<Vec<f32>>> {
        let pb = self.progress_bar(chunks.len());
        let dim = self.embedder.dim();
        let results = stream::iter(chunks.iter().map(|c| c.text.clone()))
            .map(|text| {
                let embedder = Arc::clone(&self.embedder);
                async move {
                    let vector = match tokio::task::spawn_blocking(move || embedder.embed(&text)).await {
                        Ok(result) => result?,
                        Err(e) => return Err(Error::Embedding(format!("embedding task failed: {}", e))),
                    };
                    if vector.len() != dim {
                        return Err(Error::Embedding(format!("got {} dims, embedder declares {}", vector.len(), dim)));
                    }
                    Ok(vector)
                }
            })
            .buffered(self.config.workers.max(1))
            .inspect(|_| pb.inc(1))
            .collect::<Vec<_>>()
            .await;
        pb.finish_and_clear();
        results
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message("embedding");
        pb
    }
}
