//! Embedding collaborators.
//!
//! [`HashEmbedder`] gives deterministic vectors without model files and backs
//! tests and offline runs. [`TransformerEmbedder`] runs a local XLM-RoBERTa
//! family model through candle with masked mean pooling and L2 normalization.

use std::sync::Arc;

use docqa_core::config::{expand_path, EmbeddingConfig, EmbeddingProvider};
use docqa_core::error::{Error, Result};
use docqa_core::traits::Embedder;

pub mod hash;
pub mod pool;
pub mod tokenize;
pub mod transformer;

pub use hash::HashEmbedder;
pub use pool::masked_mean_l2;
pub use transformer::TransformerEmbedder;

/// Builds the embedder selected by `embedding.provider`.
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider {
        EmbeddingProvider::Hash => Ok(Arc::new(HashEmbedder::new(config.dim)?)),
        EmbeddingProvider::Transformer => {
            let dir = config
                .model_dir
                .as_deref()
                .ok_or_else(|| Error::InvalidConfig("embedding.model_dir is required for the transformer provider".into()))?;
            let model = TransformerEmbedder::load(&expand_path(dir), config.max_len)
                .map_err(|e| Error::Embedding(format!("failed to load model from {}: {:#}", dir, e)))?;
            Ok(Arc::new(model))
        }
    }
}
