use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use anyhow::{anyhow, ensure, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use docqa_core::error::Error;
use docqa_core::traits::Embedder;

use crate::pool::masked_mean_l2;
use crate::tokenize::encode;

pub struct TransformerEmbedder {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
}

pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        if let Ok(dev) = Device::new_metal(0) {
            info!(device = "metal", "embedding device selected");
            return dev;
        }
    }
    info!(device = "cpu", "embedding device selected");
    Device::Cpu
}

impl TransformerEmbedder {
    /// Loads `tokenizer.json`, `config.json` and either `model.safetensors`
    /// or `pytorch_model.bin` from `model_dir`.
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        ensure!(max_len > 0, "max_len must be at least 1");
        let device = select_device();
        info!(dir = %model_dir.display(), "loading embedding model");
        let vb = load_weights(model_dir, &device)?;

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path).with_context(|| format!("reading {}", config_path.display()))?;
        let config: XLMRobertaConfig = serde_json::from_str(&raw)?;
        let model = XLMRobertaModel::new(&config, vb)?;
        info!(dim = config.hidden_size, "embedding model loaded");
        Ok(Self { model, tokenizer, device, dim: config.hidden_size, max_len })
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let inputs = encode(&self.tokenizer, text, self.max_len, &self.device)?;
        let hidden = self.model.forward(
            &inputs.input_ids,
            &inputs.attention_mask,
            &inputs.token_type_ids,
            None,
            None,
            None,
        )?;
        let pooled: Tensor = masked_mean_l2(&hidden, &inputs.attention_mask)?;
        let v = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1::<f32>()?;
        ensure!(v.len() == self.dim, "model produced {} dims, expected {}", v.len(), self.dim);
        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "embedded text");
        Ok(v)
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        let bytes = std::fs::read(&safetensors).with_context(|| format!("reading {}", safetensors.display()))?;
        return Ok(VarBuilder::from_buffered_safetensors(bytes, DType::F32, device)?);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    ensure!(pickle.exists(), "no model.safetensors or pytorch_model.bin in {}", model_dir.display());
    let weights: HashMap<String, Tensor> = candle_core::pickle::read_all(&pickle)?.into_iter().collect();
    Ok(VarBuilder::from_tensors(weights, DType::F32, device))
}

impl Embedder for TransformerEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> docqa_core::Result<Vec<f32>> {
        self.embed_one(text).map_err(|e| Error::Embedding(format!("{:#}", e)))
    }
}
