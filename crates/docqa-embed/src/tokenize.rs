use anyhow::{anyhow, ensure, Result};
use candle_core::{DType, Device, Tensor};
use tokenizers::Tokenizer;

/// Model inputs for a single text, each shaped `[1, T]`.
pub struct Encoded {
    pub input_ids: Tensor,
    pub attention_mask: Tensor,
    pub token_type_ids: Tensor,
}

/// Encodes `text` with special tokens, truncated to at most `max_len` tokens.
///
/// A single sequence needs no padding, so `T` is the truncated token count.
pub fn encode(tokenizer: &Tokenizer, text: &str, max_len: usize, device: &Device) -> Result<Encoded> {
    let enc = tokenizer.encode(text, true).map_err(|e| anyhow!("tokenization failed: {}", e))?;
    let len = enc.get_ids().len().min(max_len);
    ensure!(len > 0, "tokenizer produced no tokens");
    let ids = enc.get_ids()[..len].to_vec();
    let mask = enc.get_attention_mask()[..len].to_vec();
    Ok(Encoded {
        input_ids: Tensor::from_iter(ids, device)?.reshape((1, len))?,
        attention_mask: Tensor::from_iter(mask, device)?.reshape((1, len))?,
        token_type_ids: Tensor::zeros((1, len), DType::I64, device)?,
    })
}
