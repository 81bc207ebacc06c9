use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

use docqa_core::{Error, Result};

/// Encode `text`, truncate to `max_len` tokens and return `[1, T]` id and mask tensors.
pub fn tokenize_on_device(tokenizer: &Tokenizer, text: &str, max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let enc = tokenizer.encode(text, true).map_err(|e| Error::embedding(format!("tokenization failed: {e}")))?;
    let mut ids = enc.get_ids().to_vec();
    let mut mask = enc.get_attention_mask().to_vec();
    if ids.len() > max_len {
        ids.truncate(max_len);
        mask.truncate(max_len);
    }
    let to_tensor = |values: &[u32]| Tensor::new(values, device).and_then(|t| t.unsqueeze(0));
    let input_ids = to_tensor(&ids).map_err(|e| Error::embedding(e.to_string()))?;
    let attention_mask = to_tensor(&mask).map_err(|e| Error::embedding(e.to_string()))?;
    Ok((input_ids, attention_mask))
}
