use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use docqa_core::traits::Embedder;
use docqa_core::{Error, Result};

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_on_device;

/// Sentence encoder for BERT-family checkpoints (e.g. all-MiniLM-L6-v2),
/// pooled with a masked mean and L2-normalized.
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    model_id: String,
    dim: usize,
    max_len: usize,
}

impl BertEmbedder {
    /// Load `config.json`, `tokenizer.json` and the weights from `model_dir`.
    pub fn load(model_id: &str, model_dir: &Path, max_len: usize) -> Result<Self> {
        if !model_dir.is_dir() {
            return Err(Error::NotFound(format!("embedding model directory {}", model_dir.display())));
        }
        let device = select_device();
        info!(model = model_id, dir = %model_dir.display(), "loading embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| Error::embedding(format!("failed to load tokenizer from {}: {}", tokenizer_path.display(), e)))?;
        let config_path = model_dir.join("config.json");
        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)
            .map_err(|e| Error::embedding(format!("invalid model config {}: {}", config_path.display(), e)))?;

        let weights = read_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = BertModel::load(vb, &config).map_err(candle_err)?;
        let dim = config.hidden_size;
        info!(model = model_id, dim, "embedding model loaded");
        Ok(Self { model, tokenizer, device, model_id: model_id.to_string(), dim, max_len })
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_on_device(&self.tokenizer, text, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like().map_err(candle_err)?;
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(candle_err)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask).map_err(candle_err)?;
        let vector = pooled
            .to_device(&Device::Cpu)
            .and_then(|t| t.squeeze(0))
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(candle_err)?;
        if vector.len() != self.dim {
            return Err(Error::embedding(format!("model produced {} values, expected {}", vector.len(), self.dim)));
        }
        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "embedded text");
        Ok(vector)
    }
}

impl Embedder for BertEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }
    fn dim(&self) -> usize {
        self.dim
    }
    fn max_len(&self) -> usize {
        self.max_len
    }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_one(t)).collect()
    }
}

/// Prefer `model.safetensors`, fall back to a pickled `pytorch_model.bin`.
pub(crate) fn read_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return candle_core::safetensors::load(&safetensors, device).map_err(candle_err);
    }
    let pickle: PathBuf = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        let tensors = candle_core::pickle::read_all(&pickle).map_err(candle_err)?;
        return Ok(tensors.into_iter().collect());
    }
    Err(Error::NotFound(format!("model weights in {}", model_dir.display())))
}

fn candle_err(e: candle_core::Error) -> Error {
    Error::embedding(e.to_string())
}
