use std::path::Path;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::t5::{Config as T5Config, T5ForConditionalGeneration};
use parking_lot::Mutex;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use docqa_core::config::LocalGenerationConfig;
use docqa_core::traits::Generator;
use docqa_core::{Error, Result};
use docqa_embed::device::select_device;

/// Greedy seq2seq generation with a T5-family checkpoint (e.g. flan-t5-base).
///
/// The model keeps a decoder KV cache, so generation is serialized through a
/// mutex and the cache is cleared before every prompt.
pub struct LocalT5Generator {
    model: Mutex<T5ForConditionalGeneration>,
    tokenizer: Tokenizer,
    device: Device,
    start_token: u32,
    eos_token: u32,
    use_cache: bool,
    max_new_tokens: usize,
    max_input_tokens: usize,
    name: String,
}

impl LocalT5Generator {
    pub fn load(config: &LocalGenerationConfig) -> Result<Self> {
        let dir = config.model_dir.as_path();
        if !dir.is_dir() {
            return Err(Error::NotFound(format!("generation model directory {}", dir.display())));
        }
        let device = select_device();
        info!(model = %config.model, dir = %dir.display(), "loading generation model");

        let tokenizer_path = dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| Error::generation(format!("failed to load tokenizer from {}: {}", tokenizer_path.display(), e)))?;
        let config_path = dir.join("config.json");
        let model_config: T5Config = serde_json::from_str(&std::fs::read_to_string(&config_path)?)
            .map_err(|e| Error::generation(format!("invalid model config {}: {}", config_path.display(), e)))?;

        let weights = load_safetensors(dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = T5ForConditionalGeneration::load(vb, &model_config).map_err(candle_err)?;
        let start_token = model_config.decoder_start_token_id.unwrap_or(model_config.pad_token_id) as u32;
        info!(model = %config.model, "generation model loaded");

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            device,
            start_token,
            eos_token: model_config.eos_token_id as u32,
            use_cache: model_config.use_cache,
            max_new_tokens: config.max_new_tokens,
            max_input_tokens: config.max_input_tokens,
            name: format!("local:{}", config.model),
        })
    }

    fn encode_prompt(&self, prompt: &str) -> Result<Vec<u32>> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| Error::generation(format!("tokenization failed: {e}")))?;
        Ok(keep_tail(encoding.get_ids(), self.max_input_tokens).to_vec())
    }
}

impl Generator for LocalT5Generator {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let input = self.encode_prompt(prompt)?;
        let input_ids = Tensor::new(input.as_slice(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(candle_err)?;

        let mut model = self.model.lock();
        model.clear_kv_cache();
        let encoded = model.encode(&input_ids).map_err(candle_err)?;

        let mut output = vec![self.start_token];
        for step in 0..self.max_new_tokens {
            let decoder_ids = if step == 0 || !self.use_cache {
                Tensor::new(output.as_slice(), &self.device)
            } else {
                Tensor::new(&output[output.len() - 1..], &self.device)
            }
            .and_then(|t| t.unsqueeze(0))
            .map_err(candle_err)?;
            let next = model
                .decode(&decoder_ids, &encoded)
                .and_then(|logits| logits.squeeze(0))
                .and_then(|logits| logits.argmax(0))
                .and_then(|id| id.to_scalar::<u32>())
                .map_err(candle_err)?;
            if next == self.eos_token {
                break;
            }
            output.push(next);
        }
        model.clear_kv_cache();
        drop(model);

        let text = self
            .tokenizer
            .decode(&output[1..], true)
            .map_err(|e| Error::generation(format!("detokenization failed: {e}")))?;
        debug!(
            input_tokens = input.len(),
            output_tokens = output.len() - 1,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "local generation finished"
        );
        Ok(text)
    }
}

/// Keep the last `max` ids; the question sits at the end of every prompt.
fn keep_tail(ids: &[u32], max: usize) -> &[u32] {
    if max == 0 || ids.len() <= max { ids } else { &ids[ids.len() - max..] }
}

fn load_safetensors(dir: &Path, device: &Device) -> Result<std::collections::HashMap<String, Tensor>> {
    let path = dir.join("model.safetensors");
    if !path.exists() {
        return Err(Error::NotFound(format!("model weights {}", path.display())));
    }
    candle_core::safetensors::load(&path, device).map_err(candle_err)
}

fn candle_err(e: candle_core::Error) -> Error {
    Error::generation(e.to_string())
}
