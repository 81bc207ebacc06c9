use crate::Result;

/// Maps text to fixed-length vectors.
///
/// Implementations must be deterministic for a given `model_id`, and every
/// vector they return must have exactly `dim()` components.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the model configuration (e.g. `sentence-transformers/all-MiniLM-L6-v2`).
    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
    /// Maximum number of tokens considered per input.
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| crate::Error::embedding("provider returned no vector"))
    }
}

/// Maps a prompt to generated text.
pub trait Generator: Send + Sync {
    /// Backend name for logs (e.g. `local:google/flan-t5-base`).
    fn name(&self) -> &str;
    fn generate(&self, prompt: &str) -> Result<String>;
}
