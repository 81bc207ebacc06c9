//! Embedding providers: a candle-backed BERT sentence encoder and a
//! model-free hashing embedder, selected by `embedding.provider`.
use std::sync::Arc;

use tracing::info;

use docqa_core::config::{EmbeddingConfig, EmbeddingProviderKind};
use docqa_core::traits::Embedder;
use docqa_core::Result;

pub mod bert;
pub mod device;
pub mod hash;
pub mod pool;
pub mod tokenize;

pub use bert::BertEmbedder;
pub use hash::HashEmbedder;
pub use pool::masked_mean_l2;

pub fn embedder_from_config(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider {
        EmbeddingProviderKind::Local => {
            Ok(Arc::new(BertEmbedder::load(&config.model, &config.model_dir, config.max_len)?))
        }
        EmbeddingProviderKind::Hash => {
            info!(dim = config.hash_dim, "using hash embedder");
            Ok(Arc::new(HashEmbedder::new(config.hash_dim)))
        }
    }
}
