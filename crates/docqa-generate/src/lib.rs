//! Generation backends: a local seq2seq model run with candle and a hosted
//! OpenAI-compatible chat endpoint. Both map a prompt to text and are
//! interchangeable behind [`Generator`].
use std::sync::Arc;

use docqa_core::config::{GenerationBackendKind, GenerationConfig};
use docqa_core::traits::Generator;
use docqa_core::Result;

pub mod hosted;
pub mod local;

pub use hosted::HostedGenerator;
pub use local::LocalT5Generator;

pub enum GenerationBackend {
    Local(LocalT5Generator),
    Hosted(HostedGenerator),
}

impl GenerationBackend {
    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        match config.backend {
            GenerationBackendKind::Local => Ok(Self::Local(LocalT5Generator::load(&config.local)?)),
            GenerationBackendKind::Hosted => Ok(Self::Hosted(HostedGenerator::from_config(&config.hosted)?)),
        }
    }
}

impl Generator for GenerationBackend {
    fn name(&self) -> &str {
        match self {
            Self::Local(g) => g.name(),
            Self::Hosted(g) => g.name(),
        }
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        match self {
            Self::Local(g) => g.generate(prompt),
            Self::Hosted(g) => g.generate(prompt),
        }
    }
}

pub fn generator_from_config(config: &GenerationConfig) -> Result<Arc<dyn Generator>> {
    Ok(Arc::new(GenerationBackend::from_config(config)?))
}
