use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8", path.display())]
    Encoding { path: PathBuf },

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Index dimension mismatch: index stores {index}-d vectors, provider produces {provider}-d vectors")]
    DimensionMismatch { index: usize, provider: usize },

    #[error("Index was built with embedding model '{index}' but the provider is '{provider}'")]
    ModelMismatch { index: String, provider: String },

    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::CorruptIndex(message.into())
    }

    /// True for errors that mean an index and its embedding provider disagree.
    pub fn is_consistency(&self) -> bool {
        matches!(self, Self::DimensionMismatch { .. } | Self::ModelMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
