//! Exact cosine-similarity index over chunk embeddings.
//!
//! The index is built once from a chunk list, persisted as a single
//! checksummed file, and reloaded read-only at serving time.
pub mod index;
pub mod store;

pub use index::{BuildOptions, IndexHeader, Metric, VectorIndex};
