use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use docqa_core::traits::Embedder;
use docqa_core::types::{Chunk, ScoredChunk};
use docqa_core::{Error, Result};

/// Similarity metric, fixed for the lifetime of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    Cosine,
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Cosine => write!(f, "cosine"),
        }
    }
}

/// Metadata recorded alongside the vectors when an index is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHeader {
    pub embedder_id: String,
    pub dim: usize,
    pub metric: Metric,
    pub built_at: DateTime<Utc>,
    pub chunk_count: usize,
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub batch_size: usize,
    pub show_progress: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { batch_size: 32, show_progress: false }
    }
}

pub(crate) struct Entry {
    pub(crate) chunk: Chunk,
    pub(crate) vector: Vec<f32>,
    norm: f32,
}

impl Entry {
    pub(crate) fn new(chunk: Chunk, vector: Vec<f32>) -> Self {
        let norm = l2_norm(&vector);
        Self { chunk, vector, norm }
    }
}

/// In-memory exact index. Entries keep their build order, which is also the
/// tie-break order for equal scores.
pub struct VectorIndex {
    pub(crate) header: IndexHeader,
    pub(crate) entries: Vec<Entry>,
    embedder: Arc<dyn Embedder>,
}

impl VectorIndex {
    /// Embed every chunk exactly once, in batches of `options.batch_size`.
    pub fn build(chunks: Vec<Chunk>, embedder: Arc<dyn Embedder>, options: &BuildOptions) -> Result<Self> {
        if options.batch_size == 0 {
            return Err(Error::InvalidConfig("index.batch_size must be greater than 0".into()));
        }
        let dim = embedder.dim();
        let start = Instant::now();
        info!(
            chunks = chunks.len(),
            model = embedder.model_id(),
            dim,
            max_len = embedder.max_len(),
            "building vector index"
        );

        let pb = if options.show_progress { ProgressBar::new(chunks.len() as u64) } else { ProgressBar::hidden() };
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
            .map(|s| s.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);

        let mut entries = Vec::with_capacity(chunks.len());
        let mut pending = chunks.into_iter().peekable();
        while pending.peek().is_some() {
            let batch: Vec<Chunk> = pending.by_ref().take(options.batch_size).collect();
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = embedder.embed_batch(&texts)?;
            if vectors.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "provider returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            for (chunk, vector) in batch.into_iter().zip(vectors) {
                if vector.len() != dim {
                    return Err(Error::DimensionMismatch { index: dim, provider: vector.len() });
                }
                entries.push(Entry::new(chunk, vector));
            }
            pb.set_position(entries.len() as u64);
        }
        pb.finish_with_message("embedded");

        let header = IndexHeader {
            embedder_id: embedder.model_id().to_string(),
            dim,
            metric: Metric::Cosine,
            built_at: Utc::now(),
            chunk_count: entries.len(),
        };
        info!(chunks = entries.len(), elapsed_ms = start.elapsed().as_millis() as u64, "vector index built");
        Ok(Self { header, entries, embedder })
    }

    pub(crate) fn from_parts(header: IndexHeader, entries: Vec<Entry>, embedder: Arc<dyn Embedder>) -> Self {
        Self { header, entries, embedder }
    }

    /// Embed `query` with the index's provider and return at most `k` hits,
    /// best first.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let q = self.embedder.embed(query)?;
        self.search_vector(&q, k)
    }

    pub fn search_vector(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if query.len() != self.header.dim {
            return Err(Error::DimensionMismatch { index: self.header.dim, provider: query.len() });
        }
        if k == 0 {
            return Ok(Vec::new());
        }
        let q_norm = l2_norm(query);
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine(query, q_norm, &e.vector, e.norm)))
            .collect();
        // stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        debug!(k, hits = scored.len(), top = scored.first().map(|s| s.1), "vector search");
        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk { chunk: self.entries[i].chunk.clone(), score })
            .collect())
    }

    pub fn header(&self) -> &IndexHeader {
        &self.header
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn embedder_id(&self) -> &str {
        &self.header.embedder_id
    }

    pub fn dim(&self) -> usize {
        self.header.dim
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn cosine(a: &[f32], a_norm: f32, b: &[f32], b_norm: f32) -> f32 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (a_norm * b_norm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine(&[0.0, 0.0], 0.0, &[1.0, 0.0], 1.0), 0.0);
    }

    #[test]
    fn cosine_ignores_magnitude() {
        let a = [3.0, 4.0];
        let b = [6.0, 8.0];
        let s = cosine(&a, l2_norm(&a), &b, l2_norm(&b));
        assert!((s - 1.0).abs() < 1e-6);
    }
}
