use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use docqa_core::chunker::Chunker;
use docqa_core::config::Settings;
use docqa_core::loader::{DocumentLoader, LoadFailure};
use docqa_core::traits::Embedder;
use docqa_core::types::Chunk;
use docqa_core::{Error, Result};
use docqa_vector::{BuildOptions, IndexHeader, VectorIndex};

/// Outcome of one ingestion run.
pub struct IngestReport {
    pub documents: usize,
    pub failures: Vec<LoadFailure>,
    pub chunks: usize,
    pub sample: Option<Chunk>,
    pub index_path: PathBuf,
    pub header: IndexHeader,
}

/// Load the corpus, chunk it, embed every chunk and persist the index.
/// Unreadable documents are reported and skipped.
pub fn ingest(settings: &Settings, embedder: Arc<dyn Embedder>, show_progress: bool) -> Result<IngestReport> {
    let start = Instant::now();
    let report = DocumentLoader::from_config(&settings.corpus).load()?;
    if report.documents.is_empty() {
        return Err(Error::InvalidInput(format!(
            "no loadable documents under {}",
            settings.corpus.path.display()
        )));
    }

    let chunker = Chunker::new(&settings.chunking)?;
    let chunks = chunker.split_all(&report.documents);
    info!(documents = report.documents.len(), chunks = chunks.len(), "corpus chunked");
    let sample = chunks.first().cloned();
    let chunk_count = chunks.len();

    let options = BuildOptions { batch_size: settings.index.batch_size, show_progress };
    let index = VectorIndex::build(chunks, embedder, &options)?;
    index.persist(&settings.index.path)?;
    info!(
        chunks = chunk_count,
        path = %settings.index.path.display(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "ingestion finished"
    );

    Ok(IngestReport {
        documents: report.documents.len(),
        failures: report.failures,
        chunks: chunk_count,
        sample,
        index_path: settings.index.path.clone(),
        header: index.header().clone(),
    })
}
