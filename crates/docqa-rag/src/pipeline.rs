use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use docqa_core::config::{RetrievalConfig, Settings};
use docqa_core::traits::Generator;
use docqa_core::types::{AnswerResult, ScoredChunk};
use docqa_core::{Error, Result};
use docqa_embed::embedder_from_config;
use docqa_generate::generator_from_config;
use docqa_vector::VectorIndex;

use crate::prompt::PromptBuilder;
use crate::router::RetrievalRouter;
use crate::synthesizer::AnswerSynthesizer;

/// Query orchestrator: route, optionally retrieve, then synthesize.
///
/// Holds only read-only handles, so one engine can serve concurrent queries.
pub struct AnswerEngine {
    index: VectorIndex,
    router: RetrievalRouter,
    synthesizer: AnswerSynthesizer,
    retrieval: RetrievalConfig,
}

impl AnswerEngine {
    /// Router and synthesizer share `generator`.
    pub fn new(index: VectorIndex, generator: Arc<dyn Generator>, settings: &Settings) -> Self {
        Self {
            index,
            router: RetrievalRouter::new(&settings.router, generator.clone()),
            synthesizer: AnswerSynthesizer::new(generator),
            retrieval: settings.retrieval.clone(),
        }
    }

    pub fn with_parts(
        index: VectorIndex,
        router: RetrievalRouter,
        synthesizer: AnswerSynthesizer,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self { index, router, synthesizer, retrieval }
    }

    /// Load the persisted index and construct the configured providers.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let start = Instant::now();
        let embedder = embedder_from_config(&settings.embedding)?;
        let index = VectorIndex::load(&settings.index.path, embedder)?;
        let generator = generator_from_config(&settings.generation)?;
        info!(
            chunks = index.len(),
            generator = generator.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "answer engine ready"
        );
        Ok(Self::new(index, generator, settings))
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        self.index.search(query, k)
    }

    pub fn answer(&self, query: &str) -> Result<AnswerResult> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("query must not be empty".into()));
        }
        let start = Instant::now();
        let routing = self.router.decide(query);
        debug!(retrieve = routing.retrieve, reason = ?routing.reason, "routing decided");

        let hits = if routing.retrieve { self.index.search(query, self.retrieval.k)? } else { Vec::new() };
        let context = PromptBuilder::build_context(&hits);
        let mut result = self.synthesizer.synthesize(query, &context)?;
        if result.grounded {
            result.sources = PromptBuilder::build_sources(&hits, self.retrieval.snippet_chars);
        }
        result.routing = Some(routing);
        info!(
            retrieve = routing.retrieve,
            hits = hits.len(),
            grounded = result.grounded,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "query answered"
        );
        Ok(result)
    }
}
