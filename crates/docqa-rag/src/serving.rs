use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::info;

use docqa_core::config::Settings;
use docqa_core::types::AnswerResult;
use docqa_core::Result;

use crate::pipeline::AnswerEngine;

pub type EngineFactory = Box<dyn Fn() -> Result<AnswerEngine> + Send + Sync>;

/// Process-lifetime holder of the answer engine.
///
/// The engine is built on first use. Concurrent first callers block on the
/// same initialization, which runs at most once on success; a failed attempt
/// leaves the cell empty so a later call retries.
pub struct ServingState {
    engine: OnceCell<Arc<AnswerEngine>>,
    factory: EngineFactory,
}

impl ServingState {
    pub fn new(factory: EngineFactory) -> Self {
        Self { engine: OnceCell::new(), factory }
    }

    pub fn from_settings(settings: Settings) -> Self {
        Self::new(Box::new(move || AnswerEngine::from_settings(&settings)))
    }

    pub fn engine(&self) -> Result<Arc<AnswerEngine>> {
        self.engine
            .get_or_try_init(|| {
                info!("initializing answer engine");
                (self.factory)().map(Arc::new)
            })
            .map(Arc::clone)
    }

    pub fn is_ready(&self) -> bool {
        self.engine.get().is_some()
    }

    pub fn answer(&self, query: &str) -> Result<AnswerResult> {
        self.engine()?.answer(query)
    }
}
