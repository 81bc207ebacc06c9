//! Question answering over an indexed corpus: retrieval routing, prompt
//! assembly, answer synthesis, the query orchestrator and ingestion.
pub mod ingest;
pub mod pipeline;
pub mod prompt;
pub mod router;
pub mod serving;
pub mod synthesizer;

pub use ingest::{ingest, IngestReport};
pub use pipeline::AnswerEngine;
pub use prompt::PromptBuilder;
pub use router::RetrievalRouter;
pub use serving::ServingState;
pub use synthesizer::AnswerSynthesizer;
