//! Domain types shared by ingestion, retrieval and answering.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// A raw text document read from the corpus.
///
/// - `id`: corpus-relative path with `/` separators, unique within a corpus
/// - `source_name`: file name, the identity shown to users
/// - `source_path`: corpus-relative path kept as secondary metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub raw_text: String,
    pub source_name: String,
    pub source_path: String,
}

/// A bounded window of one document's text. `sequence_index` is the
/// position of the chunk within its parent document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub document_id: String,
    pub text: String,
    pub source_name: String,
    pub source_path: String,
    pub sequence_index: usize,
}

/// A search hit. `score` is cosine similarity, higher is better.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Which stage of the router produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutingReason {
    /// The query contained a configured domain keyword.
    KeywordOverride,
    /// The classifier answered and its verdict was used.
    Classifier,
    /// The classifier failed or answered ambiguously; retrieval is forced.
    ClassifierFallback,
    /// The classifier stage is disabled and no keyword matched.
    NoKeywordMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub retrieve: bool,
    pub reason: RoutingReason,
}

impl RoutingDecision {
    pub fn retrieve(reason: RoutingReason) -> Self {
        Self { retrieve: true, reason }
    }

    pub fn skip(reason: RoutingReason) -> Self {
        Self { retrieve: false, reason }
    }
}

/// A cited source backing an answer, aligned with the context ordinal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub source_name: String,
    pub source_path: String,
    pub snippet: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub text: String,
    pub grounded: bool,
    pub sources: Vec<SourceRef>,
    pub routing: Option<RoutingDecision>,
}
