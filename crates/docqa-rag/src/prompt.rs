//! Prompt templates for routing and answer generation.

use docqa_core::types::{ScoredChunk, SourceRef};

/// The answer a grounded prompt asks for when the context lacks one.
pub const UNKNOWN_ANSWER: &str = "I don't know.";

pub struct PromptBuilder;

impl PromptBuilder {
    /// Number the hits as `[Source i: name]` blocks separated by blank lines.
    pub fn build_context(hits: &[ScoredChunk]) -> String {
        hits.iter()
            .enumerate()
            .map(|(i, hit)| format!("[Source {}: {}]\n{}", i + 1, hit.chunk.source_name, hit.chunk.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Source list aligned with the ordinals of [`Self::build_context`].
    pub fn build_sources(hits: &[ScoredChunk], snippet_chars: usize) -> Vec<SourceRef> {
        hits.iter()
            .map(|hit| SourceRef {
                source_name: hit.chunk.source_name.clone(),
                source_path: hit.chunk.source_path.clone(),
                snippet: snippet(&hit.chunk.text, snippet_chars),
                score: hit.score,
            })
            .collect()
    }

    pub fn grounded(question: &str, context: &str) -> String {
        format!(
            "You are a helpful assistant answering questions using the provided context.\n\n\
             Answer the question directly.\n\
             Use the context only to support your answer.\n\
             Ignore information that is not relevant to the question.\n\
             If the answer is not contained in the context, say \"{UNKNOWN_ANSWER}\"\n\n\
             Context:\n{context}\n\n\
             Question:\n{question}\n\n\
             Answer:"
        )
    }

    pub fn unconstrained(question: &str) -> String {
        format!(
            "You are a helpful assistant. Answer the question directly and concisely.\n\n\
             Question:\n{question}\n\n\
             Answer:"
        )
    }

    pub fn classifier(question: &str) -> String {
        format!(
            "Decide whether answering the question below requires looking up technical \
             documentation about LangChain or LangGraph (APIs, persistence, memory, agents, \
             retrievers, vector stores, tools). Greetings, small talk and general knowledge \
             do not.\n\n\
             Question: {question}\n\n\
             Answer YES or NO:"
        )
    }
}

/// First `chars` characters of `text`.
pub fn snippet(text: &str, chars: usize) -> String {
    text.chars().take(chars).collect()
}
