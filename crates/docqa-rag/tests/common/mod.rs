#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;

use docqa_core::config::Settings;
use docqa_core::traits::{Embedder, Generator};
use docqa_core::types::Chunk;
use docqa_core::{Error, Result};
use docqa_embed::HashEmbedder;
use docqa_rag::AnswerEngine;
use docqa_vector::{BuildOptions, VectorIndex};

pub const CLASSIFIER_MARKER: &str = "Answer YES or NO";

/// Generator with canned replies. `None` makes the corresponding call fail.
pub struct ScriptedGenerator {
    classifier: Option<String>,
    answer: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(classifier: Option<&str>, answer: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            classifier: classifier.map(str::to_string),
            answer: answer.map(str::to_string),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn classifier_calls(&self) -> usize {
        self.calls.lock().iter().filter(|p| p.contains(CLASSIFIER_MARKER)).count()
    }
}

impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.lock().push(prompt.to_string());
        let reply = if prompt.contains(CLASSIFIER_MARKER) { &self.classifier } else { &self.answer };
        reply
            .as_ref()
            .map(|r| format!("  {r}\n"))
            .ok_or_else(|| Error::generation("scripted failure"))
    }
}

fn chunk(i: usize, name: &str, text: &str) -> Chunk {
    Chunk {
        id: format!("{name}:0"),
        document_id: name.to_string(),
        text: text.to_string(),
        source_name: name.to_string(),
        source_path: format!("docs/{name}"),
        sequence_index: i,
    }
}

pub fn corpus() -> Vec<Chunk> {
    vec![
        chunk(0, "cooking.md", "Knead the dough and let it rise before baking the bread."),
        chunk(0, "persistence.md", "LangGraph implements persistence with checkpointers that save the graph state after every step."),
        chunk(0, "garden.md", "Water the tomatoes in the morning and give them plenty of sun."),
        chunk(0, "threads.md", "A thread groups checkpoints; LangGraph persistence resumes a thread from its last checkpoint."),
        chunk(0, "painting.md", "Apply two coats of paint to the fence for an even finish."),
    ]
}

pub fn embedder() -> Arc<dyn Embedder> {
    Arc::new(HashEmbedder::new(512))
}

pub fn index(chunks: Vec<Chunk>) -> VectorIndex {
    VectorIndex::build(chunks, embedder(), &BuildOptions::default()).expect("build index")
}

pub fn engine(generator: &Arc<ScriptedGenerator>, classifier_enabled: bool) -> AnswerEngine {
    engine_over(corpus(), generator, classifier_enabled)
}

pub fn engine_over(chunks: Vec<Chunk>, generator: &Arc<ScriptedGenerator>, classifier_enabled: bool) -> AnswerEngine {
    let mut settings = Settings::default();
    settings.router.classifier_enabled = classifier_enabled;
    let generator: Arc<dyn Generator> = generator.clone();
    AnswerEngine::new(index(chunks), generator, &settings)
}
