use std::sync::Arc;

use tracing::debug;

use docqa_core::traits::Generator;
use docqa_core::types::AnswerResult;
use docqa_core::Result;

use crate::prompt::PromptBuilder;

pub struct AnswerSynthesizer {
    generator: Arc<dyn Generator>,
}

impl AnswerSynthesizer {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Generate an answer. A blank `context` selects the unconstrained prompt
    /// and yields `grounded = false`. Sources and routing are left empty for
    /// the caller to fill in.
    pub fn synthesize(&self, question: &str, context: &str) -> Result<AnswerResult> {
        let grounded = !context.trim().is_empty();
        let prompt = if grounded {
            PromptBuilder::grounded(question, context)
        } else {
            PromptBuilder::unconstrained(question)
        };
        debug!(grounded, generator = self.generator.name(), prompt_chars = prompt.len(), "synthesizing answer");
        let text = self.generator.generate(&prompt)?.trim().to_string();
        Ok(AnswerResult { text, grounded, sources: Vec::new(), routing: None })
    }
}
