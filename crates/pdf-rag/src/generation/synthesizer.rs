//! Answer synthesis from distilled context

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, Stage};
use crate::pipeline::bounded;
use crate::providers::LlmProvider;
use crate::types::{DistilledContext, Query};

use super::prompt::PromptBuilder;

/// Produces the final prose answer with one LLM call
pub struct AnswerSynthesizer {
    llm: Arc<dyn LlmProvider>,
    timeout: Option<Duration>,
}

impl AnswerSynthesizer {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm, timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub async fn synthesize(&self, query: &Query, context: &DistilledContext) -> Result<String> {
        let prompt = PromptBuilder::build_answer_prompt(query, context);
        tracing::debug!("Synthesizing answer ({} prompt chars)", prompt.len());

        bounded(Stage::Synthesize, self.timeout, self.llm.generate(&prompt))
            .await
            .map_err(|e| e.at_stage(Stage::Synthesize))
    }
}
