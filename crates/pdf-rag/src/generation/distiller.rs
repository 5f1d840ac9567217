//! Context distillation: reduce retrieved chunks to what answers the question

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result, Stage};
use crate::pipeline::bounded;
use crate::providers::LlmProvider;
use crate::types::{DistilledContext, MatchSet, Query};

use super::prompt::PromptBuilder;

/// Selects and condenses relevant content with one LLM call
pub struct ContextDistiller {
    llm: Arc<dyn LlmProvider>,
    timeout: Option<Duration>,
}

impl ContextDistiller {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm, timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Distill `matches` into a cleaned context. `matches` must be non-empty.
    pub async fn distill(&self, query: &Query, matches: &MatchSet) -> Result<DistilledContext> {
        if matches.is_empty() {
            return Err(Error::internal("distill called without matches"));
        }

        let prompt = PromptBuilder::build_distill_prompt(query, matches);
        tracing::debug!(
            "Distilling {} chunks ({} prompt chars) with {}",
            matches.len(),
            prompt.len(),
            self.llm.model()
        );

        let text = bounded(Stage::Distill, self.timeout, self.llm.generate(&prompt))
            .await
            .map_err(|e| e.at_stage(Stage::Distill))?;

        Ok(DistilledContext::new(text.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{call_log, sample_match, FakeLlm};

    #[tokio::test]
    async fn test_distill_trims_model_output() {
        let log = call_log();
        let llm = Arc::new(FakeLlm::new(&log, &["  Refunds within 30 days.\n"]));
        let distiller = ContextDistiller::new(llm.clone());

        let query = Query::new("refunds?").unwrap();
        let matches = MatchSet::from_ranked(vec![sample_match("1", 0.9, "T1")], 5);
        let context = distiller.distill(&query, &matches).await.unwrap();

        assert_eq!(context.as_str(), "Refunds within 30 days.");
        assert_eq!(llm.calls(), 1);
        assert!(llm.prompt(0).contains("T1"));
    }

    #[tokio::test]
    async fn test_llm_failure_tagged_distill() {
        let log = call_log();
        let mut llm = FakeLlm::new(&log, &[]);
        llm.fail_on = Some(0);
        let distiller = ContextDistiller::new(Arc::new(llm));

        let query = Query::new("refunds?").unwrap();
        let matches = MatchSet::from_ranked(vec![sample_match("1", 0.9, "T1")], 5);
        let err = distiller.distill(&query, &matches).await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Distill));
    }
}
