//! LLM provider trait for text generation

use async_trait::async_trait;
use crate::error::Result;

/// Stateless prompt-in, text-out generation.
///
/// No conversation state is kept between calls. Failures are reported as
/// `Error::Upstream` with `Stage::Generate`; callers re-tag them.
///
/// Implementations:
/// - `GeminiClient`: Google Generative Language API (gemini-1.5-flash)
/// - `OllamaLlm`: Local Ollama server
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate text for a single prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
