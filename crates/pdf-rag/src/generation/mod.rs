//! LLM stages: context distillation and answer synthesis

mod distiller;
pub mod prompt;
mod synthesizer;

pub use distiller::ContextDistiller;
pub use prompt::PromptBuilder;
pub use synthesizer::AnswerSynthesizer;
