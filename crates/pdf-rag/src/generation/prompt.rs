//! Prompt templates for the two LLM stages

use crate::types::{DistilledContext, MatchSet, Query};

/// Separator placed between chunk texts in the distillation prompt
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// Prompt builder for distillation and synthesis
pub struct PromptBuilder;

impl PromptBuilder {
    /// Raw chunk texts joined in rank order
    pub fn join_chunks(matches: &MatchSet) -> String {
        matches.texts().join(CHUNK_SEPARATOR)
    }

    /// Ask the model to keep only what is relevant to the question
    pub fn build_distill_prompt(query: &Query, matches: &MatchSet) -> String {
        format!(
            r#"You are given text chunks retrieved from a PDF document.
Some chunks may be irrelevant, overlapping, or noisy.
Read them carefully and keep only the information needed to answer the question.

Question: {question}

Chunks:
{chunks}

Return only the relevant information as concise, cleaned text. Do not reproduce chunk boundaries."#,
            question = query.as_str(),
            chunks = Self::join_chunks(matches)
        )
    }

    /// Ask the model to explain the answer in its own words
    pub fn build_answer_prompt(query: &Query, context: &DistilledContext) -> String {
        format!(
            r#"You are an expert assistant. You are given cleaned, relevant context extracted from a PDF document.
Answer the question with a clear, well-structured explanation.
Do not copy the context verbatim; explain it naturally, as you would to a colleague.

Context:
{context}

Question:
{question}

Final Answer:"#,
            context = context.as_str(),
            question = query.as_str()
        )
    }
}
