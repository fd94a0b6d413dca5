//! Prompt template combining retrieved context with the user question.
use std::path::Path;

use crate::document::ScoredChunk;
use crate::error::{RagError, Result};

const CONTEXT_VAR: &str = "{context}";
const QUESTION_VAR: &str = "{question}";

pub const DEFAULT_TEMPLATE: &str = "You are an assistant for question-answering tasks. \
Use the following pieces of retrieved context to answer the question. \
If you don't know the answer, just say that you don't know. \
Use three sentences maximum and keep the answer concise.
Question: {question}
Context: {context}
Answer:";

/// A template with `{context}` and `{question}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        for var in [CONTEXT_VAR, QUESTION_VAR] {
            if !text.contains(var) {
                return Err(RagError::config(format!(
                    "prompt template is missing the {var} placeholder"
                )));
            }
        }
        Ok(Self { text })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            RagError::config(format!("failed to read prompt file {}: {e}", path.display()))
        })?;
        Self::new(text)
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Substitute both placeholders in one left-to-right pass, so braces
    /// inside `context` or `question` are copied verbatim.
    #[must_use]
    pub fn format(&self, context: &str, question: &str) -> String {
        let mut out = String::with_capacity(self.text.len() + context.len() + question.len());
        let mut rest = self.text.as_str();

        while let Some(idx) = rest.find('{') {
            out.push_str(&rest[..idx]);
            let tail = &rest[idx..];
            if let Some(after) = tail.strip_prefix(CONTEXT_VAR) {
                out.push_str(context);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(QUESTION_VAR) {
                out.push_str(question);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

/// Join retrieved chunk contents with a blank line, in retrieval order.
#[must_use]
pub fn format_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
