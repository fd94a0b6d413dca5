//! The question-answering pipeline.
//!
//! `question → embed → retrieve top-k → format context → fill prompt →
//! complete → parse`. Each stage is a single attempt; any error is returned
//! unchanged to the caller.
use serde_json::json;
use tracing::{debug, info, warn};

use crate::chunker::Chunker;
use crate::config::{Config, EmbedderKind};
use crate::document::{Document, ScoredChunk};
use crate::embedder::Embedder;
use crate::embedder::hash::HashEmbedder;
use crate::embedder::openai::OpenAiEmbedder;
use crate::error::{RagError, Result};
use crate::index::{self, VectorIndex};
use crate::llm::{LanguageModel, OpenAiChatModel};
use crate::prompt::{PromptTemplate, format_context};
use crate::trace::{LangSmithSink, RunRecord, TraceSink};

/// Per-query settings passed to retrieval and the model call.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySettings {
    pub top_k: usize,
    pub model: String,
    pub temperature: f32,
}

impl From<&Config> for QuerySettings {
    fn from(cfg: &Config) -> Self {
        Self {
            top_k: cfg.search_top_k,
            model: cfg.openai.chat_model.clone(),
            temperature: cfg.temperature,
        }
    }
}

/// The model's answer plus the chunks it was conditioned on.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub context: Vec<ScoredChunk>,
}

impl Answer {
    /// Distinct `source` values of the retrieved chunks, in retrieval order.
    #[must_use]
    pub fn sources(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for source in self.context.iter().filter_map(|c| c.chunk.source()) {
            if !out.contains(&source) {
                out.push(source);
            }
        }
        out
    }
}

/// A filled prompt and the retrieval it was built from.
#[derive(Debug, Clone)]
pub struct PreparedPrompt {
    pub prompt: String,
    pub context: Vec<ScoredChunk>,
}

/// Trim surrounding whitespace from raw model output.
#[must_use]
pub fn parse_output(raw: &str) -> String {
    raw.trim().to_string()
}

pub struct Pipeline {
    settings: QuerySettings,
    chunker: Chunker,
    embedder: Box<dyn Embedder>,
    index: Box<dyn VectorIndex>,
    model: Option<Box<dyn LanguageModel>>,
    template: PromptTemplate,
    trace: Option<Box<dyn TraceSink>>,
}

impl Pipeline {
    pub fn new(
        settings: QuerySettings,
        chunker: Chunker,
        embedder: Box<dyn Embedder>,
        index: Box<dyn VectorIndex>,
        model: Option<Box<dyn LanguageModel>>,
        template: PromptTemplate,
    ) -> Self {
        Self {
            settings,
            chunker,
            embedder,
            index,
            model,
            template,
            trace: None,
        }
    }

    /// Build every service named by a validated `cfg`.
    ///
    /// No language model is constructed when `cfg.retrieve_only` is set.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let chunker = Chunker::new(cfg.chunk_size, cfg.chunk_overlap)?;

        let embedder: Box<dyn Embedder> = match cfg.embedder {
            EmbedderKind::OpenAi => Box::new(OpenAiEmbedder::new(&cfg.openai)?),
            EmbedderKind::Hash => Box::new(HashEmbedder::default()),
        };

        let model: Option<Box<dyn LanguageModel>> = if cfg.retrieve_only {
            None
        } else {
            Some(Box::new(OpenAiChatModel::new(&cfg.openai)?))
        };

        let template = match &cfg.prompt_file {
            Some(path) => PromptTemplate::from_file(std::path::Path::new(path))?,
            None => PromptTemplate::default(),
        };

        let mut pipeline = Self::new(
            QuerySettings::from(cfg),
            chunker,
            embedder,
            index::open(cfg.index_backend)?,
            model,
            template,
        );

        if cfg.tracing.enabled {
            pipeline = pipeline.with_trace_sink(Box::new(LangSmithSink::new(&cfg.tracing)?));
        }

        Ok(pipeline)
    }

    #[must_use]
    pub fn with_trace_sink(mut self, sink: Box<dyn TraceSink>) -> Self {
        self.trace = Some(sink);
        self
    }

    #[must_use]
    pub fn indexed_chunks(&self) -> usize {
        self.index.len()
    }

    /// Chunk, embed and index `docs`. Returns the number of chunks added.
    pub fn ingest(&mut self, docs: &[Document]) -> Result<usize> {
        let chunks = self.chunker.split_documents(docs);
        if chunks.is_empty() {
            warn!("No content to index in {} documents", docs.len());
            return Ok(0);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;

        let count = chunks.len();
        self.index.add(chunks, vectors)?;
        info!("Indexed {count} chunks from {} documents", docs.len());
        Ok(count)
    }

    /// Embed `question` and return the top-k chunks, nearest first.
    pub fn retrieve(&self, question: &str) -> Result<Vec<ScoredChunk>> {
        if question.trim().is_empty() {
            return Err(RagError::config("question must not be empty"));
        }
        let query = self.embedder.embed(question)?;
        let hits = self.index.query(&query, self.settings.top_k)?;
        debug!("Retrieved {} chunks", hits.len());
        Ok(hits)
    }

    /// Retrieve context for `question` and fill the template with it.
    pub fn prepare(&self, question: &str) -> Result<PreparedPrompt> {
        let context = self.retrieve(question)?;
        let prompt = self.template.format(&format_context(&context), question);
        Ok(PreparedPrompt { prompt, context })
    }

    /// Answer `question` from the indexed notes.
    pub fn answer(&self, question: &str) -> Result<Answer> {
        let Some(sink) = &self.trace else {
            return self.run_answer(question);
        };

        let mut run = RunRecord::start("vaultrag.answer", json!({ "question": question }));
        let result = self.run_answer(question);
        run.finish(match &result {
            Ok(answer) => Ok(json!({ "answer": answer.text, "sources": answer.sources() })),
            Err(e) => Err(e.to_string()),
        });
        if let Err(e) = sink.submit(&run) {
            warn!("Failed to export run {}: {e}", run.id);
        }
        result
    }

    fn run_answer(&self, question: &str) -> Result<Answer> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| RagError::config("no language model configured"))?;

        let PreparedPrompt { prompt, context } = self.prepare(question)?;
        let raw = model.complete(
            &prompt,
            &self.settings.model,
            self.settings.temperature,
        )?;

        Ok(Answer {
            text: parse_output(&raw),
            context,
        })
    }
}
