//! # vaultrag — question answering over a note vault
//!
//! Loads notes from a folder, splits them into overlapping windows, embeds
//! them into a vector index and answers a single question with a hosted
//! language model conditioned on the closest chunks.
//!
//! ## Architecture
//!
//! - **[`config`]** — Settings file, environment and eager validation
//! - **[`source`]** — Vault folder loading with YAML frontmatter metadata
//! - **[`chunker`]** — Fixed-size overlapping character windows
//! - **[`embedder`]** — OpenAI-compatible and offline hashing embedders
//! - **[`index`]** — In-memory and SQLite (sqlite-vec) vector indexes
//! - **[`prompt`]** — Prompt template and context formatting
//! - **[`llm`]** — Chat completion client
//! - **[`pipeline`]** — The linear retrieve-then-generate flow
//! - **[`trace`]** — Optional run export to a tracing service

pub mod chunker;
pub mod config;
pub mod document;
pub mod embedder;
pub mod error;
pub mod frontmatter;
pub mod http;
pub mod index;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod source;
pub mod trace;

pub use error::{RagError, Result};
