/// Error type shared by every stage of the question-answering pipeline.
///
/// Stages never recover locally; each variant surfaces to `main`, which
/// prints it and exits non-zero.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagError {
    /// Invalid chunking parameters, missing credentials, malformed templates.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport, authentication or protocol failure from a hosted service.
    #[error("service error: {0}")]
    Service(String),

    /// Retrieval attempted before any chunk was indexed.
    #[error("vector index is empty")]
    EmptyIndex,

    #[error("index error: {0}")]
    Index(String),

    #[error("failed to load {}: {message}", path.display())]
    Document { path: PathBuf, message: String },
}

impl RagError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }
}

impl From<rusqlite::Error> for RagError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Index(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RagError>;
