//! Core data types passed between pipeline stages.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar metadata value attached to a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

pub type Metadata = BTreeMap<String, MetadataValue>;

/// Metadata key holding the path a document was loaded from.
pub const SOURCE_KEY: &str = "source";

/// A raw text document from the vault. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub content: String,
    pub metadata: Metadata,
}

impl Document {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// The `source` metadata entry, if any.
    #[must_use]
    pub fn source(&self) -> Option<String> {
        self.metadata.get(SOURCE_KEY).map(ToString::to_string)
    }
}

/// A bounded window of a document's content, the unit of retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub content: String,
    pub metadata: Metadata,
    /// Index of this chunk within its document.
    pub position: usize,
    /// Char offset of the first character within the document.
    pub start: usize,
}

impl Chunk {
    #[must_use]
    pub fn source(&self) -> Option<String> {
        self.metadata.get(SOURCE_KEY).map(ToString::to_string)
    }
}

/// A retrieved chunk with its distance to the query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub distance: f32,
}
